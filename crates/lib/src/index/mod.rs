//! Metadata persistence.
//!
//! Resolved files are recorded one per file in an index directory, keyed by
//! the local file name. [`PackwizIndex`] is the on-disk implementation.

mod packwiz;
mod types;

use std::path::Path;

pub use packwiz::PackwizIndex;
pub use types::*;

use crate::provider::{IndexedPack, IndexedVersion};

/// Durable storage for resolved metadata.
///
/// Implementations must tolerate concurrent writes from unrelated runs as long
/// as each key has a single writer.
pub trait MetadataStore: Send + Sync {
  /// Upsert the record for `version.file_name` in `dir`.
  fn write(&self, dir: &Path, pack: &IndexedPack, version: &IndexedVersion) -> Result<(), IndexError>;

  /// Load the record for `file_name` from `dir`.
  fn read(&self, dir: &Path, file_name: &str) -> Result<ModMetadata, IndexError>;
}
