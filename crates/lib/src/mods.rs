//! Local mod inventory.
//!
//! Lists the entries of a mods directory and pairs each with the metadata
//! record the index already holds for it, if any.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::index::{IndexError, ModMetadata, PackwizIndex};
use crate::provider::Provider;

/// Suffix Prism-style launchers append to disable a mod without removing it.
const DISABLED_SUFFIX: &str = ".disabled";

#[derive(Debug, Error)]
pub enum ScanError {
  #[error("{0} is not a directory")]
  NotADirectory(PathBuf),

  #[error("failed to list mods directory: {0}")]
  Walk(#[from] walkdir::Error),

  #[error(transparent)]
  Index(#[from] IndexError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ModKind {
  Jar,
  Zip,
  /// An unpacked mod. Exempt from metadata resolution.
  Folder,
  Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MetadataStatus {
  NoMetadata,
  HasMetadata,
}

/// One installed mod.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocalMod {
  pub path: PathBuf,
  /// On-disk file name, used as the index key.
  pub name: String,
  pub kind: ModKind,
  pub status: MetadataStatus,
  pub metadata: Option<ModMetadata>,
}

impl LocalMod {
  /// Classify `path` by type and extension. Does not read the file.
  pub fn from_path(path: impl Into<PathBuf>) -> Self {
    let path = path.into();
    let name = path
      .file_name()
      .map(|n| n.to_string_lossy().into_owned())
      .unwrap_or_default();

    let kind = if path.is_dir() {
      ModKind::Folder
    } else {
      let base = name.strip_suffix(DISABLED_SUFFIX).unwrap_or(&name);
      match Path::new(base).extension().and_then(|e| e.to_str()) {
        Some(ext) if ext.eq_ignore_ascii_case("jar") => ModKind::Jar,
        Some(ext) if ext.eq_ignore_ascii_case("zip") => ModKind::Zip,
        _ => ModKind::Unknown,
      }
    };

    Self {
      path,
      name,
      kind,
      status: MetadataStatus::NoMetadata,
      metadata: None,
    }
  }

  pub fn is_valid(&self) -> bool {
    self.kind != ModKind::Unknown
  }

  pub fn is_enabled(&self) -> bool {
    !self.name.ends_with(DISABLED_SUFFIX)
  }

  pub fn set_metadata(&mut self, metadata: ModMetadata) {
    self.metadata = Some(metadata);
    self.status = MetadataStatus::HasMetadata;
  }

  /// Whether the attached metadata was resolved against `provider`.
  pub fn has_metadata_from(&self, provider: Provider) -> bool {
    self.status == MetadataStatus::HasMetadata
      && self.metadata.as_ref().and_then(ModMetadata::provider) == Some(provider)
  }
}

/// List the direct children of `mods_dir`, attaching records from `index_dir`.
///
/// Dotfiles and the index directory itself are skipped. Results are sorted by name.
pub fn scan_dir(mods_dir: &Path, index_dir: &Path, index: &PackwizIndex) -> Result<Vec<LocalMod>, ScanError> {
  if !mods_dir.is_dir() {
    return Err(ScanError::NotADirectory(mods_dir.to_path_buf()));
  }

  let mut records: HashMap<String, ModMetadata> = index
    .list(index_dir)?
    .into_iter()
    .map(|record| (record.filename.clone(), record))
    .collect();

  let mut mods = Vec::new();
  for entry in WalkDir::new(mods_dir)
    .min_depth(1)
    .max_depth(1)
    .sort_by_file_name()
  {
    let entry = entry?;
    if entry.path() == index_dir || entry.file_name().to_string_lossy().starts_with('.') {
      trace!(path = %entry.path().display(), "skipping hidden entry");
      continue;
    }

    let mut local = LocalMod::from_path(entry.path());
    if let Some(record) = records.remove(&local.name) {
      local.set_metadata(record);
    }
    mods.push(local);
  }

  debug!(dir = %mods_dir.display(), count = mods.len(), "scanned mods directory");
  Ok(mods)
}
