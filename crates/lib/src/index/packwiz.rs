//! Packwiz-style metadata index.
//!
//! # Layout
//!
//! ```text
//! {mods_dir}/.index/
//! ├── sodium-fabric-0.5.8.jar.pw.toml
//! └── jei-1.20.1-forge-15.2.0.27.jar.pw.toml
//! ```
//!
//! Each record is written to a temporary file in the index directory and
//! renamed over the target, so readers never see a partial record.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use super::types::{CurseForgeUpdate, Download, IndexError, ModMetadata, ModrinthUpdate, Side, Update};
use super::MetadataStore;
use crate::consts::INDEX_FILE_SUFFIX;
use crate::provider::{IndexedPack, IndexedVersion, Provider};

#[derive(Debug, Clone, Copy, Default)]
pub struct PackwizIndex;

impl PackwizIndex {
  pub fn new() -> Self {
    Self
  }

  /// Path of the record for `file_name` inside `dir`.
  ///
  /// The whole file name, extension included, is the key: `foo.jar` and
  /// `foo.zip` get separate records.
  pub fn record_path(dir: &Path, file_name: &str) -> Result<PathBuf, IndexError> {
    let is_plain = Path::new(file_name).file_name().and_then(|n| n.to_str()) == Some(file_name);
    if !is_plain || file_name.starts_with('.') {
      return Err(IndexError::InvalidFileName(file_name.to_string()));
    }
    Ok(dir.join(format!("{file_name}{INDEX_FILE_SUFFIX}")))
  }

  /// Load every record in `dir`. A missing directory is an empty index.
  ///
  /// Unreadable records are logged and skipped.
  pub fn list(&self, dir: &Path) -> Result<Vec<ModMetadata>, IndexError> {
    let entries = match fs::read_dir(dir) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => {
        return Err(IndexError::Read {
          path: dir.to_path_buf(),
          source: e,
        });
      }
    };

    let mut paths: Vec<PathBuf> = entries
      .filter_map(Result::ok)
      .map(|entry| entry.path())
      .filter(|path| {
        path
          .file_name()
          .and_then(|n| n.to_str())
          .is_some_and(|n| n.ends_with(INDEX_FILE_SUFFIX))
      })
      .collect();
    paths.sort();

    let mut records = Vec::with_capacity(paths.len());
    for path in paths {
      match load_record(&path) {
        Ok(record) => records.push(record),
        Err(e) => warn!(path = %path.display(), error = %e, "skipping unreadable metadata record"),
      }
    }
    Ok(records)
  }
}

fn load_record(path: &Path) -> Result<ModMetadata, IndexError> {
  let content = fs::read_to_string(path).map_err(|e| IndexError::Read {
    path: path.to_path_buf(),
    source: e,
  })?;
  toml::from_str(&content).map_err(|e| IndexError::Parse {
    path: path.to_path_buf(),
    source: e,
  })
}

fn parse_id(field: &'static str, value: &str) -> Result<u64, IndexError> {
  value.parse().map_err(|_| IndexError::InvalidId {
    field,
    value: value.to_string(),
  })
}

/// Build the packwiz record for a resolved version.
pub(crate) fn to_record(pack: &IndexedPack, version: &IndexedVersion) -> Result<ModMetadata, IndexError> {
  let update = match version.provider {
    Provider::Modrinth => Update {
      modrinth: Some(ModrinthUpdate {
        mod_id: version.addon_id.clone(),
        version: version.file_id.clone(),
      }),
      curseforge: None,
    },
    Provider::CurseForge => Update {
      modrinth: None,
      curseforge: Some(CurseForgeUpdate {
        file_id: match version.file_id.as_str() {
          "" => None,
          id => Some(parse_id("file-id", id)?),
        },
        project_id: parse_id("project-id", &version.addon_id)?,
      }),
    },
  };

  // CurseForge omits the url for files whose authors disabled third-party downloads.
  let mode = match (version.provider, &version.download_url) {
    (Provider::CurseForge, None) => Some("metadata:curseforge".to_string()),
    _ => None,
  };

  Ok(ModMetadata {
    name: pack.name.clone(),
    filename: version.file_name.clone(),
    side: Side::Both,
    loaders: version.loaders.clone(),
    mc_versions: version.game_versions.clone(),
    download: Download {
      url: version.download_url.clone(),
      hash_format: version.hash_type.map(|alg| alg.as_str().to_string()),
      hash: version.hash.clone(),
      mode,
    },
    update,
  })
}

impl MetadataStore for PackwizIndex {
  fn write(&self, dir: &Path, pack: &IndexedPack, version: &IndexedVersion) -> Result<(), IndexError> {
    let path = Self::record_path(dir, &version.file_name)?;
    let record = to_record(pack, version)?;
    let content = toml::to_string(&record)?;

    fs::create_dir_all(dir).map_err(|e| IndexError::CreateDir {
      path: dir.to_path_buf(),
      source: e,
    })?;

    let write_err = |source: io::Error| IndexError::Write {
      path: path.clone(),
      source,
    };
    let mut temp = NamedTempFile::new_in(dir).map_err(write_err)?;
    temp.write_all(content.as_bytes()).map_err(write_err)?;
    temp.persist(&path).map_err(|e| write_err(e.error))?;

    debug!(path = %path.display(), provider = %version.provider, "wrote metadata record");
    Ok(())
  }

  fn read(&self, dir: &Path, file_name: &str) -> Result<ModMetadata, IndexError> {
    let path = Self::record_path(dir, file_name)?;
    let record = match load_record(&path) {
      Err(IndexError::Read { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
        return Err(IndexError::NotFound(file_name.to_string()));
      }
      other => other?,
    };

    if record.filename != file_name {
      return Err(IndexError::FileNameMismatch {
        path,
        expected: file_name.to_string(),
        found: record.filename,
      });
    }
    Ok(record)
  }
}
