use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::Provider;

#[derive(Debug, Error)]
pub enum IndexError {
  #[error("failed to create index directory {path}: {source}")]
  CreateDir {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("failed to serialize metadata: {0}")]
  Serialize(#[from] toml::ser::Error),

  #[error("no metadata for '{0}'")]
  NotFound(String),

  #[error("invalid file name '{0}'")]
  InvalidFileName(String),

  #[error("{path} describes '{found}', not '{expected}'")]
  FileNameMismatch {
    path: PathBuf,
    expected: String,
    found: String,
  },

  #[error("{field} '{value}' is not a numeric id")]
  InvalidId { field: &'static str, value: String },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
  Client,
  Server,
  #[default]
  Both,
}

/// One packwiz `.pw.toml` record.
///
/// ```toml
/// name = "Sodium"
/// filename = "sodium-fabric-0.5.8.jar"
/// side = "both"
///
/// [download]
/// url = "https://cdn.modrinth.com/..."
/// hash-format = "sha512"
/// hash = "..."
///
/// [update.modrinth]
/// mod-id = "AANobbMI"
/// version = "ZwMjD5Jm"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModMetadata {
  pub name: String,
  pub filename: String,
  #[serde(default)]
  pub side: Side,
  #[serde(rename = "x-modmeta-loaders", default, skip_serializing_if = "Vec::is_empty")]
  pub loaders: Vec<String>,
  #[serde(rename = "x-modmeta-mc-versions", default, skip_serializing_if = "Vec::is_empty")]
  pub mc_versions: Vec<String>,
  pub download: Download,
  #[serde(default)]
  pub update: Update,
}

impl ModMetadata {
  /// The provider this record was resolved against.
  pub fn provider(&self) -> Option<Provider> {
    if self.update.modrinth.is_some() {
      Some(Provider::Modrinth)
    } else if self.update.curseforge.is_some() {
      Some(Provider::CurseForge)
    } else {
      None
    }
  }

  /// The provider's project id, as a string.
  pub fn addon_id(&self) -> Option<String> {
    match (&self.update.modrinth, &self.update.curseforge) {
      (Some(m), _) => Some(m.mod_id.clone()),
      (None, Some(c)) => Some(c.project_id.to_string()),
      (None, None) => None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct Download {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hash_format: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub hash: Option<String>,
  /// `metadata:curseforge` when the file must be fetched through the API.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub mode: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Update {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub modrinth: Option<ModrinthUpdate>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub curseforge: Option<CurseForgeUpdate>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ModrinthUpdate {
  pub mod_id: String,
  pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CurseForgeUpdate {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub file_id: Option<u64>,
  pub project_id: u64,
}
