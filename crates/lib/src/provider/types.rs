//! Types shared by the provider query builders.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::fingerprint::Fingerprint;
use crate::util::hash::HashAlgorithm;

use super::Provider;

/// The project a resolved file belongs to.
///
/// Only the fields needed to write a metadata record are kept; the name is
/// the local mod's name, not the remote project title.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedPack {
  pub provider: Provider,
  pub addon_id: String,
  pub name: String,
  pub slug: Option<String>,
}

/// A provider's description of one specific file version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexedVersion {
  pub provider: Provider,
  /// Owning project (Modrinth project id, CurseForge mod id).
  pub addon_id: String,
  /// Version id on Modrinth, file id on CurseForge.
  pub file_id: String,
  pub version: String,
  pub version_name: String,
  pub file_name: String,
  pub download_url: Option<String>,
  pub hash: Option<String>,
  pub hash_type: Option<HashAlgorithm>,
  pub game_versions: Vec<String>,
  pub loaders: Vec<String>,
  pub date: Option<String>,
}

/// One entry of a parsed lookup response.
///
/// `version` is an error when the document as a whole was readable but this
/// particular entry was not; only the keyed fingerprint is affected.
#[derive(Debug)]
pub struct MatchEntry {
  pub fingerprint: Fingerprint,
  pub version: Result<IndexedVersion, ParseError>,
}

/// Errors raised while building a lookup request.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
  #[error("no fingerprints to query")]
  NoFingerprints,

  #[error("fingerprint '{0}' is not an unsigned 32-bit integer")]
  InvalidFingerprint(String),
}

/// Errors raised while reading a provider response.
#[derive(Debug, Error)]
pub enum ParseError {
  #[error("invalid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("field '{field}' is not {expected}")]
  InvalidField { field: String, expected: &'static str },
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown provider '{0}' (expected one of: modrinth, curseforge)")]
pub struct UnknownProvider(pub String);
