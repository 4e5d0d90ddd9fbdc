//! CurseForge fingerprint matching.
//!
//! Request: `POST /v1/fingerprints` with `{"fingerprints": [u32, ...]}`.
//! Response: `{"data": {"exactMatches": [{"file": {...}}, ...]}}`. Matches
//! come back in any order and may cover only part of the request; each is
//! keyed by its `file.fileFingerprint`.

pub mod resolve;

use serde::Deserialize;
use serde_json::Value;
use tracing::warn;

use super::{IndexedVersion, MatchEntry, ParseError, Provider, QueryError};
use crate::config::ApiEndpoints;
use crate::fingerprint::Fingerprint;
use crate::net::ApiRequest;
use crate::util::hash::HashAlgorithm;

/// Entries of a file's `gameVersions` list that name a mod loader rather than a game version.
const LOADER_NAMES: [&str; 4] = ["forge", "neoforge", "fabric", "quilt"];

pub fn build_request(endpoints: &ApiEndpoints, fingerprints: &[Fingerprint]) -> Result<ApiRequest, QueryError> {
  if fingerprints.is_empty() {
    return Err(QueryError::NoFingerprints);
  }

  let ids = fingerprints
    .iter()
    .map(|fp| {
      fp.as_str()
        .parse::<u32>()
        .map_err(|_| QueryError::InvalidFingerprint(fp.0.clone()))
    })
    .collect::<Result<Vec<u32>, _>>()?;

  Ok(ApiRequest {
    url: format!("{}/v1/fingerprints", endpoints.curseforge),
    body: serde_json::json!({ "fingerprints": ids }),
  })
}

#[derive(Debug, Deserialize)]
struct FingerprintResponse {
  data: FingerprintData,
}

#[derive(Debug, Deserialize)]
struct FingerprintData {
  #[serde(rename = "exactMatches")]
  exact_matches: Vec<Value>,
}

pub fn parse_response(body: &[u8]) -> Result<Vec<MatchEntry>, ParseError> {
  let response: FingerprintResponse = serde_json::from_slice(body)?;

  if response.data.exact_matches.is_empty() {
    warn!("no matches found for fingerprint search");
  }

  let mut entries = Vec::with_capacity(response.data.exact_matches.len());
  for entry in response.data.exact_matches {
    let Some(file) = entry.get("file") else {
      warn!("fingerprint match without a file object, skipping");
      continue;
    };
    let Some(fingerprint) = file.get("fileFingerprint").and_then(Value::as_u64) else {
      warn!("fingerprint match without a readable fileFingerprint, skipping");
      continue;
    };

    let version = serde_json::from_value::<FileDto>(file.clone())
      .map(FileDto::into_version)
      .map_err(ParseError::from);

    entries.push(MatchEntry {
      fingerprint: Fingerprint(fingerprint.to_string()),
      version,
    });
  }

  Ok(entries)
}

/// A CurseForge file object, as returned by both `/v1/fingerprints` and `/v1/mods/files`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct FileDto {
  #[serde(default)]
  pub id: Option<u64>,
  pub mod_id: u64,
  #[serde(default)]
  pub display_name: Option<String>,
  #[serde(default)]
  pub file_name: Option<String>,
  #[serde(default)]
  pub file_date: Option<String>,
  #[serde(default)]
  pub download_url: Option<String>,
  #[serde(default)]
  pub game_versions: Vec<String>,
  #[serde(default)]
  pub hashes: Vec<HashDto>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct HashDto {
  pub value: String,
  pub algo: u8,
}

impl FileDto {
  pub(crate) fn into_version(self) -> IndexedVersion {
    // algo 1 = sha1, 2 = md5
    let hash = self
      .hashes
      .iter()
      .find(|h| h.algo == 1)
      .map(|h| (HashAlgorithm::Sha1, h.value.clone()))
      .or_else(|| {
        self
          .hashes
          .iter()
          .find(|h| h.algo == 2)
          .map(|h| (HashAlgorithm::Md5, h.value.clone()))
      });

    let (loaders, game_versions): (Vec<String>, Vec<String>) = self
      .game_versions
      .into_iter()
      .partition(|v| LOADER_NAMES.contains(&v.to_ascii_lowercase().as_str()));

    let display_name = self.display_name.unwrap_or_default();
    IndexedVersion {
      provider: Provider::CurseForge,
      addon_id: self.mod_id.to_string(),
      file_id: self.id.map(|id| id.to_string()).unwrap_or_default(),
      version: display_name.clone(),
      version_name: display_name,
      file_name: self.file_name.unwrap_or_default(),
      download_url: self.download_url,
      hash_type: hash.as_ref().map(|(alg, _)| *alg),
      hash: hash.map(|(_, value)| value),
      game_versions,
      loaders: loaders.into_iter().map(|l| l.to_ascii_lowercase()).collect(),
      date: self.file_date,
    }
  }
}
