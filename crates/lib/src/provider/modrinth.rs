//! Modrinth `version_files` lookups.
//!
//! Request: `POST /v2/version_files` with `{"hashes": [...], "algorithm": "sha512"}`.
//! Response: an object keyed by each matched hash, each value a version object.
//! Hashes with no match are simply absent.

use std::collections::HashMap;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::{IndexedVersion, MatchEntry, ParseError, Provider, QueryError};
use crate::config::ApiEndpoints;
use crate::fingerprint::Fingerprint;
use crate::net::ApiRequest;
use crate::util::hash::HashAlgorithm;

pub fn build_request(endpoints: &ApiEndpoints, fingerprints: &[Fingerprint]) -> Result<ApiRequest, QueryError> {
  if fingerprints.is_empty() {
    return Err(QueryError::NoFingerprints);
  }

  let hashes: Vec<&str> = fingerprints.iter().map(Fingerprint::as_str).collect();
  Ok(ApiRequest {
    url: format!("{}/v2/version_files", endpoints.modrinth),
    body: serde_json::json!({
      "hashes": hashes,
      "algorithm": Provider::Modrinth.fingerprint_algorithm().as_str(),
    }),
  })
}

pub fn parse_response(body: &[u8]) -> Result<Vec<MatchEntry>, ParseError> {
  let doc: Value = serde_json::from_slice(body)?;
  let entries: Map<String, Value> = match doc {
    Value::Object(map) => map,
    _ => {
      return Err(ParseError::InvalidField {
        field: "<root>".to_string(),
        expected: "an object",
      });
    }
  };

  Ok(
    entries
      .into_iter()
      .map(|(hash, value)| {
        let version = parse_version(&hash, value);
        MatchEntry {
          fingerprint: Fingerprint(hash),
          version,
        }
      })
      .collect(),
  )
}

#[derive(Debug, Deserialize)]
struct VersionDto {
  id: String,
  project_id: String,
  #[serde(default)]
  name: Option<String>,
  #[serde(default)]
  version_number: Option<String>,
  #[serde(default)]
  date_published: Option<String>,
  #[serde(default)]
  game_versions: Vec<String>,
  #[serde(default)]
  loaders: Vec<String>,
  #[serde(default)]
  files: Vec<FileDto>,
}

#[derive(Debug, Deserialize)]
struct FileDto {
  #[serde(default)]
  hashes: HashMap<String, String>,
  url: String,
  filename: String,
  #[serde(default)]
  primary: bool,
}

/// Parse one version object; `hash` is the key it was returned under.
fn parse_version(hash: &str, value: Value) -> Result<IndexedVersion, ParseError> {
  if !value.is_object() {
    return Err(ParseError::InvalidField {
      field: hash.to_string(),
      expected: "a version object",
    });
  }
  let dto: VersionDto = serde_json::from_value(value)?;

  // Prefer the file we actually matched, then the primary file, then any.
  let file = dto
    .files
    .iter()
    .find(|f| f.hashes.values().any(|h| h == hash))
    .or_else(|| dto.files.iter().find(|f| f.primary))
    .or_else(|| dto.files.first());

  let (hash_type, file_hash) = match file {
    Some(f) => [HashAlgorithm::Sha512, HashAlgorithm::Sha1]
      .into_iter()
      .find_map(|alg| f.hashes.get(alg.as_str()).map(|h| (Some(alg), Some(h.clone()))))
      .unwrap_or((None, None)),
    None => (None, None),
  };

  let version = dto.version_number.unwrap_or_default();
  Ok(IndexedVersion {
    provider: Provider::Modrinth,
    addon_id: dto.project_id,
    file_id: dto.id,
    version_name: dto.name.unwrap_or_else(|| version.clone()),
    version,
    file_name: file.map(|f| f.filename.clone()).unwrap_or_default(),
    download_url: file.map(|f| f.url.clone()),
    hash: file_hash,
    hash_type,
    game_versions: dto.game_versions,
    loaders: dto.loaders,
    date: dto.date_published,
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn version_json(project: &str, hash: &str) -> Value {
    serde_json::json!({
      "id": "ver123",
      "project_id": project,
      "name": "Sodium 0.5.8",
      "version_number": "mc1.20.4-0.5.8",
      "date_published": "2024-02-01T00:00:00Z",
      "game_versions": ["1.20.4"],
      "loaders": ["fabric"],
      "files": [
        {
          "hashes": { "sha512": "other", "sha1": "x" },
          "url": "https://cdn.modrinth.com/other.jar",
          "filename": "other.jar",
          "primary": true
        },
        {
          "hashes": { "sha512": hash, "sha1": "y" },
          "url": "https://cdn.modrinth.com/sodium.jar",
          "filename": "sodium-remote.jar",
          "primary": false
        }
      ]
    })
  }

  #[test]
  fn request_lists_every_hash() {
    let endpoints = ApiEndpoints::new("https://api.modrinth.com/", "https://api.curseforge.com");
    let request = build_request(&endpoints, &["aa".into(), "bb".into()]).unwrap();

    assert_eq!(request.url, "https://api.modrinth.com/v2/version_files");
    assert_eq!(
      request.body,
      serde_json::json!({ "hashes": ["aa", "bb"], "algorithm": "sha512" })
    );
  }

  #[test]
  fn empty_request_is_rejected() {
    let result = build_request(&ApiEndpoints::default(), &[]);
    assert_eq!(result, Err(QueryError::NoFingerprints));
  }

  #[test]
  fn parses_entries_keyed_by_hash() {
    let body = serde_json::json!({ "aa": version_json("P1", "aa") }).to_string();
    let entries = parse_response(body.as_bytes()).unwrap();

    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].fingerprint, Fingerprint::from("aa"));
    let version = entries[0].version.as_ref().unwrap();
    assert_eq!(version.addon_id, "P1");
    assert_eq!(version.file_id, "ver123");
    assert_eq!(version.version, "mc1.20.4-0.5.8");
    assert_eq!(version.loaders, vec!["fabric".to_string()]);
  }

  #[test]
  fn picks_the_matched_file_over_primary() {
    let body = serde_json::json!({ "aa": version_json("P1", "aa") }).to_string();
    let entries = parse_response(body.as_bytes()).unwrap();
    let version = entries[0].version.as_ref().unwrap();

    assert_eq!(version.file_name, "sodium-remote.jar");
    assert_eq!(version.hash.as_deref(), Some("aa"));
    assert_eq!(version.hash_type, Some(HashAlgorithm::Sha512));
  }

  #[test]
  fn malformed_entry_fails_only_that_entry() {
    let body = serde_json::json!({
      "aa": version_json("P1", "aa"),
      "bb": { "id": "no-project" },
      "cc": 42
    })
    .to_string();
    let mut entries = parse_response(body.as_bytes()).unwrap();
    entries.sort_by(|a, b| a.fingerprint.cmp(&b.fingerprint));

    assert!(entries[0].version.is_ok());
    assert!(entries[1].version.is_err());
    assert!(entries[2].version.is_err());
  }

  #[test]
  fn non_object_document_is_parse_error() {
    assert!(parse_response(b"[1, 2]").is_err());
    assert!(parse_response(b"not json").is_err());
  }

  #[test]
  fn empty_object_means_no_matches() {
    assert!(parse_response(b"{}").unwrap().is_empty());
  }
}
