//! Resolution of CurseForge modpack manifest entries.
//!
//! A modpack `manifest.json` only lists `(projectID, fileID)` pairs. Turning
//! those into downloadable files takes two lookups that are issued together
//! in one [`NetJob`]:
//!
//! - `POST /v1/mods` with `{"modIds": [...]}` for project slugs
//! - `POST /v1/mods/files` with `{"fileIds": [...]}` for file details
//!
//! Individual records that fail to parse mark the resolution as failed but do
//! not stop the remaining records from being applied.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::FileDto;
use crate::config::ApiEndpoints;
use crate::net::{ApiRequest, NetJob, NetworkError, Transport};
use crate::provider::ParseError;

/// Reported when at least one record could not be applied.
pub const PARTIAL_FAILURE_MESSAGE: &str = "Some mod ID resolving tasks failed.";

#[derive(Debug, Error)]
pub enum ResolveError {
  #[error("manifest lists no files")]
  NoFiles,

  #[error(transparent)]
  Network(#[from] NetworkError),

  #[error("failed to parse {endpoint} response: {source}")]
  Parse {
    endpoint: &'static str,
    #[source]
    source: ParseError,
  },
}

/// The parts of a modpack `manifest.json` needed for resolution.
#[derive(Debug, Clone, Deserialize)]
pub struct PackManifest {
  #[serde(default)]
  pub name: Option<String>,
  #[serde(default)]
  pub version: Option<String>,
  pub files: Vec<ManifestFile>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestFile {
  #[serde(rename = "projectID")]
  pub project_id: u64,
  #[serde(rename = "fileID")]
  pub file_id: u64,
  #[serde(default = "default_required")]
  pub required: bool,
}

fn default_required() -> bool {
  true
}

/// A manifest entry after resolution.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolvedFile {
  pub project_id: u64,
  pub file_id: u64,
  pub required: bool,
  pub project_slug: Option<String>,
  pub file_name: Option<String>,
  pub display_name: Option<String>,
  pub download_url: Option<String>,
  /// Whether a file record was found and applied.
  pub resolved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Resolution {
  pub files: Vec<ResolvedFile>,
  /// Number of records that could not be parsed.
  pub failures: usize,
}

impl Resolution {
  pub fn is_success(&self) -> bool {
    self.failures == 0
  }

  pub fn unresolved(&self) -> impl Iterator<Item = &ResolvedFile> {
    self.files.iter().filter(|f| !f.resolved)
  }
}

#[derive(Debug, Deserialize)]
struct DataEnvelope {
  data: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ModDto {
  id: u64,
  slug: String,
}

/// Resolve every manifest entry against the CurseForge API.
pub async fn resolve_files<T: Transport>(
  transport: Arc<T>,
  endpoints: &ApiEndpoints,
  files: &[ManifestFile],
) -> Result<Resolution, ResolveError> {
  if files.is_empty() {
    return Err(ResolveError::NoFiles);
  }

  info!(count = files.len(), "resolving mod IDs");

  let mod_ids: Vec<u64> = files.iter().map(|f| f.project_id).collect();
  let file_ids: Vec<u64> = files.iter().map(|f| f.file_id).collect();
  let requests = vec![
    ApiRequest {
      url: format!("{}/v1/mods", endpoints.curseforge),
      body: serde_json::json!({ "modIds": mod_ids }),
    },
    ApiRequest {
      url: format!("{}/v1/mods/files", endpoints.curseforge),
      body: serde_json::json!({ "fileIds": file_ids }),
    },
  ];

  let bodies = NetJob::start("Mod id resolver", transport, requests).wait().await?;
  let (mods_body, files_body) = match bodies.as_slice() {
    [mods, files] => (mods, files),
    _ => {
      return Err(ResolveError::Network(NetworkError::Task(
        "unexpected number of responses".to_string(),
      )));
    }
  };

  apply_responses(files, mods_body, files_body)
}

fn apply_responses(files: &[ManifestFile], mods_body: &[u8], files_body: &[u8]) -> Result<Resolution, ResolveError> {
  let mut failures = 0;

  let mods: DataEnvelope = serde_json::from_slice(mods_body).map_err(|e| ResolveError::Parse {
    endpoint: "/v1/mods",
    source: e.into(),
  })?;

  let mut slugs: HashMap<u64, String> = HashMap::with_capacity(mods.data.len());
  for value in mods.data {
    match serde_json::from_value::<ModDto>(value) {
      Ok(m) => {
        slugs.insert(m.id, m.slug);
      }
      Err(e) => {
        error!(error = %e, "resolving failed because of a parsing error in a mod record");
        failures += 1;
      }
    }
  }

  let mut resolved: Vec<ResolvedFile> = files
    .iter()
    .map(|f| ResolvedFile {
      project_id: f.project_id,
      file_id: f.file_id,
      required: f.required,
      project_slug: slugs.get(&f.project_id).cloned(),
      ..ResolvedFile::default()
    })
    .collect();

  let by_file_id: HashMap<u64, usize> = files.iter().enumerate().map(|(i, f)| (f.file_id, i)).collect();

  let records: DataEnvelope = serde_json::from_slice(files_body).map_err(|e| ResolveError::Parse {
    endpoint: "/v1/mods/files",
    source: e.into(),
  })?;

  for value in records.data {
    let dto = match serde_json::from_value::<FileDto>(value) {
      Ok(dto) => dto,
      Err(e) => {
        error!(error = %e, "resolving failed because of a parsing error in a file record");
        failures += 1;
        continue;
      }
    };

    let Some(idx) = dto.id.and_then(|id| by_file_id.get(&id).copied()) else {
      warn!(file_id = ?dto.id, "file record not listed in the manifest, skipping");
      continue;
    };

    let out = &mut resolved[idx];
    if out.project_id != dto.mod_id {
      warn!(
        file_id = out.file_id,
        expected = out.project_id,
        actual = dto.mod_id,
        "file record belongs to a different project"
      );
    }
    out.file_name = dto.file_name;
    out.display_name = dto.display_name;
    out.download_url = dto.download_url;
    out.resolved = true;
    debug!(file_id = out.file_id, slug = ?out.project_slug, "resolved manifest file");
  }

  if failures > 0 {
    warn!(failures, "{}", PARTIAL_FAILURE_MESSAGE);
  }

  Ok(Resolution {
    files: resolved,
    failures,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::MockTransport;

  fn manifest_files() -> Vec<ManifestFile> {
    serde_json::from_str(
      r#"[
        {"projectID": 238222, "fileID": 4712866, "required": true},
        {"projectID": 306612, "fileID": 4596894}
      ]"#,
    )
    .unwrap()
  }

  const MODS_BODY: &str = r#"{"data":[
    {"id": 238222, "slug": "jei", "name": "Just Enough Items"},
    {"id": 306612, "slug": "fabric-api"}
  ]}"#;

  const FILES_BODY: &str = r#"{"data":[
    {"id": 4596894, "modId": 306612, "displayName": "Fabric API 0.86", "fileName": "fabric-api-0.86.jar",
     "downloadUrl": "https://edge.forgecdn.net/files/4596/894/fabric-api-0.86.jar"},
    {"id": 4712866, "modId": 238222, "displayName": "JEI 15.2", "fileName": "jei-15.2.jar", "downloadUrl": null}
  ]}"#;

  #[test]
  fn manifest_defaults_required_to_true() {
    let files = manifest_files();
    assert!(files[1].required);
  }

  #[test]
  fn responses_in_any_order_are_matched_by_id() {
    let resolution = apply_responses(&manifest_files(), MODS_BODY.as_bytes(), FILES_BODY.as_bytes()).unwrap();

    assert!(resolution.is_success());
    assert_eq!(resolution.files[0].project_slug.as_deref(), Some("jei"));
    assert_eq!(resolution.files[0].file_name.as_deref(), Some("jei-15.2.jar"));
    assert_eq!(resolution.files[0].download_url, None);
    assert_eq!(resolution.files[1].project_slug.as_deref(), Some("fabric-api"));
    assert!(resolution.files[1].resolved);
  }

  #[test]
  fn bad_records_count_as_failures_without_stopping() {
    let mods = r#"{"data":[{"id": 238222, "slug": "jei"}, {"slug": "no-id"}]}"#;
    let files = r#"{"data":[{"id": 4712866, "modId": 238222, "fileName": "jei.jar"}, {"id": "bad"}]}"#;

    let resolution = apply_responses(&manifest_files(), mods.as_bytes(), files.as_bytes()).unwrap();

    assert_eq!(resolution.failures, 2);
    assert!(!resolution.is_success());
    assert!(resolution.files[0].resolved);
    assert_eq!(resolution.unresolved().count(), 1);
  }

  #[test]
  fn malformed_document_is_error() {
    let result = apply_responses(&manifest_files(), b"nope", FILES_BODY.as_bytes());
    assert!(matches!(result, Err(ResolveError::Parse { endpoint: "/v1/mods", .. })));
  }

  #[tokio::test]
  async fn issues_both_lookups_in_one_job() {
    let transport = Arc::new(
      MockTransport::new()
        .respond("/v1/mods", MODS_BODY)
        .respond("/v1/mods/files", FILES_BODY),
    );
    let endpoints = ApiEndpoints::new("http://modrinth", "http://cf");

    let resolution = resolve_files(Arc::clone(&transport), &endpoints, &manifest_files())
      .await
      .unwrap();

    assert!(resolution.is_success());
    assert_eq!(transport.call_count(), 2);
    let bodies: Vec<Value> = transport.requests().into_iter().map(|r| r.body).collect();
    assert!(bodies.contains(&serde_json::json!({ "modIds": [238222, 306612] })));
    assert!(bodies.contains(&serde_json::json!({ "fileIds": [4712866, 4596894] })));
  }

  #[tokio::test]
  async fn network_failure_fails_resolution() {
    let transport = Arc::new(MockTransport::new().respond("/v1/mods", MODS_BODY).fail("/v1/mods/files", 503));

    let result = resolve_files(transport, &ApiEndpoints::default(), &manifest_files()).await;
    assert!(matches!(result, Err(ResolveError::Network(_))));
  }

  #[tokio::test]
  async fn empty_manifest_is_rejected() {
    let transport = Arc::new(MockTransport::new());
    let result = resolve_files(Arc::clone(&transport), &ApiEndpoints::default(), &[]).await;

    assert!(matches!(result, Err(ResolveError::NoFiles)));
    assert_eq!(transport.call_count(), 0);
  }
}
