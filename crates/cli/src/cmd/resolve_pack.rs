//! Implementation of the `modmeta resolve-pack` command.

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};

use modmeta_lib::config::Config;
use modmeta_lib::net::HttpTransport;
use modmeta_lib::provider::curseforge::resolve::{PARTIAL_FAILURE_MESSAGE, PackManifest, resolve_files};

use crate::output::{OutputFormat, print_failed, print_json, print_ready, print_stat, print_success, print_warning};

/// Resolve each `(projectID, fileID)` pair of a CurseForge modpack manifest.
pub fn cmd_resolve_pack(manifest_path: &Path, format: OutputFormat) -> Result<()> {
  let content = std::fs::read_to_string(manifest_path)
    .with_context(|| format!("Failed to read {}", manifest_path.display()))?;
  let manifest: PackManifest =
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", manifest_path.display()))?;

  let config = Config::load().context("Failed to load configuration")?;
  let transport = Arc::new(HttpTransport::new(&config).context("Failed to create HTTP client")?);

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let resolution = rt
    .block_on(resolve_files(transport, &config.endpoints(), &manifest.files))
    .context("Failed to resolve manifest files")?;

  if format.is_json() {
    print_json(&resolution)?;
  } else {
    for file in &resolution.files {
      let label = match (&file.project_slug, &file.file_name) {
        (Some(slug), Some(name)) => format!("{}/{}", slug, name),
        (None, Some(name)) => name.clone(),
        _ => format!("{}/{}", file.project_id, file.file_id),
      };
      if file.resolved {
        print_ready(&label);
      } else {
        print_failed(&label);
      }
    }

    println!();
    match (&manifest.name, &manifest.version) {
      (Some(name), Some(version)) => print_success(&format!("Resolved {} {}", name, version)),
      (Some(name), None) => print_success(&format!("Resolved {}", name)),
      _ => {}
    }
    print_stat("Files", &resolution.files.len().to_string());
    print_stat("Unresolved", &resolution.unresolved().count().to_string());
  }

  if !resolution.is_success() {
    print_warning(PARTIAL_FAILURE_MESSAGE);
    bail!("{} ({} records unreadable)", PARTIAL_FAILURE_MESSAGE, resolution.failures);
  }

  Ok(())
}
