//! Status command implementation.
//!
//! Lists the mods in a directory along with the metadata the index holds for them.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use modmeta_lib::index::PackwizIndex;
use modmeta_lib::mods::{MetadataStatus, ModKind, scan_dir};

use super::index_dir_for;
use crate::output::{self, OutputFormat, print_info, print_json, print_stat};

pub fn cmd_status(mods_dir: &Path, index_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
  let index_dir = index_dir_for(mods_dir, index_dir);
  let mods = scan_dir(mods_dir, &index_dir, &PackwizIndex::new())
    .with_context(|| format!("Failed to scan {}", mods_dir.display()))?;

  if format.is_json() {
    return print_json(&mods);
  }

  if mods.is_empty() {
    print_info(&format!("No mods found in {}", mods_dir.display()));
    return Ok(());
  }

  for m in &mods {
    let detail = match (&m.metadata, m.kind) {
      (Some(meta), _) => format!(
        "{} {}",
        meta.provider().map(|p| p.readable_name()).unwrap_or("unknown provider"),
        meta.addon_id().unwrap_or_default()
      ),
      (None, ModKind::Folder) => "folder".to_string(),
      (None, ModKind::Unknown) => "not a mod".to_string(),
      (None, _) => "no metadata".to_string(),
    };
    println!("  {} {} {} {}", output::symbols::INFO, m.name, output::symbols::ARROW, detail);
  }

  let with_metadata = mods.iter().filter(|m| m.status == MetadataStatus::HasMetadata).count();
  println!();
  print_stat("Mods", &mods.len().to_string());
  print_stat("With metadata", &with_metadata.to_string());
  print_stat("Index", &index_dir.display().to_string());

  Ok(())
}
