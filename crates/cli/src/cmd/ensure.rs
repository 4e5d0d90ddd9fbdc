//! Implementation of the `modmeta ensure` command.
//!
//! Scans a mods directory, resolves metadata for every mod that lacks it and
//! writes the records to the index. Ctrl-C aborts the in-flight lookup.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result, bail};
use tokio::sync::mpsc::unbounded_channel;
use tracing::debug;

use modmeta_lib::config::Config;
use modmeta_lib::ensure::{EnsureMetadata, MetadataEvent, RunReport, RunStatus};
use modmeta_lib::index::PackwizIndex;
use modmeta_lib::mods::scan_dir;
use modmeta_lib::net::HttpTransport;
use modmeta_lib::provider::Provider;

use super::index_dir_for;
use crate::output::{
  OutputFormat, format_duration, print_failed, print_info, print_json, print_ready, print_stat, print_success,
  print_warning,
};

pub fn cmd_ensure(mods_dir: &Path, provider: Provider, index_dir: Option<PathBuf>, format: OutputFormat) -> Result<()> {
  let config = Config::load().context("Failed to load configuration")?;
  let index_dir = index_dir_for(mods_dir, index_dir);
  let index = PackwizIndex::new();

  let mut mods = scan_dir(mods_dir, &index_dir, &index)
    .with_context(|| format!("Failed to scan {}", mods_dir.display()))?;
  if mods.is_empty() {
    if format.is_json() {
      print_json(&RunReport::default())?;
    } else {
      print_info(&format!("No mods found in {}", mods_dir.display()));
    }
    return Ok(());
  }

  let transport = Arc::new(HttpTransport::new(&config).context("Failed to create HTTP client")?);
  let mut ensure = EnsureMetadata::new(transport, index, config.endpoints(), &index_dir, provider);
  let abort = ensure.abort_handle();

  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let start = Instant::now();
  let (tx, mut rx) = unbounded_channel();

  let report = rt.block_on(async {
    let watcher = tokio::spawn(async move {
      if tokio::signal::ctrl_c().await.is_ok() {
        let cancelled = abort.abort();
        debug!(cancelled, "interrupt received");
      }
    });
    let report = ensure.run(&mut mods, tx).await;
    watcher.abort();
    report
  });
  let elapsed = start.elapsed();

  if format.is_json() {
    print_json(&report)?;
  } else {
    while let Ok(event) = rx.try_recv() {
      match event {
        MetadataEvent::Ready(m) => print_ready(&m.name),
        MetadataEvent::Failed(m) => print_failed(&m.name),
      }
    }

    println!();
    match &report.status {
      RunStatus::Succeeded => print_success(&format!("Metadata resolved with {}", provider.readable_name())),
      RunStatus::Failed(reason) => print_warning(reason),
      RunStatus::Aborted => print_warning("Interrupted"),
    }
    print_stat("Ready", &report.ready.len().to_string());
    print_stat("Failed", &report.failed.len().to_string());
    if !report.indeterminate.is_empty() {
      print_stat("Undecided", &report.indeterminate.len().to_string());
    }
    print_stat("Index", &index_dir.display().to_string());
    print_stat("Took", &format_duration(elapsed));
  }

  match report.status {
    RunStatus::Succeeded => Ok(()),
    RunStatus::Failed(reason) => bail!("Metadata run failed: {}", reason),
    RunStatus::Aborted => bail!("Metadata run aborted"),
  }
}
