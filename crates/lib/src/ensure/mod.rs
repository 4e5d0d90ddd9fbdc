//! Metadata resolution runs.
//!
//! [`EnsureMetadata`] takes a set of local mods and makes sure each one ends
//! up with metadata from one provider:
//!
//! 1. **Checking**: mods that already carry metadata from the provider, and
//!    folder mods, are ready immediately. Everything else is fingerprinted;
//!    files that cannot be fingerprinted fail immediately.
//! 2. **Awaiting network**: the remaining fingerprints go out as one batched
//!    lookup in a [`NetJob`].
//! 3. **Correlating**: each returned record is matched back to its pending
//!    file by fingerprint, persisted through the [`MetadataStore`], reloaded
//!    and attached. Files the provider did not return fail.
//!
//! Every input file receives exactly one [`MetadataEvent`] unless the run is
//! aborted, in which case undecided files receive none.

mod types;

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

pub use types::*;

use crate::config::ApiEndpoints;
use crate::fingerprint::{Fingerprint, fingerprint_file};
use crate::index::{IndexError, MetadataStore};
use crate::mods::{LocalMod, ModKind};
use crate::net::{NetJob, Transport};
use crate::provider::{IndexedPack, IndexedVersion, Provider};

/// Resolves metadata for local mods against one provider.
pub struct EnsureMetadata<T: Transport, S: MetadataStore> {
  transport: Arc<T>,
  store: S,
  endpoints: ApiEndpoints,
  index_dir: PathBuf,
  provider: Provider,
  abort: AbortHandle,
}

/// Pending fingerprints mapped to their index in the caller's slice.
type PendingSet = HashMap<Fingerprint, usize>;

struct Outcomes {
  events: UnboundedSender<MetadataEvent>,
  report: RunReport,
}

impl Outcomes {
  fn ready(&mut self, local: &LocalMod) {
    self.report.ready.push(local.name.clone());
    // A dropped receiver only means nobody is listening.
    let _ = self.events.send(MetadataEvent::Ready(local.clone()));
  }

  fn failed(&mut self, local: &LocalMod) {
    self.report.failed.push(local.name.clone());
    let _ = self.events.send(MetadataEvent::Failed(local.clone()));
  }
}

impl<T: Transport, S: MetadataStore> EnsureMetadata<T, S> {
  pub fn new(
    transport: Arc<T>,
    store: S,
    endpoints: ApiEndpoints,
    index_dir: impl Into<PathBuf>,
    provider: Provider,
  ) -> Self {
    Self {
      transport,
      store,
      endpoints,
      index_dir: index_dir.into(),
      provider,
      abort: AbortHandle::default(),
    }
  }

  pub fn provider(&self) -> Provider {
    self.provider
  }

  pub fn index_dir(&self) -> &Path {
    &self.index_dir
  }

  /// A handle that aborts the next run, or the current one once it started.
  ///
  /// Each run consumes the handle's state, so an abort never carries over to
  /// a later run.
  pub fn abort_handle(&self) -> AbortHandle {
    self.abort.clone()
  }

  /// Resolve metadata for `mods`, updating them in place.
  ///
  /// Outcomes are sent on `events` as they are decided. Outcomes for mods that
  /// need no lookup are sent before any request is made, even when the run is
  /// aborted before it starts.
  pub async fn run(&mut self, mods: &mut [LocalMod], events: UnboundedSender<MetadataEvent>) -> RunReport {
    let abort = std::mem::take(&mut self.abort);
    let mut outcomes = Outcomes {
      events,
      report: RunReport::default(),
    };

    info!(provider = %self.provider, count = mods.len(), "Checking if mods have metadata...");
    let mut pending = self.check(mods, &mut outcomes);

    if pending.is_empty() {
      debug!("nothing left to resolve");
      return outcomes.report;
    }

    match self.resolve(mods, &mut pending, &mut outcomes, &abort).await {
      Ok(()) => {}
      Err(e) if abort.is_aborted() => debug!(error = %e, "run aborted while awaiting the network"),
      Err(e) => {
        warn!(provider = %self.provider, error = %e, pending = pending.len(), "metadata run failed");
        for idx in drain_sorted(&mut pending) {
          outcomes.failed(&mods[idx]);
        }
        outcomes.report.status = RunStatus::Failed(e.to_string());
      }
    }

    let mut report = outcomes.report;
    if abort.is_aborted() && !pending.is_empty() {
      report.status = RunStatus::Aborted;
      report.indeterminate = drain_sorted(&mut pending)
        .into_iter()
        .map(|idx| mods[idx].name.clone())
        .collect();
    }

    info!(
      provider = %self.provider,
      status = %report.status,
      ready = report.ready.len(),
      failed = report.failed.len(),
      "metadata run finished"
    );
    report
  }

  /// Partition `mods` into already satisfied and needing resolution.
  fn check(&self, mods: &[LocalMod], outcomes: &mut Outcomes) -> PendingSet {
    let mut pending = PendingSet::new();

    for (idx, local) in mods.iter().enumerate() {
      if local.kind == ModKind::Folder || local.has_metadata_from(self.provider) {
        debug!(name = %local.name, "already satisfied");
        outcomes.ready(local);
        continue;
      }

      if !local.is_valid() {
        warn!(name = %local.name, "not a mod archive");
        outcomes.failed(local);
        continue;
      }

      let fingerprint = match fingerprint_file(&local.path, self.provider) {
        Ok(fingerprint) => fingerprint,
        Err(e) => {
          warn!(name = %local.name, error = %e, "failed to fingerprint mod");
          outcomes.failed(local);
          continue;
        }
      };

      match pending.entry(fingerprint) {
        Entry::Vacant(slot) => {
          slot.insert(idx);
        }
        Entry::Occupied(slot) => {
          warn!(
            name = %local.name,
            duplicate_of = %mods[*slot.get()].name,
            "identical content already pending in this run"
          );
          outcomes.failed(local);
        }
      }
    }

    pending
  }

  async fn resolve(
    &self,
    mods: &mut [LocalMod],
    pending: &mut PendingSet,
    outcomes: &mut Outcomes,
    abort: &AbortHandle,
  ) -> Result<(), RunError> {
    if abort.is_aborted() {
      debug!(pending = pending.len(), "aborted before requesting");
      return Ok(());
    }

    let mut fingerprints: Vec<Fingerprint> = pending.keys().cloned().collect();
    fingerprints.sort();
    let request = self.provider.build_request(&self.endpoints, &fingerprints)?;

    info!("Requesting metadata information from {}...", self.provider.readable_name());
    let job = NetJob::start("Update metadata", Arc::clone(&self.transport), vec![request]);
    abort.attach(job.abort_handle());
    if abort.is_aborted() {
      abort.abort();
    }
    let result = job.wait().await;
    abort.detach();

    let body = result?.into_iter().next().unwrap_or_default();
    let entries = self.provider.parse_response(&body)?;

    for entry in entries {
      if abort.is_aborted() {
        return Ok(());
      }

      let Some(idx) = pending.remove(&entry.fingerprint) else {
        warn!(fingerprint = %entry.fingerprint, "no pending file for returned fingerprint, skipping");
        continue;
      };
      let local = &mut mods[idx];

      let version = match entry.version {
        Ok(version) => version,
        Err(e) => {
          warn!(name = %local.name, error = %e, "unreadable record for mod");
          outcomes.failed(local);
          continue;
        }
      };

      match self.persist(local, version) {
        Ok(()) => outcomes.ready(local),
        Err(e) => {
          warn!(name = %local.name, error = %e, "failed to persist metadata");
          outcomes.failed(local);
        }
      }
    }

    if abort.is_aborted() {
      return Ok(());
    }

    for idx in drain_sorted(pending) {
      debug!(name = %mods[idx].name, provider = %self.provider, "no match found");
      outcomes.failed(&mods[idx]);
    }
    Ok(())
  }

  /// Persist `version` under the local file name and attach the stored record.
  fn persist(&self, local: &mut LocalMod, mut version: IndexedVersion) -> Result<(), IndexError> {
    version.file_name = local.name.clone();

    let pack = IndexedPack {
      provider: self.provider,
      addon_id: version.addon_id.clone(),
      name: display_name(&local.name),
      slug: None,
    };

    self.store.write(&self.index_dir, &pack, &version)?;
    let metadata = self.store.read(&self.index_dir, &local.name)?;
    local.set_metadata(metadata);

    debug!(name = %local.name, addon_id = %version.addon_id, "attached metadata");
    Ok(())
  }
}

/// Remove every pending entry, returning slice indices in input order.
fn drain_sorted(pending: &mut PendingSet) -> Vec<usize> {
  let mut indices: Vec<usize> = pending.drain().map(|(_, idx)| idx).collect();
  indices.sort_unstable();
  indices
}

fn display_name(file_name: &str) -> String {
  Path::new(file_name)
    .file_stem()
    .map(|s| s.to_string_lossy().into_owned())
    .unwrap_or_else(|| file_name.to_string())
}
