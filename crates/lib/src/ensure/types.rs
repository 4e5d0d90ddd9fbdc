use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde::Serialize;
use thiserror::Error;

use crate::mods::LocalMod;
use crate::net::{JobAbortHandle, NetworkError};
use crate::provider::{ParseError, QueryError};

/// Terminal outcome for one input file.
#[derive(Debug, Clone)]
pub enum MetadataEvent {
  /// Metadata is attached to the carried mod.
  Ready(LocalMod),
  Failed(LocalMod),
}

impl MetadataEvent {
  pub fn local_mod(&self) -> &LocalMod {
    match self {
      MetadataEvent::Ready(m) | MetadataEvent::Failed(m) => m,
    }
  }
}

/// Failures that end a run for every file still pending.
#[derive(Debug, Error)]
pub enum RunError {
  #[error("failed to build metadata request: {0}")]
  Query(#[from] QueryError),

  #[error("metadata request failed: {0}")]
  Network(#[from] NetworkError),

  #[error("failed to parse metadata response: {0}")]
  Parse(#[from] ParseError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
  Succeeded,
  /// The run's own infrastructure failed. Carries a displayable reason.
  Failed(String),
  Aborted,
}

impl fmt::Display for RunStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      RunStatus::Succeeded => write!(f, "succeeded"),
      RunStatus::Failed(reason) => write!(f, "failed: {}", reason),
      RunStatus::Aborted => write!(f, "aborted"),
    }
  }
}

/// Summary of one run, by local file name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
  pub status: RunStatus,
  pub ready: Vec<String>,
  pub failed: Vec<String>,
  /// Files left without an outcome by an abort.
  pub indeterminate: Vec<String>,
}

impl Default for RunReport {
  fn default() -> Self {
    Self {
      status: RunStatus::Succeeded,
      ready: Vec::new(),
      failed: Vec::new(),
      indeterminate: Vec::new(),
    }
  }
}

impl RunReport {
  pub fn is_success(&self) -> bool {
    self.status == RunStatus::Succeeded
  }
}

#[derive(Debug, Default)]
struct AbortState {
  aborted: AtomicBool,
  job: Mutex<Option<JobAbortHandle>>,
}

/// Cancels one run from outside the task driving it.
///
/// Aborting is best-effort: files already decided keep their outcome, files
/// still pending get none and are reported as indeterminate. Mods that need no
/// lookup are still settled when the abort lands before the run starts.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
  inner: Arc<AbortState>,
}

impl AbortHandle {
  /// Mark the run aborted and cancel its in-flight request, if any.
  ///
  /// Returns whether a request was still running and got cancelled.
  pub fn abort(&self) -> bool {
    self.inner.aborted.store(true, Ordering::SeqCst);
    let job = self.inner.job.lock().unwrap_or_else(PoisonError::into_inner);
    match job.as_ref() {
      Some(handle) => handle.abort(),
      None => false,
    }
  }

  pub fn is_aborted(&self) -> bool {
    self.inner.aborted.load(Ordering::SeqCst)
  }

  pub(super) fn attach(&self, handle: JobAbortHandle) {
    let mut job = self.inner.job.lock().unwrap_or_else(PoisonError::into_inner);
    *job = Some(handle);
  }

  pub(super) fn detach(&self) {
    let mut job = self.inner.job.lock().unwrap_or_else(PoisonError::into_inner);
    *job = None;
  }
}
