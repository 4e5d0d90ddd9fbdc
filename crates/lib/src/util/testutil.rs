//! Test utilities for modmeta-lib.
//!
//! Provides an in-memory [`Transport`] with canned responses and helpers for
//! laying out a mods directory on disk.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use tokio::sync::Notify;

use crate::net::{ApiRequest, NetworkError, Transport};

enum Canned {
  Body(Vec<u8>),
  Status(u16),
}

/// A transport answering from a table keyed by URL path suffix.
#[derive(Default)]
pub struct MockTransport {
  responses: HashMap<String, Canned>,
  hang_calls: usize,
  calls: AtomicUsize,
  requests: Mutex<Vec<ApiRequest>>,
  started: Notify,
}

impl MockTransport {
  pub fn new() -> Self {
    Self::default()
  }

  /// Answer requests whose URL ends with `path` with `body`.
  pub fn respond(mut self, path: &str, body: impl Into<Vec<u8>>) -> Self {
    self.responses.insert(path.to_string(), Canned::Body(body.into()));
    self
  }

  /// Answer requests whose URL ends with `path` with an HTTP error status.
  pub fn fail(mut self, path: &str, status: u16) -> Self {
    self.responses.insert(path.to_string(), Canned::Status(status));
    self
  }

  /// Never answer any request.
  pub fn hanging(mut self) -> Self {
    self.hang_calls = usize::MAX;
    self
  }

  /// Never answer the first request; answer later ones from the table.
  pub fn hanging_once(mut self) -> Self {
    self.hang_calls = 1;
    self
  }

  pub fn call_count(&self) -> usize {
    self.calls.load(Ordering::SeqCst)
  }

  pub fn requests(&self) -> Vec<ApiRequest> {
    self.requests.lock().unwrap().clone()
  }

  /// Resolves once at least one request has been received.
  pub async fn wait_started(&self) {
    self.started.notified().await;
  }

  fn lookup(&self, url: &str) -> Result<Vec<u8>, NetworkError> {
    // Longest suffix wins so "/v1/mods/files" is not shadowed by "/v1/mods".
    let canned = self
      .responses
      .iter()
      .filter(|(path, _)| url.ends_with(path.as_str()))
      .max_by_key(|(path, _)| path.len())
      .map(|(_, canned)| canned);

    match canned {
      Some(Canned::Body(body)) => Ok(body.clone()),
      Some(Canned::Status(status)) => Err(NetworkError::Status {
        url: url.to_string(),
        status: *status,
        body: String::new(),
      }),
      None => Err(NetworkError::Status {
        url: url.to_string(),
        status: 404,
        body: "no canned response".to_string(),
      }),
    }
  }
}

impl Transport for MockTransport {
  async fn post_json(&self, request: &ApiRequest) -> Result<Vec<u8>, NetworkError> {
    let call = self.calls.fetch_add(1, Ordering::SeqCst);
    self.requests.lock().unwrap().push(request.clone());
    self.started.notify_one();

    if call < self.hang_calls {
      std::future::pending::<()>().await;
    }

    self.lookup(&request.url)
  }
}

/// Write a fake jar with `content` into `dir` and return its path.
pub fn write_jar(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
  let path = dir.join(name);
  std::fs::write(&path, content).unwrap();
  path
}
