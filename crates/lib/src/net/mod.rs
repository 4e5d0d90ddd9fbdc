//! Network jobs against provider APIs.
//!
//! A [`NetJob`] runs a batch of JSON POST requests concurrently on a spawned
//! tokio task and reports one aggregate result. The task can be aborted from
//! any context through a [`JobAbortHandle`].
//!
//! Requests go through the [`Transport`] trait so the resolution engine can be
//! driven by [`HttpTransport`] in production and by canned responses in tests.

mod http;

use std::future::Future;
use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tokio::task::{AbortHandle, JoinHandle, JoinSet};
use tracing::{debug, warn};

pub use http::HttpTransport;

/// A JSON POST request against a provider API.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ApiRequest {
  pub url: String,
  pub body: serde_json::Value,
}

#[derive(Debug, Error)]
pub enum NetworkError {
  #[error("failed to build HTTP client: {0}")]
  Client(String),

  #[error("request to {url} failed: {message}")]
  Request { url: String, message: String },

  /// `body` is kept whole; the message only carries its first line, cut short.
  #[error("HTTP {status} from {url}{}", body_excerpt(.body))]
  Status { url: String, status: u16, body: String },

  #[error("network job was aborted")]
  Aborted,

  #[error("network job panicked: {0}")]
  Task(String),
}

const BODY_EXCERPT_CHARS: usize = 120;

fn body_excerpt(body: &str) -> String {
  let line = body.lines().map(str::trim).find(|l| !l.is_empty()).unwrap_or_default();
  if line.is_empty() {
    return String::new();
  }
  match line.char_indices().nth(BODY_EXCERPT_CHARS) {
    Some((cut, _)) => format!(": {}...", &line[..cut]),
    None => format!(": {line}"),
  }
}

/// Executes single requests. Implementations must be shareable across tasks.
pub trait Transport: Send + Sync + 'static {
  /// POST `request.body` as JSON to `request.url` and return the raw response body.
  fn post_json(&self, request: &ApiRequest) -> impl Future<Output = Result<Vec<u8>, NetworkError>> + Send;
}

/// A running batch of requests.
pub struct NetJob {
  name: String,
  task: JoinHandle<Result<Vec<Vec<u8>>, NetworkError>>,
}

impl NetJob {
  /// Spawn a job executing every request in parallel.
  ///
  /// Response bodies are returned in request order. The first failing request
  /// fails the whole job and cancels the ones still in flight.
  pub fn start<T: Transport>(name: &str, transport: Arc<T>, requests: Vec<ApiRequest>) -> Self {
    debug!(job = name, requests = requests.len(), "starting network job");
    let count = requests.len();

    let task = tokio::spawn(async move {
      let mut set = JoinSet::new();
      for (idx, request) in requests.into_iter().enumerate() {
        let transport = Arc::clone(&transport);
        set.spawn(async move { (idx, transport.post_json(&request).await) });
      }

      let mut bodies = vec![Vec::new(); count];
      while let Some(joined) = set.join_next().await {
        let (idx, result) = joined.map_err(|e| NetworkError::Task(e.to_string()))?;
        bodies[idx] = result?;
      }
      Ok(bodies)
    });

    Self {
      name: name.to_string(),
      task,
    }
  }

  pub fn name(&self) -> &str {
    &self.name
  }

  pub fn abort_handle(&self) -> JobAbortHandle {
    JobAbortHandle(self.task.abort_handle())
  }

  /// Wait for the job to finish.
  ///
  /// An aborted job resolves to [`NetworkError::Aborted`].
  pub async fn wait(self) -> Result<Vec<Vec<u8>>, NetworkError> {
    match self.task.await {
      Ok(result) => {
        if let Err(e) = &result {
          warn!(job = %self.name, error = %e, "network job failed");
        }
        result
      }
      Err(e) if e.is_cancelled() => Err(NetworkError::Aborted),
      Err(e) => Err(NetworkError::Task(e.to_string())),
    }
  }
}

/// Aborts a [`NetJob`] from outside the task awaiting it.
#[derive(Debug)]
pub struct JobAbortHandle(AbortHandle);

impl JobAbortHandle {
  /// Request cancellation. Returns `true` if the job was still running.
  pub fn abort(&self) -> bool {
    let running = !self.0.is_finished();
    self.0.abort();
    running
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::util::testutil::MockTransport;

  fn request(path: &str) -> ApiRequest {
    ApiRequest {
      url: format!("http://mock{path}"),
      body: serde_json::json!({}),
    }
  }

  #[tokio::test]
  async fn bodies_come_back_in_request_order() {
    let transport = Arc::new(
      MockTransport::new()
        .respond("/v1/mods", "mods")
        .respond("/v1/mods/files", "files"),
    );

    let job = NetJob::start(
      "test",
      Arc::clone(&transport),
      vec![request("/v1/mods"), request("/v1/mods/files")],
    );
    let bodies = job.wait().await.unwrap();

    assert_eq!(bodies, vec![b"mods".to_vec(), b"files".to_vec()]);
    assert_eq!(transport.call_count(), 2);
  }

  #[tokio::test]
  async fn one_failed_request_fails_the_job() {
    let transport = Arc::new(MockTransport::new().respond("/ok", "{}").fail("/broken", 500));

    let job = NetJob::start("test", transport, vec![request("/ok"), request("/broken")]);
    let result = job.wait().await;

    assert!(matches!(result, Err(NetworkError::Status { status: 500, .. })));
  }

  #[tokio::test]
  async fn abort_reports_running_job() {
    let transport = Arc::new(MockTransport::new().hanging());

    let job = NetJob::start("test", Arc::clone(&transport), vec![request("/slow")]);
    transport.wait_started().await;

    let handle = job.abort_handle();
    assert!(handle.abort());
    assert!(matches!(job.wait().await, Err(NetworkError::Aborted)));
  }

  #[tokio::test]
  async fn abort_after_completion_reports_not_running() {
    let transport = Arc::new(MockTransport::new().respond("/done", "{}"));

    let job = NetJob::start("test", transport, vec![request("/done")]);
    let handle = job.abort_handle();
    job.wait().await.unwrap();

    assert!(!handle.abort());
  }

  #[tokio::test]
  async fn empty_job_succeeds_with_no_bodies() {
    let transport = Arc::new(MockTransport::new());
    let job = NetJob::start("empty", transport, Vec::new());
    assert!(job.wait().await.unwrap().is_empty());
  }

  #[test]
  fn status_message_carries_only_a_short_excerpt() {
    let page = format!("\n<!DOCTYPE html>\n<html>{}</html>\n", "x".repeat(5000));
    let err = NetworkError::Status {
      url: "http://api.test/v2/version_files".to_string(),
      status: 502,
      body: page.clone(),
    };

    let message = err.to_string();
    assert!(message.starts_with("HTTP 502 from http://api.test/v2/version_files: <!DOCTYPE html>"));
    assert!(!message.contains("<html>"));
    assert!(message.len() < 250);
    assert!(matches!(err, NetworkError::Status { body, .. } if body == page));

    let long_line = NetworkError::Status {
      url: "u".to_string(),
      status: 500,
      body: "é".repeat(500),
    };
    assert!(long_line.to_string().ends_with("..."));

    let empty = NetworkError::Status {
      url: "u".to_string(),
      status: 500,
      body: String::new(),
    };
    assert_eq!(empty.to_string(), "HTTP 500 from u");
  }
}
