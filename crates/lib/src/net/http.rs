//! reqwest-backed [`Transport`].

use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue};
use tracing::debug;

use super::{ApiRequest, NetworkError, Transport};
use crate::config::Config;

const CURSEFORGE_KEY_HEADER: &str = "x-api-key";

/// Sends provider requests over HTTP.
///
/// Requests addressed to the configured CurseForge API carry the
/// `x-api-key` header when a key is configured.
#[derive(Debug, Clone)]
pub struct HttpTransport {
  client: Client,
  curseforge_api: String,
  curseforge_key: Option<String>,
}

impl HttpTransport {
  pub fn new(config: &Config) -> Result<Self, NetworkError> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let client = Client::builder()
      .user_agent(config.user_agent.clone())
      .default_headers(headers)
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| NetworkError::Client(e.to_string()))?;

    Ok(Self {
      client,
      curseforge_api: config.endpoints().curseforge,
      curseforge_key: config.curseforge_key.clone(),
    })
  }
}

impl Transport for HttpTransport {
  async fn post_json(&self, request: &ApiRequest) -> Result<Vec<u8>, NetworkError> {
    debug!(url = %request.url, "POST");

    let mut builder = self.client.post(&request.url).json(&request.body);
    if request.url.starts_with(&self.curseforge_api) {
      if let Some(key) = &self.curseforge_key {
        builder = builder.header(CURSEFORGE_KEY_HEADER, key);
      }
    }

    let response = builder.send().await.map_err(|e| NetworkError::Request {
      url: request.url.clone(),
      message: e.to_string(),
    })?;

    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(NetworkError::Status {
        url: request.url.clone(),
        status: status.as_u16(),
        body,
      });
    }

    let bytes = response.bytes().await.map_err(|e| NetworkError::Request {
      url: request.url.clone(),
      message: e.to_string(),
    })?;

    debug!(url = %request.url, size = bytes.len(), "response received");
    Ok(bytes.to_vec())
  }
}
