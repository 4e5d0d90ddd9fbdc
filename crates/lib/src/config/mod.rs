//! Runtime configuration.
//!
//! Settings come from three layers, later ones winning:
//! 1. built-in defaults
//! 2. `{config_dir}/config.toml`, if present
//! 3. `MODMETA_*` environment variables
//!
//! ```toml
//! modrinth_api = "https://api.modrinth.com"
//! curseforge_api = "https://api.curseforge.com"
//! curseforge_key = "..."
//! timeout_secs = 30
//! ```

pub mod paths;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::consts::{CURSEFORGE_API_URL, DEFAULT_TIMEOUT_SECS, ENV_PREFIX, MODRINTH_API_URL};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config file {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to parse config file {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("invalid value for {var}: {value}")]
  InvalidEnv { var: String, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  pub modrinth_api: String,
  pub curseforge_api: String,
  /// CurseForge requires an API key on every request.
  pub curseforge_key: Option<String>,
  pub timeout_secs: u64,
  pub user_agent: String,
}

impl Default for Config {
  fn default() -> Self {
    Self {
      modrinth_api: MODRINTH_API_URL.to_string(),
      curseforge_api: CURSEFORGE_API_URL.to_string(),
      curseforge_key: None,
      timeout_secs: DEFAULT_TIMEOUT_SECS,
      user_agent: format!("modmeta/{}", env!("CARGO_PKG_VERSION")),
    }
  }
}

/// Base URLs of the provider APIs, without trailing slashes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
  pub modrinth: String,
  pub curseforge: String,
}

impl ApiEndpoints {
  pub fn new(modrinth: &str, curseforge: &str) -> Self {
    Self {
      modrinth: modrinth.trim_end_matches('/').to_string(),
      curseforge: curseforge.trim_end_matches('/').to_string(),
    }
  }
}

impl Default for ApiEndpoints {
  fn default() -> Self {
    Self::new(MODRINTH_API_URL, CURSEFORGE_API_URL)
  }
}

impl Config {
  /// Load from the default config file location, then apply env overrides.
  pub fn load() -> Result<Self, ConfigError> {
    let mut config = match paths::config_file() {
      Some(path) => Self::from_file(&path)?,
      None => Self::default(),
    };
    config.apply_env()?;
    Ok(config)
  }

  /// Read a config file. A missing file yields the defaults.
  pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
    let content = match fs::read_to_string(path) {
      Ok(content) => content,
      Err(e) if e.kind() == io::ErrorKind::NotFound => {
        debug!(path = %path.display(), "no config file, using defaults");
        return Ok(Self::default());
      }
      Err(source) => {
        return Err(ConfigError::Read {
          path: path.to_path_buf(),
          source,
        });
      }
    };

    toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })
  }

  /// Override fields from `MODMETA_*` environment variables.
  pub fn apply_env(&mut self) -> Result<(), ConfigError> {
    if let Some(url) = env_var("MODRINTH_API") {
      self.modrinth_api = url;
    }
    if let Some(url) = env_var("CURSEFORGE_API") {
      self.curseforge_api = url;
    }
    if let Some(key) = env_var("CURSEFORGE_KEY") {
      self.curseforge_key = Some(key);
    }
    if let Some(raw) = env_var("TIMEOUT_SECS") {
      self.timeout_secs = raw.parse().map_err(|_| ConfigError::InvalidEnv {
        var: format!("{ENV_PREFIX}TIMEOUT_SECS"),
        value: raw,
      })?;
    }
    Ok(())
  }

  pub fn endpoints(&self) -> ApiEndpoints {
    ApiEndpoints::new(&self.modrinth_api, &self.curseforge_api)
  }
}

fn env_var(suffix: &str) -> Option<String> {
  std::env::var(format!("{ENV_PREFIX}{suffix}"))
    .ok()
    .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;
  use tempfile::TempDir;

  const ENV_VARS: [&str; 4] = [
    "MODMETA_MODRINTH_API",
    "MODMETA_CURSEFORGE_API",
    "MODMETA_CURSEFORGE_KEY",
    "MODMETA_TIMEOUT_SECS",
  ];

  fn cleared_env() -> Vec<(&'static str, Option<&'static str>)> {
    ENV_VARS.iter().map(|v| (*v, None)).collect()
  }

  #[test]
  fn missing_file_yields_defaults() {
    let temp = TempDir::new().unwrap();
    let config = Config::from_file(&temp.path().join("config.toml")).unwrap();
    assert_eq!(config, Config::default());
  }

  #[test]
  fn partial_file_keeps_other_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "curseforge_key = \"secret\"\ntimeout_secs = 5\n").unwrap();

    let config = Config::from_file(&path).unwrap();
    assert_eq!(config.curseforge_key.as_deref(), Some("secret"));
    assert_eq!(config.timeout_secs, 5);
    assert_eq!(config.modrinth_api, MODRINTH_API_URL);
  }

  #[test]
  fn invalid_file_is_parse_error() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("config.toml");
    fs::write(&path, "timeout_secs = \"soon\"").unwrap();

    assert!(matches!(Config::from_file(&path), Err(ConfigError::Parse { .. })));
  }

  #[test]
  #[serial]
  fn env_overrides_file_values() {
    let mut vars = cleared_env();
    vars[0] = ("MODMETA_MODRINTH_API", Some("http://localhost:9000/"));
    vars[3] = ("MODMETA_TIMEOUT_SECS", Some("7"));

    temp_env::with_vars(vars, || {
      let mut config = Config::default();
      config.apply_env().unwrap();
      assert_eq!(config.timeout_secs, 7);
      assert_eq!(config.endpoints().modrinth, "http://localhost:9000");
      assert_eq!(config.endpoints().curseforge, CURSEFORGE_API_URL);
    });
  }

  #[test]
  #[serial]
  fn invalid_timeout_env_is_rejected() {
    let mut vars = cleared_env();
    vars[3] = ("MODMETA_TIMEOUT_SECS", Some("never"));

    temp_env::with_vars(vars, || {
      let mut config = Config::default();
      assert!(matches!(config.apply_env(), Err(ConfigError::InvalidEnv { .. })));
    });
  }

  #[test]
  #[serial]
  #[cfg(not(windows))]
  fn load_reads_xdg_config_file() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join(crate::consts::APP_NAME);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join("config.toml"), "curseforge_key = \"from-file\"\n").unwrap();

    let mut vars: Vec<(&str, Option<&str>)> = cleared_env();
    let config_home = temp.path().to_string_lossy().to_string();
    vars.push(("XDG_CONFIG_HOME", Some(config_home.as_str())));

    temp_env::with_vars(vars, || {
      let config = Config::load().unwrap();
      assert_eq!(config.curseforge_key.as_deref(), Some("from-file"));
    });
  }
}
