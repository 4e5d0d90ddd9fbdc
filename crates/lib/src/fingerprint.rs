//! Platform-specific content fingerprints for local mod files.
//!
//! A fingerprint is the correlation key between a local file and the records
//! a provider returns for it. Modrinth keys by the file's sha512 digest
//! (lowercase hex); CurseForge by a seed-1 MurmurHash2 over the file with
//! whitespace bytes removed (decimal string).

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::provider::Provider;
use crate::util::hash::{self, HashError};

/// A provider-specific content identifier.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Fingerprint(pub String);

impl Fingerprint {
  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for Fingerprint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.0)
  }
}

impl From<&str> for Fingerprint {
  fn from(s: &str) -> Self {
    Fingerprint(s.to_string())
  }
}

#[derive(Debug, Error)]
pub enum FingerprintError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("nothing to fingerprint: input is empty after canonicalization")]
  Empty,

  #[error(transparent)]
  Hash(#[from] HashError),
}

/// Fingerprint a buffer for `provider`.
pub fn fingerprint_bytes(data: &[u8], provider: Provider) -> Result<Fingerprint, FingerprintError> {
  let algorithm = provider.fingerprint_algorithm();

  let digest = match provider {
    Provider::Modrinth => {
      // sha512 accepts empty input, but no published file is empty; treat it as unreadable.
      if data.is_empty() {
        return Err(FingerprintError::Empty);
      }
      hash::hash_bytes(algorithm, data)?
    }
    Provider::CurseForge => {
      let treated = hash::strip_whitespace(data);
      if treated.is_empty() {
        return Err(FingerprintError::Empty);
      }
      hash::hash_bytes(algorithm, &treated)?
    }
  };

  Ok(Fingerprint(digest))
}

/// Read `path` once and fingerprint its contents for `provider`.
pub fn fingerprint_file(path: &Path, provider: Provider) -> Result<Fingerprint, FingerprintError> {
  let data = fs::read(path).map_err(|source| FingerprintError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  fingerprint_bytes(&data, provider)
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn curseforge_ignores_whitespace_bytes() {
    let plain = fingerprint_bytes(b"PK\x03\x04modcontent", Provider::CurseForge).unwrap();
    let padded = fingerprint_bytes(b"PK \x03\t\x04mod\r\ncontent  \n", Provider::CurseForge).unwrap();
    assert_eq!(plain, padded);
  }

  #[test]
  fn curseforge_is_sensitive_to_content_bytes() {
    let a = fingerprint_bytes(b"PK\x03\x04modcontent", Provider::CurseForge).unwrap();
    let b = fingerprint_bytes(b"PK\x03\x04modcontenu", Provider::CurseForge).unwrap();
    assert_ne!(a, b);
  }

  #[test]
  fn curseforge_fingerprint_is_decimal_u32() {
    let fp = fingerprint_bytes(b"some jar", Provider::CurseForge).unwrap();
    assert!(fp.as_str().parse::<u32>().is_ok());
  }

  #[test]
  fn modrinth_is_whitespace_sensitive_hex() {
    let a = fingerprint_bytes(b"content", Provider::Modrinth).unwrap();
    let b = fingerprint_bytes(b"con tent", Provider::Modrinth).unwrap();
    assert_ne!(a, b);
    assert_eq!(a.as_str().len(), 128);
  }

  #[test]
  fn whitespace_only_input_is_empty_for_curseforge() {
    let result = fingerprint_bytes(b" \t\r\n", Provider::CurseForge);
    assert!(matches!(result, Err(FingerprintError::Empty)));
  }

  #[test]
  fn empty_input_is_rejected() {
    for provider in Provider::ALL {
      assert!(matches!(fingerprint_bytes(&[], provider), Err(FingerprintError::Empty)));
    }
  }

  #[test]
  fn file_and_bytes_agree() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("mod.jar");
    fs::write(&path, b"jar bytes").unwrap();

    for provider in Provider::ALL {
      assert_eq!(
        fingerprint_file(&path, provider).unwrap(),
        fingerprint_bytes(b"jar bytes", provider).unwrap()
      );
    }
  }

  #[test]
  fn missing_file_is_read_error() {
    let temp = TempDir::new().unwrap();
    let result = fingerprint_file(&temp.path().join("missing.jar"), Provider::Modrinth);
    assert!(matches!(result, Err(FingerprintError::Read { .. })));
  }
}
