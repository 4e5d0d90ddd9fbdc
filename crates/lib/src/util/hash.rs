//! Hashing primitives used for provider fingerprints.
//!
//! This module provides:
//! - `HashAlgorithm`: the algorithms providers advertise for file hashes
//! - `hash_bytes()`: digest a buffer with a given algorithm, lowercase hex
//! - `murmur2()`: the 32-bit MurmurHash2 variant CurseForge fingerprints use
//! - `strip_whitespace()`: CurseForge's pre-hash canonicalization

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use thiserror::Error;

/// Hash algorithms known to the supported providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
  Sha512,
  Sha1,
  Md5,
  Murmur2,
}

impl HashAlgorithm {
  pub fn as_str(&self) -> &'static str {
    match self {
      HashAlgorithm::Sha512 => "sha512",
      HashAlgorithm::Sha1 => "sha1",
      HashAlgorithm::Md5 => "md5",
      HashAlgorithm::Murmur2 => "murmur2",
    }
  }
}

impl fmt::Display for HashAlgorithm {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for HashAlgorithm {
  type Err = HashError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "sha512" => Ok(HashAlgorithm::Sha512),
      "sha1" => Ok(HashAlgorithm::Sha1),
      "md5" => Ok(HashAlgorithm::Md5),
      "murmur2" => Ok(HashAlgorithm::Murmur2),
      other => Err(HashError::UnknownAlgorithm(other.to_string())),
    }
  }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HashError {
  #[error("unknown hash algorithm: {0}")]
  UnknownAlgorithm(String),

  /// The algorithm is only ever read from provider responses, never computed locally.
  #[error("computing {0} digests is not supported")]
  Unsupported(HashAlgorithm),
}

/// Hash arbitrary bytes with the given algorithm.
///
/// Digest algorithms are encoded as lowercase hex; `Murmur2` as a decimal string.
pub fn hash_bytes(algorithm: HashAlgorithm, data: &[u8]) -> Result<String, HashError> {
  match algorithm {
    HashAlgorithm::Sha512 => {
      let mut hasher = Sha512::new();
      hasher.update(data);
      Ok(hex::encode(hasher.finalize()))
    }
    HashAlgorithm::Murmur2 => Ok(murmur2(data, crate::consts::MURMUR2_SEED).to_string()),
    other => Err(HashError::Unsupported(other)),
  }
}

/// Remove tab, line feed, carriage return and space bytes.
pub fn strip_whitespace(data: &[u8]) -> Vec<u8> {
  data
    .iter()
    .copied()
    .filter(|b| !matches!(b, 9 | 10 | 13 | 32))
    .collect()
}

/// 32-bit MurmurHash2 (Austin Appleby), little-endian block reads.
pub fn murmur2(data: &[u8], seed: u32) -> u32 {
  const M: u32 = 0x5bd1_e995;
  const R: u32 = 24;

  let mut h: u32 = seed ^ (data.len() as u32);

  let mut chunks = data.chunks_exact(4);
  for chunk in &mut chunks {
    let mut k = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    k = k.wrapping_mul(M);
    k ^= k >> R;
    k = k.wrapping_mul(M);

    h = h.wrapping_mul(M);
    h ^= k;
  }

  let tail = chunks.remainder();
  if tail.len() >= 3 {
    h ^= (tail[2] as u32) << 16;
  }
  if tail.len() >= 2 {
    h ^= (tail[1] as u32) << 8;
  }
  if !tail.is_empty() {
    h ^= tail[0] as u32;
    h = h.wrapping_mul(M);
  }

  h ^= h >> 13;
  h = h.wrapping_mul(M);
  h ^= h >> 15;
  h
}
