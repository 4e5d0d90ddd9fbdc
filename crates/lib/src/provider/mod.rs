//! Remote mod distribution providers.
//!
//! Each provider has a read-only capability entry (names, preferred hash
//! algorithms) and a query builder that knows how to turn a set of
//! fingerprints into one batched API request and how to read the response.
//!
//! # Modules
//!
//! - [`modrinth`] - hash-keyed `version_files` lookups
//! - [`curseforge`] - murmur2 `fingerprints` matching and manifest file resolution

pub mod curseforge;
pub mod modrinth;
mod types;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::config::ApiEndpoints;
use crate::fingerprint::Fingerprint;
use crate::net::ApiRequest;
use crate::util::hash::HashAlgorithm;

pub use types::*;

/// A supported remote platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
  Modrinth,
  CurseForge,
}

/// Static description of what a provider supports.
#[derive(Debug)]
pub struct ProviderCapabilities {
  /// Machine name, used in config, CLI arguments and index files.
  pub name: &'static str,
  /// Human readable name for log and status lines.
  pub readable_name: &'static str,
  /// Hash algorithms in order of preference. The first one keys fingerprint lookups.
  pub hash_types: &'static [HashAlgorithm],
}

static MODRINTH_CAPS: ProviderCapabilities = ProviderCapabilities {
  name: "modrinth",
  readable_name: "Modrinth",
  hash_types: &[HashAlgorithm::Sha512, HashAlgorithm::Sha1],
};

static CURSEFORGE_CAPS: ProviderCapabilities = ProviderCapabilities {
  name: "curseforge",
  readable_name: "CurseForge",
  hash_types: &[HashAlgorithm::Murmur2, HashAlgorithm::Sha1, HashAlgorithm::Md5],
};

impl Provider {
  pub const ALL: [Provider; 2] = [Provider::Modrinth, Provider::CurseForge];

  pub fn capabilities(&self) -> &'static ProviderCapabilities {
    match self {
      Provider::Modrinth => &MODRINTH_CAPS,
      Provider::CurseForge => &CURSEFORGE_CAPS,
    }
  }

  pub fn name(&self) -> &'static str {
    self.capabilities().name
  }

  pub fn readable_name(&self) -> &'static str {
    self.capabilities().readable_name
  }

  /// The algorithm used to compute lookup fingerprints.
  pub fn fingerprint_algorithm(&self) -> HashAlgorithm {
    self.capabilities().hash_types[0]
  }

  /// Build the batched lookup request for `fingerprints`.
  pub fn build_request(&self, endpoints: &ApiEndpoints, fingerprints: &[Fingerprint]) -> Result<ApiRequest, QueryError> {
    match self {
      Provider::Modrinth => modrinth::build_request(endpoints, fingerprints),
      Provider::CurseForge => curseforge::build_request(endpoints, fingerprints),
    }
  }

  /// Parse a raw lookup response into per-fingerprint entries.
  pub fn parse_response(&self, body: &[u8]) -> Result<Vec<MatchEntry>, ParseError> {
    match self {
      Provider::Modrinth => modrinth::parse_response(body),
      Provider::CurseForge => curseforge::parse_response(body),
    }
  }
}

impl fmt::Display for Provider {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for Provider {
  type Err = UnknownProvider;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Provider::ALL
      .into_iter()
      .find(|p| p.name().eq_ignore_ascii_case(s))
      .ok_or_else(|| UnknownProvider(s.to_string()))
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn capability_table_prefers_matching_algorithms() {
    assert_eq!(Provider::Modrinth.fingerprint_algorithm(), HashAlgorithm::Sha512);
    assert_eq!(Provider::CurseForge.fingerprint_algorithm(), HashAlgorithm::Murmur2);
  }

  #[test]
  fn provider_parses_case_insensitively() {
    assert_eq!("modrinth".parse::<Provider>().unwrap(), Provider::Modrinth);
    assert_eq!("CurseForge".parse::<Provider>().unwrap(), Provider::CurseForge);
    assert!("ftb".parse::<Provider>().is_err());
  }

  #[test]
  fn provider_display_is_machine_name() {
    for provider in Provider::ALL {
      assert_eq!(provider.to_string().parse::<Provider>().unwrap(), provider);
    }
  }

  #[test]
  fn provider_serializes_as_machine_name() {
    assert_eq!(serde_json::to_string(&Provider::CurseForge).unwrap(), "\"curseforge\"");
    assert_eq!(
      serde_json::from_str::<Provider>("\"modrinth\"").unwrap(),
      Provider::Modrinth
    );
  }
}
