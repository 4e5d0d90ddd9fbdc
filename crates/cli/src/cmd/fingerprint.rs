//! Implementation of the `modmeta fingerprint` command.

use std::path::Path;

use anyhow::{Context, Result};

use modmeta_lib::fingerprint::fingerprint_file;
use modmeta_lib::provider::Provider;

use crate::output::print_stat;

/// Print the fingerprint of `file` for one provider, or for all of them.
pub fn cmd_fingerprint(file: &Path, provider: Option<Provider>) -> Result<()> {
  let providers: Vec<Provider> = match provider {
    Some(p) => vec![p],
    None => Provider::ALL.to_vec(),
  };

  for provider in providers {
    let fingerprint = fingerprint_file(file, provider)
      .with_context(|| format!("Failed to fingerprint {} for {}", file.display(), provider.readable_name()))?;
    print_stat(provider.name(), fingerprint.as_str());
  }

  Ok(())
}
