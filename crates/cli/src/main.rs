mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use modmeta_lib::provider::Provider;

use crate::output::OutputFormat;

/// modmeta - resolve provider metadata for local mod files
#[derive(Parser)]
#[command(name = "modmeta")]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging
  #[arg(short, long, global = true)]
  verbose: bool,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Make sure every mod in a directory has metadata from a provider
  Ensure {
    /// Directory containing the mod files
    mods_dir: PathBuf,

    /// Provider to resolve against
    #[arg(short, long, default_value = "modrinth")]
    provider: Provider,

    /// Metadata index directory (default: <MODS_DIR>/.index)
    #[arg(long)]
    index_dir: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Print a file's provider fingerprints
  Fingerprint {
    file: PathBuf,

    /// Only print the fingerprint for this provider
    #[arg(short, long)]
    provider: Option<Provider>,
  },

  /// Show which mods in a directory have metadata
  Status {
    mods_dir: PathBuf,

    /// Metadata index directory (default: <MODS_DIR>/.index)
    #[arg(long)]
    index_dir: Option<PathBuf>,

    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },

  /// Resolve the files listed in a CurseForge modpack manifest.json
  ResolvePack {
    manifest: PathBuf,

    #[arg(short, long, value_enum, default_value_t)]
    output: OutputFormat,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
  tracing_subscriber::fmt()
    .with_env_filter(filter)
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  match cli.command {
    Commands::Ensure {
      mods_dir,
      provider,
      index_dir,
      output,
    } => cmd::cmd_ensure(&mods_dir, provider, index_dir, output),
    Commands::Fingerprint { file, provider } => cmd::cmd_fingerprint(&file, provider),
    Commands::Status {
      mods_dir,
      index_dir,
      output,
    } => cmd::cmd_status(&mods_dir, index_dir, output),
    Commands::ResolvePack { manifest, output } => cmd::cmd_resolve_pack(&manifest, output),
  }
}
