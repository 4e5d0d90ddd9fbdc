//! Crate-wide constants.

/// Application name, used for config/cache directory names.
pub const APP_NAME: &str = "modmeta";

/// Prefix for environment variable overrides.
pub const ENV_PREFIX: &str = "MODMETA_";

/// Default Modrinth API base URL.
pub const MODRINTH_API_URL: &str = "https://api.modrinth.com";

/// Default CurseForge API base URL.
pub const CURSEFORGE_API_URL: &str = "https://api.curseforge.com";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Name of the metadata index directory inside a mods directory.
pub const INDEX_DIR_NAME: &str = ".index";

/// Suffix of packwiz metadata files.
pub const INDEX_FILE_SUFFIX: &str = ".pw.toml";

/// Seed CurseForge uses for its MurmurHash2 fingerprints.
pub const MURMUR2_SEED: u32 = 1;
