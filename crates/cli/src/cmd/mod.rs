mod ensure;
mod fingerprint;
mod resolve_pack;
mod status;

use std::path::{Path, PathBuf};

use modmeta_lib::consts::INDEX_DIR_NAME;

pub use ensure::cmd_ensure;
pub use fingerprint::cmd_fingerprint;
pub use resolve_pack::cmd_resolve_pack;
pub use status::cmd_status;

/// The index directory to use for `mods_dir`.
fn index_dir_for(mods_dir: &Path, index_dir: Option<PathBuf>) -> PathBuf {
  index_dir.unwrap_or_else(|| mods_dir.join(INDEX_DIR_NAME))
}
