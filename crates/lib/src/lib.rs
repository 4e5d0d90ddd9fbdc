//! modmeta-lib: mod metadata resolution
//!
//! This crate finds provider metadata for local Minecraft mod files:
//! - `fingerprint`: per-provider content fingerprints of local files
//! - `provider`: Modrinth and CurseForge lookup requests and response parsing
//! - `net`: batched, abortable request jobs
//! - `index`: packwiz-style metadata records on disk
//! - `ensure`: resolution runs tying the above together

pub mod config;
pub mod consts;
pub mod ensure;
pub mod fingerprint;
pub mod index;
pub mod mods;
pub mod net;
pub mod provider;
pub mod util;
