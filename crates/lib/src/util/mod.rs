//! Shared utilities.
//!
//! Content hashing, plus test helpers for the rest of the crate.

pub mod hash;

#[cfg(test)]
pub mod testutil;
