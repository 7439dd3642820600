//! Stratum CLI - file-based driver for the Stratum lowering core
//!
//! Reads serialized syntax trees, lowers them and writes base-language
//! source, one pipeline per worker thread.

pub mod driver;

pub use driver::{Driver, FileFailure, LoweringSummary};

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use stratum_core::TransformConfig;

/// Read a `TransformConfig` from a JSON file. Missing fields keep their
/// defaults.
pub fn load_config(path: &Path) -> Result<TransformConfig> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    serde_json::from_str(&json).with_context(|| format!("parsing config {}", path.display()))
}
