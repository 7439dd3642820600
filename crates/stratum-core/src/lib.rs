//! # Stratum Core
//!
//! Lowering core of the Stratum compiler. Stratum is a dialect of a Go-like
//! base language; this crate rewrites a parsed Stratum file into a plain
//! base-language file that calls into a small runtime package:
//! - Syntax tree model, builder DSL and source printer (`ast`)
//! - Syntactic type tracking (`types`)
//! - The multi-pass rewrite engine and its lowering passes (`transform`)
//! - The const-mutation checker (`check`)
//! - The one-call `Pipeline` tying them together
//!
//! Parsing and type checking of the base language are not done here; the
//! input tree arrives already parsed, usually as JSON.

#![warn(clippy::all)]

pub mod ast;
pub mod check;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod imports;
pub mod pipeline;
pub mod runtime;
pub mod transform;
pub mod types;

// Re-export commonly used types
pub use ast::{File, ToSource};
pub use check::ConstChecker;
pub use config::{PackageRef, TransformConfig};
pub use diagnostics::{Diagnostic, DiagnosticKind, Severity};
pub use errors::{TransformError, TransformResult};
pub use imports::ImportSet;
pub use pipeline::{LoweredFile, LoweringReport, Pipeline};
pub use transform::{RewritePass, Transformer};
pub use types::{TypeDescriptor, TypeTracker};

/// Stratum core version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize tracing for Stratum components. Later calls are no-ops.
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::from_default_env();
    let filter = match "stratum_core=info".parse() {
        Ok(directive) => filter.add_directive(directive),
        Err(_) => filter,
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Error types for loading and lowering files
#[derive(thiserror::Error, Debug)]
pub enum StratumError {
    /// Lowering rejected the file
    #[error("Lowering error: {0}")]
    Transform(#[from] TransformError),

    /// The serialized tree could not be decoded
    #[error("Syntax tree error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for Stratum core operations
pub type Result<T> = std::result::Result<T, StratumError>;

/// Decode a syntax tree serialized as JSON.
pub fn load_file(json: &str) -> Result<File> {
    Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_and_lower_minimal_file() {
        let json = r#"{ "name": "empty.st", "package": { "name": "main" } }"#;
        let file = load_file(json).unwrap();
        assert_eq!(file.package.name, "main");
        let lowered = Pipeline::default().lower(file).unwrap();
        assert_eq!(lowered.source(), "package main\n");
    }

    #[test]
    fn test_bad_json_is_reported() {
        let err = load_file("{ not json").unwrap_err();
        assert!(matches!(err, StratumError::Json(_)));
    }

    #[test]
    fn test_init_tracing_twice() {
        init_tracing();
        init_tracing();
    }
}
