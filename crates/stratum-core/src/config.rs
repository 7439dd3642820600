use serde::{Deserialize, Serialize};

/// An importable package: its path and the name code refers to it by.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageRef {
    pub path: String,
    pub name: String,
}

impl PackageRef {
    /// Package named after the last element of its path.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Self { path, name }
    }
}

/// Lowering configuration, threaded explicitly into every pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConfig {
    /// Runtime helper package (`rt`)
    pub runtime: PackageRef,
    /// Foreign-library helper package (`ffi`)
    pub ffi: PackageRef,
    /// Byte comparison package used for `str` comparisons
    pub compare: PackageRef,
    /// Override for the fixed-point iteration ceiling; by default the
    /// ceiling is derived from the deepest expression in the file
    pub max_fixed_point_iterations: Option<usize>,
    /// Emit a warning when a generic built-in falls back to reflection
    pub warn_reflective_fallback: bool,
    /// Run the const checker as part of the pipeline
    pub check_consts: bool,
}

impl Default for TransformConfig {
    fn default() -> Self {
        Self {
            runtime: PackageRef::new("github.com/stratum-lang/stratum/rt"),
            ffi: PackageRef::new("github.com/stratum-lang/stratum/rt/ffi"),
            compare: PackageRef::new("bytes"),
            max_fixed_point_iterations: None,
            warn_reflective_fallback: true,
            check_consts: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_names_follow_path() {
        let config = TransformConfig::default();
        assert_eq!(config.runtime.name, "rt");
        assert_eq!(config.ffi.name, "ffi");
        assert_eq!(config.compare.name, "bytes");
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: TransformConfig =
            serde_json::from_str(r#"{ "max_fixed_point_iterations": 4 }"#).unwrap();
        assert_eq!(config.max_fixed_point_iterations, Some(4));
        assert_eq!(config.runtime, TransformConfig::default().runtime);
        assert!(config.warn_reflective_fallback);
    }
}
