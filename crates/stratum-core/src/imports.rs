//! Per-file set of imports requested by the lowering passes.

use std::collections::BTreeSet;

use tracing::debug;

use crate::ast::{File, ImportDecl, ImportSpec, Pos};

/// Paths the lowered file needs. Insertion is idempotent and iteration is
/// sorted, so identical input always yields an identical import block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportSet {
    paths: BTreeSet<String>,
}

impl ImportSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` the first time `path` is required.
    pub fn require(&mut self, path: &str) -> bool {
        if self.paths.contains(path) {
            return false;
        }
        self.paths.insert(path.to_string())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.paths.contains(path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.paths.iter().map(String::as_str)
    }

    /// Append one grouped import declaration holding every required path the
    /// file does not already import. Returns the number of paths added.
    pub fn splice(self, file: &mut File) -> usize {
        let existing: BTreeSet<&str> = file.import_paths().collect();
        let specs: Vec<ImportSpec> = self
            .paths
            .iter()
            .filter(|path| !existing.contains(path.as_str()))
            .map(|path| ImportSpec {
                alias: None,
                path: path.clone(),
                pos: Pos::default(),
            })
            .collect();

        let added = specs.len();
        if added > 0 {
            debug!(file = %file.name, added, "splicing imports");
            file.imports.push(ImportDecl {
                specs,
                grouped: true,
                pos: Pos::default(),
            });
        }
        added
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_is_idempotent() {
        let mut imports = ImportSet::new();
        assert!(imports.require("bytes"));
        assert!(!imports.require("bytes"));
        assert_eq!(imports.len(), 1);
    }

    #[test]
    fn test_splice_skips_existing_and_sorts() {
        let mut file = File::new("main.st", "main");
        file.imports.push(ImportDecl {
            specs: vec![ImportSpec {
                alias: None,
                path: "bytes".into(),
                pos: Pos::new(3, 8),
            }],
            grouped: false,
            pos: Pos::new(3, 1),
        });

        let mut imports = ImportSet::new();
        imports.require("github.com/stratum-lang/stratum/rt");
        imports.require("bytes");
        imports.require("github.com/stratum-lang/stratum/rt/ffi");

        assert_eq!(imports.splice(&mut file), 2);
        assert_eq!(file.imports.len(), 2);
        let spliced: Vec<&str> = file.imports[1].specs.iter().map(|s| s.path.as_str()).collect();
        assert_eq!(
            spliced,
            vec![
                "github.com/stratum-lang/stratum/rt",
                "github.com/stratum-lang/stratum/rt/ffi"
            ]
        );
    }

    #[test]
    fn test_empty_splice_leaves_file_alone() {
        let mut file = File::new("main.st", "main");
        assert_eq!(ImportSet::new().splice(&mut file), 0);
        assert!(file.imports.is_empty());
    }
}
