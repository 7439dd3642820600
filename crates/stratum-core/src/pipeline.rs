/*!
# Lowering Pipeline

One call lowers one file: the const checker runs on the untouched tree, the
lowering passes run in order, and the imports they asked for are spliced in.
Every piece of per-file state (type tracker, import set, checker) is created
fresh, so a `Pipeline` can be shared between threads and reused across
files.
*/

use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info};

use crate::ast::{File, ToSource};
use crate::check::ConstChecker;
use crate::config::TransformConfig;
use crate::diagnostics::Diagnostic;
use crate::errors::TransformResult;
use crate::imports::ImportSet;
use crate::transform::{PassStats, Transformer};

/// A successfully lowered file and what happened on the way.
#[derive(Debug, Clone)]
pub struct LoweredFile {
    pub file: File,
    pub report: LoweringReport,
}

impl LoweredFile {
    /// The lowered file as base-language source.
    pub fn source(&self) -> String {
        self.file.to_source()
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct LoweringReport {
    pub file: String,
    pub imports_added: usize,
    /// Non-fatal diagnostics.
    pub warnings: Vec<Diagnostic>,
    pub passes: Vec<PassSummary>,
    pub total_time_us: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct PassSummary {
    pub name: String,
    pub traversals: u64,
    pub rewrites: u64,
}

impl From<&PassStats> for PassSummary {
    fn from(stats: &PassStats) -> Self {
        Self {
            name: stats.pass_name.clone(),
            traversals: stats.traversals,
            rewrites: stats.rewrites,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    config: TransformConfig,
}

impl Pipeline {
    pub fn new(config: TransformConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TransformConfig {
        &self.config
    }

    /// Lower `file`. On error the partially lowered tree is dropped; nothing
    /// of a failed file is ever emitted.
    pub fn lower(&self, mut file: File) -> TransformResult<LoweredFile> {
        let start_time = Instant::now();

        if self.config.check_consts {
            ConstChecker::run(&file)?;
        }

        let mut imports = ImportSet::new();
        let mut warnings = Vec::new();
        let mut transformer = Transformer::with_default_passes(&self.config);
        transformer.run(&mut file, &mut imports, &mut warnings)?;
        let imports_added = imports.splice(&mut file);

        let passes = transformer.stats().values().map(PassSummary::from).collect();
        let total_time_us = start_time.elapsed().as_micros() as u64;
        debug!(file = %file.name, imports_added, warnings = warnings.len(), "lowering report");
        info!(file = %file.name, time_us = total_time_us, "file lowered");

        let report = LoweringReport {
            file: file.name.clone(),
            imports_added,
            warnings,
            passes,
            total_time_us,
        };
        Ok(LoweredFile { file, report })
    }
}
