/*!
# Driver - file-based lowering

Reads serialized Stratum trees (JSON), lowers each through the core
`Pipeline` and writes the base-language source next to where the tree was
found, mirrored into the output directory. A file that fails to lower
produces no output; its diagnostics go into the summary instead.

Files are independent, so a directory is lowered by a small worker pool:
the paths go into one channel, every worker lowers what it takes off it and
sends the outcome back on another.
*/

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;

use anyhow::{anyhow, Context, Result};
use crossbeam_channel::unbounded;
use serde::Serialize;
use tracing::{debug, info, warn};

use stratum_core::{load_file, Diagnostic, LoweringReport, Pipeline, StratumError, TransformConfig};

/// File-based lowering driver
pub struct Driver {
    pipeline: Pipeline,
    input_extension: String,
    output_extension: String,
    preserve_structure: bool,
    jobs: usize,
}

impl Driver {
    pub fn new(config: TransformConfig) -> Self {
        Self {
            pipeline: Pipeline::new(config),
            input_extension: "json".to_string(),
            output_extension: "go".to_string(),
            preserve_structure: true,
            jobs: 1,
        }
    }

    /// Extension of the serialized trees to pick up in a directory
    pub fn input_extension(mut self, extension: impl Into<String>) -> Self {
        self.input_extension = extension.into();
        self
    }

    /// Extension given to lowered files
    pub fn output_extension(mut self, extension: impl Into<String>) -> Self {
        self.output_extension = extension.into();
        self
    }

    /// Whether to mirror the input directory layout in the output
    pub fn preserve_structure(mut self, preserve: bool) -> Self {
        self.preserve_structure = preserve;
        self
    }

    /// Number of worker threads used for directories
    pub fn jobs(mut self, jobs: usize) -> Self {
        self.jobs = jobs.max(1);
        self
    }

    /// Where the lowered form of `source` goes. `main.st.json` becomes
    /// `main.go`.
    pub fn output_path_for(&self, source: &Path, source_root: &Path, output_dir: &Path) -> PathBuf {
        let relative = if self.preserve_structure {
            source.strip_prefix(source_root).unwrap_or(source).to_path_buf()
        } else {
            source.file_name().map(PathBuf::from).unwrap_or_default()
        };
        let stem = relative.with_extension("");
        let stem = match stem.extension() {
            Some(ext) if ext == "st" => stem.with_extension(""),
            _ => stem,
        };
        output_dir.join(stem).with_extension(&self.output_extension)
    }

    /// Lower a single tree file. Lowering failures are reported in the
    /// summary; I/O failures are returned as errors.
    pub fn lower_file<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_file: P,
        output_file: Q,
    ) -> Result<LoweringSummary> {
        let source_path = source_file.as_ref();
        let output_path = output_file.as_ref();
        let mut summary = LoweringSummary::new();

        match self.lower_one(source_path, output_path) {
            Ok(report) => summary.record_success(report),
            Err(StratumError::Transform(err)) => {
                summary.record_failure(source_path, err.to_string(), err.diagnostics())
            }
            Err(StratumError::Json(err)) => summary.record_failure(source_path, err.to_string(), Vec::new()),
            Err(StratumError::Io(err)) => {
                return Err(err).with_context(|| format!("lowering {}", source_path.display()));
            }
        }
        Ok(summary)
    }

    /// Lower every tree file under `source_dir` into `output_dir`.
    pub fn lower_directory<P: AsRef<Path>, Q: AsRef<Path>>(
        &self,
        source_dir: P,
        output_dir: Q,
    ) -> Result<LoweringSummary> {
        let source_root = source_dir.as_ref();
        let output_root = output_dir.as_ref();

        if !source_root.is_dir() {
            return Err(anyhow!("Source directory does not exist: {}", source_root.display()));
        }
        fs::create_dir_all(output_root)?;

        let mut sources = Vec::new();
        self.collect_sources(source_root, &mut sources)?;
        sources.sort();
        info!(files = sources.len(), jobs = self.jobs, "lowering directory");

        let (task_tx, task_rx) = unbounded::<(PathBuf, PathBuf)>();
        let (result_tx, result_rx) = unbounded::<Result<LoweringSummary>>();
        for source in sources {
            let output = self.output_path_for(&source, source_root, output_root);
            // the receiver outlives this loop
            let _ = task_tx.send((source, output));
        }
        drop(task_tx);

        thread::scope(|scope| {
            for worker in 0..self.jobs {
                let task_rx = task_rx.clone();
                let result_tx = result_tx.clone();
                scope.spawn(move || {
                    for (source, output) in task_rx.iter() {
                        debug!(worker, file = %source.display(), "lowering");
                        if result_tx.send(self.lower_file(&source, &output)).is_err() {
                            break;
                        }
                    }
                });
            }
        });
        drop(result_tx);

        let mut summary = LoweringSummary::new();
        for result in result_rx.iter() {
            summary.merge(result?);
        }
        summary.sort();
        Ok(summary)
    }

    fn lower_one(&self, source_path: &Path, output_path: &Path) -> stratum_core::Result<LoweringReport> {
        let json = fs::read_to_string(source_path)?;
        let mut file = load_file(&json)?;
        if file.name.is_empty() {
            file.name = source_path.display().to_string();
        }

        let lowered = self.pipeline.lower(file)?;
        for warning in &lowered.report.warnings {
            warn!(file = %source_path.display(), "{warning}");
        }

        if let Some(parent) = output_path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(output_path, lowered.source())?;
        Ok(lowered.report)
    }

    fn collect_sources(&self, dir: &Path, sources: &mut Vec<PathBuf>) -> Result<()> {
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                self.collect_sources(&path, sources)?;
            } else if self.should_process_file(&path) {
                sources.push(path);
            }
        }
        Ok(())
    }

    fn should_process_file(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().eq_ignore_ascii_case(&self.input_extension))
            .unwrap_or(false)
    }
}

impl Default for Driver {
    fn default() -> Self {
        Self::new(TransformConfig::default())
    }
}

/// A file the pipeline refused
#[derive(Debug, Clone, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub message: String,
    pub diagnostics: Vec<Diagnostic>,
}

/// Summary of a lowering run
#[derive(Debug, Default, Serialize)]
pub struct LoweringSummary {
    pub files_processed: u64,
    pub files_lowered: u64,
    pub imports_added: u64,
    pub reports: Vec<LoweringReport>,
    pub failures: Vec<FileFailure>,
}

impl LoweringSummary {
    pub fn new() -> Self {
        Self::default()
    }

    fn record_success(&mut self, report: LoweringReport) {
        self.files_processed += 1;
        self.files_lowered += 1;
        self.imports_added += report.imports_added as u64;
        self.reports.push(report);
    }

    fn record_failure(&mut self, path: &Path, message: String, diagnostics: Vec<Diagnostic>) {
        self.files_processed += 1;
        self.failures.push(FileFailure {
            path: path.to_path_buf(),
            message,
            diagnostics,
        });
    }

    pub fn merge(&mut self, other: LoweringSummary) {
        self.files_processed += other.files_processed;
        self.files_lowered += other.files_lowered;
        self.imports_added += other.imports_added;
        self.reports.extend(other.reports);
        self.failures.extend(other.failures);
    }

    /// Workers finish in any order; keep output stable.
    fn sort(&mut self) {
        self.reports.sort_by(|a, b| a.file.cmp(&b.file));
        self.failures.sort_by(|a, b| a.path.cmp(&b.path));
    }

    pub fn warning_count(&self) -> usize {
        self.reports.iter().map(|report| report.warnings.len()).sum()
    }

    pub fn success(&self) -> bool {
        self.failures.is_empty()
    }
}
