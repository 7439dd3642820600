use std::path::{Path, PathBuf};

use anyhow::{anyhow, Result};
use clap::{Arg, Command};
use stratum_core::{init_tracing, PackageRef, TransformConfig};
use stratum_cli::{load_config, Driver, LoweringSummary};

fn main() -> Result<()> {
    // Initialize logging
    init_tracing();

    let matches = Command::new("stratumc")
        .version(stratum_core::VERSION)
        .about("Lower serialized Stratum syntax trees to base-language source")
        .arg(
            Arg::new("input")
                .value_name("INPUT")
                .help("Syntax tree file (JSON) or a directory of them")
                .required(true)
                .index(1),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_name("PATH")
                .help("Output file, or output directory when INPUT is a directory"),
        )
        .arg(
            Arg::new("config")
                .long("config")
                .value_name("FILE")
                .help("Lowering configuration (JSON)"),
        )
        .arg(
            Arg::new("runtime")
                .long("runtime")
                .value_name("IMPORT_PATH")
                .help("Import path of the runtime helper package"),
        )
        .arg(
            Arg::new("max-iterations")
                .long("max-iterations")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .help("Iteration ceiling for fixed-point passes"),
        )
        .arg(
            Arg::new("no-const-check")
                .long("no-const-check")
                .help("Skip the const-mutation check")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("no-fallback-warnings")
                .long("no-fallback-warnings")
                .help("Do not warn when a generic built-in falls back to reflection")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("jobs")
                .short('j')
                .long("jobs")
                .value_name("N")
                .value_parser(clap::value_parser!(usize))
                .default_value("1")
                .help("Worker threads for directory input"),
        )
        .arg(
            Arg::new("report")
                .long("report")
                .help("Print the lowering summary as JSON")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let input = matches
        .get_one::<String>("input")
        .map(PathBuf::from)
        .ok_or_else(|| anyhow!("missing INPUT"))?;
    let output = matches.get_one::<String>("output").map(PathBuf::from);
    let jobs = matches.get_one::<usize>("jobs").copied().unwrap_or(1);

    let mut config = match matches.get_one::<String>("config") {
        Some(path) => load_config(Path::new(path))?,
        None => TransformConfig::default(),
    };
    if let Some(runtime) = matches.get_one::<String>("runtime") {
        config.runtime = PackageRef::new(runtime.as_str());
    }
    if let Some(limit) = matches.get_one::<usize>("max-iterations") {
        config.max_fixed_point_iterations = Some(*limit);
    }
    if matches.get_flag("no-const-check") {
        config.check_consts = false;
    }
    if matches.get_flag("no-fallback-warnings") {
        config.warn_reflective_fallback = false;
    }

    let driver = Driver::new(config).jobs(jobs);
    let summary = if input.is_dir() {
        let output = output.unwrap_or_else(|| PathBuf::from("lowered"));
        driver.lower_directory(&input, &output)?
    } else {
        let output = output
            .unwrap_or_else(|| driver.output_path_for(&input, Path::new(""), Path::new("")));
        driver.lower_file(&input, &output)?
    };

    if matches.get_flag("report") {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }
    print_failures(&summary);

    if !summary.success() {
        std::process::exit(1);
    }
    Ok(())
}

fn print_failures(summary: &LoweringSummary) {
    for failure in &summary.failures {
        eprintln!("{}: {}", failure.path.display(), failure.message);
        for diagnostic in &failure.diagnostics {
            eprintln!("  {diagnostic}");
        }
    }
    if summary.files_processed > 1 || !summary.success() {
        eprintln!(
            "{} of {} file(s) lowered, {} warning(s)",
            summary.files_lowered,
            summary.files_processed,
            summary.warning_count()
        );
    }
}
