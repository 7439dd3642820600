/*!
# Driver Integration Tests

Serialized trees on disk, lowered into a temporary output directory.
*/

use std::fs;
use std::path::Path;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use stratum_cli::{load_config, Driver};
use stratum_core::ast::build::*;
use stratum_core::ast::{Decl, File, Pos};
use stratum_core::{DiagnosticKind, TransformConfig};

fn write_tree(dir: &Path, relative: &str, file: &File) -> anyhow::Result<()> {
    let path = dir.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, serde_json::to_string(file)?)?;
    Ok(())
}

fn greeting() -> File {
    main_file(vec![define("s", concat(string("a"), string("b")))])
}

fn const_violation() -> File {
    file(vec![
        Decl::Gen(constant("Limit", int(10), Pos::new(3, 7))),
        func("main", vec![], vec![], vec![assign(id("Limit").at(5, 2), int(20))]),
    ])
}

#[test]
fn test_single_file() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    write_tree(temp.path(), "main.st.json", &greeting())?;

    let output = temp.path().join("main.go");
    let summary = Driver::default().lower_file(temp.path().join("main.st.json"), &output)?;
    assert!(summary.success());
    assert_eq!(summary.files_lowered, 1);
    assert_eq!(summary.imports_added, 1);

    let source = fs::read_to_string(output)?;
    assert!(source.contains("s := rt.StrConcat(&rt.Str{0x61}, &rt.Str{0x62})"));
    Ok(())
}

#[test]
fn test_directory_with_workers() -> anyhow::Result<()> {
    let source = TempDir::new()?;
    let output = TempDir::new()?;
    for i in 0..6 {
        write_tree(source.path(), &format!("pkg{}/file{i}.st.json", i % 2), &greeting())?;
    }
    write_tree(source.path(), "bad.st.json", &const_violation())?;
    fs::write(source.path().join("notes.txt"), "not a tree")?;

    let summary = Driver::default().jobs(3).lower_directory(source.path(), output.path())?;
    assert_eq!(summary.files_processed, 7);
    assert_eq!(summary.files_lowered, 6);
    assert_eq!(summary.failures.len(), 1);

    let failure = &summary.failures[0];
    assert!(failure.path.ends_with("bad.st.json"));
    assert_eq!(failure.diagnostics.len(), 1);
    assert_eq!(failure.diagnostics[0].kind, DiagnosticKind::ConstMutation);
    assert_eq!(failure.diagnostics[0].related, Some(Pos::new(3, 7)));

    assert!(output.path().join("pkg0/file0.go").exists());
    assert!(output.path().join("pkg1/file5.go").exists());
    assert!(!output.path().join("bad.go").exists());
    Ok(())
}

#[test]
fn test_bad_json_is_a_failure_not_an_error() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    fs::write(temp.path().join("broken.json"), "{ \"package\": ")?;
    let summary = Driver::default().lower_directory(temp.path(), temp.path().join("out"))?;
    assert_eq!(summary.failures.len(), 1);
    assert!(!summary.success());
    Ok(())
}

#[test]
fn test_config_file() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let path = temp.path().join("stratum.json");
    fs::write(&path, r#"{ "check_consts": false, "max_fixed_point_iterations": 12 }"#)?;
    let config = load_config(&path)?;
    assert!(!config.check_consts);
    assert_eq!(config.max_fixed_point_iterations, Some(12));
    assert_eq!(config.runtime, TransformConfig::default().runtime);

    write_tree(temp.path(), "src/bad.st.json", &const_violation())?;
    let summary = Driver::new(config).lower_directory(temp.path().join("src"), temp.path().join("out"))?;
    assert!(summary.success());
    Ok(())
}

#[test]
fn test_missing_directory() {
    let result = Driver::default().lower_directory("/definitely/not/here", "/tmp/out");
    assert!(result.is_err());
}
