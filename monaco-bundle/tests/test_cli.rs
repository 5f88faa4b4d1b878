// Allow deprecated APIs (assert_cmd::cargo_bin is deprecated but still works)
#![allow(deprecated)]

use assert_cmd::prelude::*; // Add methods on commands
use predicates::prelude::*; // Used for writing assertions
use rstest::rstest;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::TempDir;

fn write(path: &Path, content: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, content).unwrap();
}

fn monaco_package(version: &str) -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("monaco-editor");
    write(
        &root.join("package.json"),
        &format!(r#"{{"name": "monaco-editor", "version": "{version}"}}"#),
    );
    let vs = root.join("esm").join("vs");
    write(
        &vs.join("editor/editor.main.js"),
        "import * as nls from '../nls.js';\nexport const label = nls.localize('a', 'A');\n",
    );
    write(&vs.join("editor/editor.worker.js"), "export {};\n");
    dir
}

fn read_manifest(dir: &Path) -> serde_json::Value {
    let text = fs::read_to_string(dir.join("manifest.json")).unwrap();
    serde_json::from_str(&text).unwrap()
}

#[rstest]
#[case("0.52.2", "current")]
#[case("0.50.0", "legacy")]
fn test_prepare_package(
    #[case] version: &str,
    #[case] shim: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let dir = monaco_package(version);
    let output = dir.path().join("dist");

    let mut cmd = Command::cargo_bin("monaco-bundle")?;
    cmd.arg("--src-dir")
        .arg(dir.path().join("monaco-editor"))
        .arg("--output-dir")
        .arg(&output);
    cmd.assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "Prepared monaco-editor {version}"
        )))
        .stdout(predicate::str::contains("Manifest written to"));

    let main = fs::read_to_string(output.join("editor.main/esm/vs/editor/editor.main.js"))?;
    assert!(main.starts_with(
        "import { createLocalize } from '../nls.js';\nconst nls = createLocalize('editor/editor.main');\n"
    ));
    assert_eq!(read_manifest(&output)["shim"], shim);
    Ok(())
}

#[test]
fn test_config_file_with_flag_override() -> Result<(), Box<dyn std::error::Error>> {
    let dir = monaco_package("0.52.2");
    let output = dir.path().join("out");
    let config = dir.path().join("bundle.json");
    fs::write(
        &config,
        serde_json::json!({
            "srcDir": dir.path().join("monaco-editor"),
            "outputDir": dir.path().join("ignored"),
            "target": "es2020",
        })
        .to_string(),
    )?;

    let mut cmd = Command::cargo_bin("monaco-bundle")?;
    cmd.arg("--config")
        .arg(&config)
        .arg("--output-dir")
        .arg(&output)
        .arg("--no-minify");
    cmd.assert().success();

    let manifest = read_manifest(&output);
    assert_eq!(manifest["minify"], false);
    assert_eq!(manifest["target"], "es2020");
    assert!(!dir.path().join("ignored").exists());
    Ok(())
}

#[test]
fn test_missing_src_dir() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let mut cmd = Command::cargo_bin("monaco-bundle")?;
    cmd.arg("--src-dir").arg(dir.path().join("missing"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
    Ok(())
}

#[test]
fn test_no_src_dir() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("monaco-bundle")?;
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("No source directory given"));
    Ok(())
}

#[test]
fn test_invalid_config() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let config = dir.path().join("bundle.json");
    fs::write(&config, "{ not json")?;

    let mut cmd = Command::cargo_bin("monaco-bundle")?;
    cmd.arg("--config").arg(&config);
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Failed to parse config file"));
    Ok(())
}

#[test]
fn test_invalid_package_version() -> Result<(), Box<dyn std::error::Error>> {
    let dir = monaco_package("next");
    let mut cmd = Command::cargo_bin("monaco-bundle")?;
    cmd.arg("--src-dir")
        .arg(dir.path().join("monaco-editor"))
        .arg("--output-dir")
        .arg(dir.path().join("dist"));
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("next"));
    Ok(())
}
