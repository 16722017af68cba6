use std::error::Error;
use std::fs;

use assert_cmd::Command;
use nbautoexport::{ExportFormat, NbAutoexportConfig, OrganizeBy};
use predicates::prelude::*;
use tempfile::tempdir;

mod common;

fn read_config(dir: &std::path::Path) -> NbAutoexportConfig {
    let content = fs::read_to_string(dir.join(".nbautoexport")).unwrap();
    NbAutoexportConfig::from_json(&content).unwrap()
}

#[test]
fn configure_writes_defaults() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let jupyter_dir = tempdir()?;

    Command::cargo_bin("nbautoexport")?
        .env("JUPYTER_CONFIG_DIR", jupyter_dir.path())
        .args(["configure", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"export_formats\""));

    assert_eq!(read_config(dir.path()), NbAutoexportConfig::default());
    Ok(())
}

#[test]
fn configure_writes_requested_settings() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let jupyter_dir = tempdir()?;

    Command::cargo_bin("nbautoexport")?
        .env("JUPYTER_CONFIG_DIR", jupyter_dir.path())
        .args([
            "configure",
            dir.path().to_str().unwrap(),
            "-f",
            "script",
            "-f",
            "html",
            "-f",
            "script",
            "-b",
            "notebook",
            "-e",
            "*.txt",
            "--clean-on-save",
        ])
        .assert()
        .success();

    let config = read_config(dir.path());
    assert_eq!(
        config.export_formats,
        vec![ExportFormat::Script, ExportFormat::Html]
    );
    assert_eq!(config.organize_by, OrganizeBy::Notebook);
    assert_eq!(config.clean.exclude, vec!["*.txt".to_string()]);
    assert!(config.clean.enabled);
    Ok(())
}

#[test]
fn configure_refuses_to_overwrite() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let jupyter_dir = tempdir()?;
    let existing = "{\n  \"export_formats\": [\"html\"]\n}";
    fs::write(dir.path().join(".nbautoexport"), existing)?;

    Command::cargo_bin("nbautoexport")?
        .env("JUPYTER_CONFIG_DIR", jupyter_dir.path())
        .args(["configure", dir.path().to_str().unwrap(), "-f", "pdf"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("--overwrite"));

    assert_eq!(fs::read_to_string(dir.path().join(".nbautoexport"))?, existing);

    Command::cargo_bin("nbautoexport")?
        .env("JUPYTER_CONFIG_DIR", jupyter_dir.path())
        .args(["configure", dir.path().to_str().unwrap(), "-f", "pdf", "--overwrite"])
        .assert()
        .success();

    assert_eq!(read_config(dir.path()).export_formats, vec![ExportFormat::Pdf]);
    Ok(())
}

#[test]
fn configure_rejects_unknown_format() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    Command::cargo_bin("nbautoexport")?
        .args(["configure", dir.path().to_str().unwrap(), "-f", "invalid"])
        .assert()
        .failure()
        .code(2);

    assert!(!dir.path().join(".nbautoexport").exists());
    Ok(())
}

#[test]
fn configure_missing_directory_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let missing = dir.path().join("nope");

    Command::cargo_bin("nbautoexport")?
        .args(["configure", missing.to_str().unwrap()])
        .assert()
        .failure()
        .code(1);

    Ok(())
}

#[test]
fn configure_warns_when_hook_not_installed() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let jupyter_dir = tempdir()?;

    Command::cargo_bin("nbautoexport")?
        .env("JUPYTER_CONFIG_DIR", jupyter_dir.path())
        .args(["configure", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Warning: nbautoexport is not properly installed with Jupyter.",
        ));

    let jupyter_config = jupyter_dir.path().join("jupyter_notebook_config.py");
    Command::cargo_bin("nbautoexport")?
        .args(["install", "--jupyter-config", jupyter_config.to_str().unwrap()])
        .assert()
        .success();

    Command::cargo_bin("nbautoexport")?
        .env("JUPYTER_CONFIG_DIR", jupyter_dir.path())
        .args(["configure", dir.path().to_str().unwrap(), "--overwrite"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Warning").not());

    Ok(())
}

#[test]
fn configure_warns_when_hook_is_outdated() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let jupyter_dir = tempdir()?;
    fs::write(
        jupyter_dir.path().join("jupyter_notebook_config.py"),
        "# >>> nbautoexport initialize, version=[0.0.1] >>>\n\
         c.FileContentsManager.post_save_hook = None\n\
         # <<< nbautoexport initialize <<<\n",
    )?;

    Command::cargo_bin("nbautoexport")?
        .env("JUPYTER_CONFIG_DIR", jupyter_dir.path())
        .args(["configure", dir.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Warning: nbautoexport initialize is an older version.",
        ))
        .stdout(predicate::str::contains("not properly installed").not());

    Ok(())
}
