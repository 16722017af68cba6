use std::error::Error;
use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::tempdir;

mod common;

use common::{write_file, write_notebook};

#[test]
fn post_save_never_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let notebook = write_notebook(dir.path(), "analysis");
    write_file(&dir.path().join(".nbautoexport"), r#"{"export_formats": ["script"]}"#);

    Command::cargo_bin("nbautoexport")?
        .args(["--jupyter", "/nonexistent/jupyter", "post-save"])
        .arg(&notebook)
        .assert()
        .success();

    Command::cargo_bin("nbautoexport")?
        .args(["post-save", "--type", "file"])
        .arg(dir.path().join("missing.txt"))
        .assert()
        .success();

    Ok(())
}

#[test]
fn export_with_no_notebooks_fails() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;

    Command::cargo_bin("nbautoexport")?
        .args(["export", dir.path().to_str().unwrap()])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("No notebooks found"));

    Ok(())
}

#[cfg(unix)]
#[test]
fn export_directory_with_fake_jupyter() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let bin = tempdir()?;
    let jupyter = common::fake_jupyter(bin.path());
    write_notebook(dir.path(), "analysis");
    write_notebook(dir.path(), "report");

    Command::cargo_bin("nbautoexport")?
        .arg("--jupyter")
        .arg(&jupyter)
        .args(["export", dir.path().to_str().unwrap(), "-f", "script", "-b", "notebook"])
        .assert()
        .success();

    let script = fs::read_to_string(dir.path().join("analysis").join("analysis.py"))?;
    assert!(script.contains("print(1)"));
    assert!(!script.contains("In[1]"));
    assert!(dir.path().join("report").join("report.py").exists());
    Ok(())
}

#[cfg(unix)]
#[test]
fn post_save_exports_configured_directory() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let bin = tempdir()?;
    let jupyter = common::fake_jupyter(bin.path());
    let notebook = write_notebook(dir.path(), "analysis");
    write_file(&dir.path().join("stale.txt"), "");
    write_file(
        &dir.path().join(".nbautoexport"),
        r#"{"export_formats": ["script"], "clean": {"enabled": true}}"#,
    );

    Command::cargo_bin("nbautoexport")?
        .arg("--jupyter")
        .arg(&jupyter)
        .arg("post-save")
        .arg(&notebook)
        .assert()
        .success();

    assert!(dir.path().join("script").join("analysis.py").exists());
    assert!(!dir.path().join("stale.txt").exists());
    Ok(())
}
