// Directory reconciliation - find and remove files nbautoexport would not produce

use crate::error::{NbAutoexportError, Result};
use crate::export::expected_exports;
use crate::notebook::{find_notebooks, has_notebook_extension};
use crate::sentinel::{NbAutoexportConfig, SAVE_PROGRESS_INDICATOR_FILE};
use std::collections::BTreeSet;
use std::path::{Component, Path, PathBuf};

/// Directory where Jupyter keeps autosave snapshots.
pub const CHECKPOINTS_DIR: &str = ".ipynb_checkpoints";

/// Find files under `directory` that are not notebooks, expected exports,
/// excluded by a `config.clean.exclude` pattern, checkpoints, or the sidecar.
///
/// Read-only. Paths are returned sorted and joined onto `directory`.
pub fn find_files_to_clean(directory: &Path, config: &NbAutoexportConfig) -> Result<Vec<PathBuf>> {
    let notebooks: Vec<_> = find_notebooks(directory)?
        .into_iter()
        .filter(|nb| has_notebook_extension(&nb.path))
        .collect();

    let mut keep: BTreeSet<PathBuf> = BTreeSet::new();
    keep.extend(notebooks.iter().map(|nb| relative_to(directory, &nb.path)));
    keep.extend(
        expected_exports(&notebooks, config)?
            .iter()
            .map(|p| relative_to(directory, p)),
    );
    keep.extend(globs(directory, &config.clean.exclude)?);
    keep.extend(glob_files(directory, &format!("{CHECKPOINTS_DIR}/*"))?);
    keep.insert(PathBuf::from(SAVE_PROGRESS_INDICATOR_FILE));

    let subfiles: BTreeSet<PathBuf> = glob_files(directory, "**/*")?.into_iter().collect();

    Ok(subfiles
        .difference(&keep)
        .map(|rel| directory.join(rel))
        .collect())
}

/// Delete `files`, then remove directories under `directory` that the
/// deletion left empty, deepest first. `directory` itself is never removed.
///
/// Stops at the first failure.
pub fn remove_files(directory: &Path, files: &[PathBuf]) -> Result<()> {
    let mut parents: BTreeSet<PathBuf> = BTreeSet::new();

    for file in files {
        log::debug!("Removing {}", file.display());
        std::fs::remove_file(file)?;

        let rel = relative_to(directory, file);
        for ancestor in rel.ancestors().skip(1) {
            if ancestor.as_os_str().is_empty() {
                break;
            }
            parents.insert(ancestor.to_path_buf());
        }
    }

    let mut parents: Vec<PathBuf> = parents.into_iter().collect();
    parents.sort_by_key(|p| std::cmp::Reverse(p.components().count()));

    for rel in parents {
        let dir = directory.join(&rel);
        if dir.is_dir() && std::fs::read_dir(&dir)?.next().is_none() {
            log::debug!("Removing empty directory {}", dir.display());
            std::fs::remove_dir(&dir)?;
        }
    }
    Ok(())
}

/// Find and delete in one step. Returns what was removed.
pub fn clean(directory: &Path, config: &NbAutoexportConfig) -> Result<Vec<PathBuf>> {
    let to_clean = find_files_to_clean(directory, config)?;
    remove_files(directory, &to_clean)?;
    Ok(to_clean)
}

/// Paths matching any of `patterns`, evaluated relative to `directory`.
pub fn globs(directory: &Path, patterns: &[String]) -> Result<Vec<PathBuf>> {
    let mut matched = Vec::new();
    for pattern in patterns {
        matched.extend(glob_relative(directory, pattern)?);
    }
    Ok(matched)
}

fn glob_files(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    Ok(glob_relative(directory, pattern)?
        .into_iter()
        .filter(|rel| directory.join(rel).is_file())
        .collect())
}

fn glob_relative(directory: &Path, pattern: &str) -> Result<Vec<PathBuf>> {
    let base = glob::Pattern::escape(&directory.to_string_lossy());
    let full = format!("{}/{}", base.trim_end_matches('/'), pattern);

    let mut out = Vec::new();
    for entry in glob::glob(&full).map_err(|e| NbAutoexportError::Glob(format!("{pattern}: {e}")))? {
        match entry {
            Ok(path) => out.push(relative_to(directory, &path)),
            Err(e) => log::warn!("Skipping unreadable path: {e}"),
        }
    }
    Ok(out)
}

/// `path` relative to `directory`, ignoring `.` components on either side.
fn relative_to(directory: &Path, path: &Path) -> PathBuf {
    let normalize = |p: &Path| -> PathBuf {
        p.components()
            .filter(|c| !matches!(c, Component::CurDir))
            .collect()
    };
    let (directory, path) = (normalize(directory), normalize(path));
    match path.strip_prefix(&directory) {
        Ok(rel) => rel.to_path_buf(),
        Err(_) => path,
    }
}
