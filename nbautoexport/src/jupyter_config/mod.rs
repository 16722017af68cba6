// Jupyter configuration - install or refresh the post-save hook block

use crate::error::{NbAutoexportError, Result};
use lazy_static::lazy_static;
use regex::{NoExpand, Regex};
use std::cmp::Ordering;
use std::path::{Path, PathBuf};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const JUPYTER_CONFIG_FILE: &str = "jupyter_notebook_config.py";

lazy_static! {
    static ref BLOCK: Regex =
        Regex::new(r"(?s)# >>> nbautoexport initialize.*# <<< nbautoexport initialize <<<\n?")
            .unwrap();
    static ref BLOCK_VERSION: Regex =
        Regex::new(r"# >>> nbautoexport initialize, version=\[(.*?)\] >>>").unwrap();
}

const BLOCK_TEMPLATE: &str = r#"# >>> nbautoexport initialize, version=[{{version}}] >>>
try:
    import logging
    import subprocess

    _nbautoexport_logger = logging.getLogger("nbautoexport")

    def _nbautoexport_post_save(model, os_path, contents_manager):
        if model["type"] != "notebook":
            return
        try:
            subprocess.run([{{program}}, "post-save", os_path], check=True)
        except Exception as e:
            _nbautoexport_logger.error(
                f"nbautoexport | post_save failed due to {type(e).__name__}: {e}"
            )

    if callable(c.FileContentsManager.post_save_hook):
        _nbautoexport_logger.info(
            "nbautoexport | Existing post_save_hook found. Wrapping it to run nbautoexport's afterwards ..."
        )
        _nbautoexport_old_post_save = c.FileContentsManager.post_save_hook

        def _nbautoexport_chained_post_save(model, os_path, contents_manager):
            try:
                _nbautoexport_old_post_save(
                    model=model, os_path=os_path, contents_manager=contents_manager
                )
            finally:
                _nbautoexport_post_save(model, os_path, contents_manager)

        c.FileContentsManager.post_save_hook = _nbautoexport_chained_post_save
    else:
        c.FileContentsManager.post_save_hook = _nbautoexport_post_save
except Exception as e:
    import sys

    sys.stderr.write(
        f"nbautoexport | Failed to register post-save hook due to {type(e).__name__}: {e}\n"
    )
# <<< nbautoexport initialize <<<
"#;

/// What `install_post_save_hook` did to the config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Created,
    Appended,
    /// An older block (or one without a version) was replaced.
    Updated { previous: Option<String> },
    /// The installed block is the same version or newer.
    Unchanged { installed: String },
}

/// The initialization block, calling `program` on every notebook save.
pub fn initialize_block(program: &str) -> String {
    // A JSON string literal is also a valid Python string literal.
    let quoted = serde_json::Value::String(program.to_string()).to_string();
    BLOCK_TEMPLATE
        .replacen("{{version}}", VERSION, 1)
        .replacen("{{program}}", &quoted, 1)
}

/// `$JUPYTER_CONFIG_DIR/jupyter_notebook_config.py`, or the same under `~/.jupyter`.
pub fn default_config_path() -> PathBuf {
    let dir = match std::env::var("JUPYTER_CONFIG_DIR") {
        Ok(dir) if !dir.is_empty() => expand_user(Path::new(&dir)),
        _ => PathBuf::from(shellexpand::tilde("~/.jupyter").into_owned()),
    };
    dir.join(JUPYTER_CONFIG_FILE)
}

/// Expand a leading `~`.
pub fn expand_user(path: &Path) -> PathBuf {
    PathBuf::from(shellexpand::tilde(&path.to_string_lossy()).into_owned())
}

/// Version recorded in an existing block: `None` if there is no block,
/// `Some("")` if the block predates versioning.
pub fn installed_version(config: &str) -> Option<String> {
    if !BLOCK.is_match(config) {
        return None;
    }
    Some(
        BLOCK_VERSION
            .captures(config)
            .map(|c| c[1].to_string())
            .unwrap_or_default(),
    )
}

/// Whether the config file exists and contains the initialization block.
pub fn post_save_hook_installed(config_path: &Path) -> Result<bool> {
    if !config_path.exists() {
        return Ok(false);
    }
    let config = std::fs::read_to_string(config_path)?;
    Ok(BLOCK.is_match(&config))
}

/// State of the initialization block in a Jupyter config file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HookStatus {
    Missing,
    /// Installed by an older release, or by one that predates versioning.
    Outdated { installed: String },
    Current,
}

/// Compare the block in `config_path` (if any) with this release.
pub fn post_save_hook_status(config_path: &Path) -> Result<HookStatus> {
    if !config_path.exists() {
        return Ok(HookStatus::Missing);
    }
    let config = std::fs::read_to_string(config_path)?;
    let status = match installed_version(&config) {
        None => HookStatus::Missing,
        Some(installed) => {
            let older = installed.is_empty()
                || compare_versions(&installed, VERSION).map_or(true, |o| o == Ordering::Less);
            if older {
                HookStatus::Outdated { installed }
            } else {
                HookStatus::Current
            }
        }
    };
    Ok(status)
}

/// Splice the initialization block into the Jupyter config file.
///
/// Missing file: created. No block: appended. Older or unversioned block:
/// replaced. Same or newer version: left alone.
pub fn install_post_save_hook(config_path: Option<&Path>, program: &str) -> Result<InstallOutcome> {
    let config_path = match config_path {
        Some(path) => expand_user(path),
        None => default_config_path(),
    };
    let block = initialize_block(program);

    if !config_path.exists() {
        log::debug!(
            "No existing Jupyter configuration detected at {}. Creating...",
            config_path.display()
        );
        if let Some(parent) = config_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&config_path, &block)?;
        log::info!("nbautoexport post-save hook installed.");
        return Ok(InstallOutcome::Created);
    }

    log::debug!("Detected existing Jupyter configuration at {}", config_path.display());
    let config = std::fs::read_to_string(&config_path)?;

    let outcome = match installed_version(&config) {
        None => {
            log::info!("Installing post-save hook.");
            let mut updated = config;
            updated.push('\n');
            updated.push_str(&block);
            std::fs::write(&config_path, updated)?;
            InstallOutcome::Appended
        }
        Some(existing) => {
            log::info!("Detected existing nbautoexport post-save hook.");
            if existing.is_empty() {
                log::debug!("Existing post-save hook predates versioning.");
            } else {
                log::debug!("Existing post-save hook is version {existing}");
            }

            if existing.is_empty() || compare_versions(&existing, VERSION)? == Ordering::Less {
                log::info!("Updating nbautoexport post-save hook with version {VERSION}...");
                let updated = BLOCK.replace(&config, NoExpand(&block));
                std::fs::write(&config_path, updated.as_ref())?;
                InstallOutcome::Updated {
                    previous: (!existing.is_empty()).then_some(existing),
                }
            } else {
                log::info!("No changes made.");
                return Ok(InstallOutcome::Unchanged { installed: existing });
            }
        }
    };

    log::info!("nbautoexport post-save hook installed.");
    Ok(outcome)
}

/// Compare dotted numeric versions (`0.2.0`, `1.10`, `0.3.0+4.gabc`).
/// Missing components count as zero.
pub fn compare_versions(a: &str, b: &str) -> Result<Ordering> {
    let (a, b) = (parse_version(a)?, parse_version(b)?);
    let len = a.len().max(b.len());
    for i in 0..len {
        let (x, y) = (a.get(i).copied().unwrap_or(0), b.get(i).copied().unwrap_or(0));
        match x.cmp(&y) {
            Ordering::Equal => continue,
            other => return Ok(other),
        }
    }
    Ok(Ordering::Equal)
}

fn parse_version(version: &str) -> Result<Vec<u64>> {
    let release = version
        .trim()
        .trim_start_matches('v')
        .split(['+', '-'])
        .next()
        .unwrap_or_default();
    release
        .split('.')
        .map(|part| {
            let digits: String = part.chars().take_while(char::is_ascii_digit).collect();
            digits.parse::<u64>().map_err(|_| {
                NbAutoexportError::Install(format!("unrecognized version '{version}'"))
            })
        })
        .collect()
}
