// Post-save hook - the entry point the notebook host calls after each save

use crate::clean;
use crate::convert::{export_notebook, Converter};
use crate::error::Result;
use crate::sentinel::{self, sentinel_path};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// The fields of the host's content model that the hook reads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentModel {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl ContentModel {
    pub fn notebook() -> Self {
        ContentModel {
            kind: "notebook".to_string(),
            name: None,
            path: None,
        }
    }

    pub fn is_notebook(&self) -> bool {
        self.kind == "notebook"
    }
}

/// A save callback: content model and the filesystem path just written.
pub type SaveHook = Box<dyn Fn(&ContentModel, &Path) -> Result<()> + Send + Sync>;

/// What a post-save invocation did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    NotNotebook,
    NoConfig,
    Exported { cleaned: Vec<PathBuf> },
}

/// Export (and, if configured, clean) after a save. Errors are returned.
pub fn try_post_save(
    model: &ContentModel,
    os_path: &Path,
    converter: &dyn Converter,
) -> Result<SaveOutcome> {
    if !model.is_notebook() {
        log::debug!("{} is not a notebook. Nothing to do.", os_path.display());
        return Ok(SaveOutcome::NotNotebook);
    }

    let directory = match os_path.parent() {
        Some(d) if !d.as_os_str().is_empty() => d,
        _ => Path::new("."),
    };
    let indicator = sentinel_path(directory);
    if !indicator.exists() {
        log::debug!("{} not found. Nothing to do.", indicator.display());
        return Ok(SaveOutcome::NoConfig);
    }

    log::info!("{} found. Exporting notebook ...", indicator.display());
    let config = sentinel::load(&indicator)?;
    export_notebook(os_path, &config, converter)?;

    let cleaned = if config.clean.enabled {
        let removed = clean::clean(directory, &config)?;
        if !removed.is_empty() {
            log::info!("Removed {} stale file(s) from {}", removed.len(), directory.display());
        }
        removed
    } else {
        Vec::new()
    };

    log::debug!("post_save successful.");
    Ok(SaveOutcome::Exported { cleaned })
}

/// Host-facing post-save hook. Never fails: errors are logged and dropped so
/// that a broken export never blocks the user's save.
pub fn post_save(model: &ContentModel, os_path: &Path, converter: &dyn Converter) {
    if let Err(e) = try_post_save(model, os_path, converter) {
        log::error!("post_save failed for {}: {e}", os_path.display());
    }
}

/// Wrap `post_save` with a converter into a storable hook.
pub fn save_hook<C>(converter: C) -> SaveHook
where
    C: Converter + Send + Sync + 'static,
{
    Box::new(move |model: &ContentModel, os_path: &Path| {
        post_save(model, os_path, &converter);
        Ok(())
    })
}

/// Combine an existing hook with a new one. Both always run, `first` then
/// `second`. A failure in `second` is logged and does not affect the result;
/// a failure in `first` is returned after `second` has run.
pub fn compose(first: SaveHook, second: SaveHook) -> SaveHook {
    Box::new(move |model: &ContentModel, os_path: &Path| {
        let result = first(model, os_path);
        if let Err(e) = &result {
            log::error!("Existing post-save hook failed: {e}");
        }
        if let Err(e) = second(model, os_path) {
            log::error!("Chained post-save hook failed: {e}");
        }
        result
    })
}
