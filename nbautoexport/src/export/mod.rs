// Expected-output prediction

use crate::error::Result;
use crate::format::{ExportFormat, OrganizeBy};
use crate::notebook::Notebook;
use crate::sentinel::NbAutoexportConfig;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Subfolder (next to the notebook) that receives a given export.
pub fn export_subfolder(notebook: &Notebook, format: ExportFormat, organize_by: OrganizeBy) -> PathBuf {
    match organize_by {
        OrganizeBy::Notebook => notebook.directory().join(notebook.name()),
        OrganizeBy::Extension => notebook.directory().join(format.as_str()),
    }
}

/// Paths produced by exporting one notebook to one format: the subfolder,
/// the exported file, and for image-bearing formats the `<name>_files`
/// directory with its current contents, if it exists.
pub fn notebook_exports(
    notebook: &Notebook,
    format: ExportFormat,
    organize_by: OrganizeBy,
) -> Result<Vec<PathBuf>> {
    let subfolder = export_subfolder(notebook, format, organize_by);
    let name = notebook.name();
    let extension = format.extension_for(Some(notebook))?;

    let mut paths = vec![
        subfolder.clone(),
        subfolder.join(format!("{name}{extension}")),
    ];

    if format.has_image_dir() {
        let image_dir = subfolder.join(format!("{name}_files"));
        if image_dir.is_dir() {
            paths.push(image_dir.clone());
            collect_tree(&image_dir, &mut paths)?;
        }
    }

    Ok(paths)
}

/// Every path a conversion run with `config` is expected to produce, sorted.
pub fn expected_exports(
    notebooks: &[Notebook],
    config: &NbAutoexportConfig,
) -> Result<Vec<PathBuf>> {
    let mut paths = BTreeSet::new();
    for notebook in notebooks {
        for format in &config.export_formats {
            paths.extend(notebook_exports(notebook, *format, config.organize_by)?);
        }
    }
    Ok(paths.into_iter().collect())
}

/// Push every descendant of `dir`, depth-first.
fn collect_tree(dir: &Path, out: &mut Vec<PathBuf>) -> Result<()> {
    let mut entries = std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<std::io::Result<Vec<_>>>()?;
    entries.sort();

    for path in entries {
        let is_dir = path.is_dir();
        out.push(path.clone());
        if is_dir {
            collect_tree(&path, out)?;
        }
    }
    Ok(())
}
