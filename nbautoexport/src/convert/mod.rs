// Conversion - drive the external nbconvert engine and relocate its output

use crate::error::{NbAutoexportError, Result};
use crate::export::export_subfolder;
use crate::format::{ExportFormat, NOTEBOOK_INFIX};
use crate::notebook::Notebook;
use crate::sentinel::NbAutoexportConfig;
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use std::process::Command;

lazy_static! {
    /// `# In[3]:` markers that nbconvert writes ahead of each code cell.
    static ref CELL_MARKER: Regex = Regex::new(r"\n#\sIn\[(([0-9]+)|(\s))\]:\n{2}").unwrap();
}

/// An engine that converts one notebook to one format.
pub trait Converter {
    /// Convert `notebook` to `format`, writing `<output_base><extension>` (and
    /// any `<output_base>_files` asset directory) into `build_dir`.
    fn convert(
        &self,
        notebook: &Path,
        format: ExportFormat,
        build_dir: &Path,
        output_base: &str,
    ) -> Result<()>;
}

/// Runs `jupyter nbconvert` as a subprocess.
#[derive(Debug, Clone)]
pub struct NbConvert {
    pub program: String,
}

impl Default for NbConvert {
    fn default() -> Self {
        NbConvert {
            program: "jupyter".to_string(),
        }
    }
}

impl NbConvert {
    pub fn new(program: impl Into<String>) -> Self {
        NbConvert {
            program: program.into(),
        }
    }
}

impl Converter for NbConvert {
    fn convert(
        &self,
        notebook: &Path,
        format: ExportFormat,
        build_dir: &Path,
        output_base: &str,
    ) -> Result<()> {
        let mut command = Command::new(&self.program);
        command
            .arg("nbconvert")
            .arg("--to")
            .arg(format.as_str())
            .arg("--output-dir")
            .arg(build_dir)
            .arg("--output")
            .arg(output_base)
            .arg(notebook);
        log::debug!("Running {command:?}");

        let output = command.output().map_err(|e| NbAutoexportError::Conversion {
            format: format.to_string(),
            message: format!("failed to run '{}': {e}", self.program),
        })?;

        let stderr = String::from_utf8_lossy(&output.stderr);
        if !output.status.success() {
            return Err(NbAutoexportError::Conversion {
                format: format.to_string(),
                message: format!("nbconvert exited with {}: {}", output.status, stderr.trim()),
            });
        }
        if !stderr.trim().is_empty() {
            log::debug!("nbconvert: {}", stderr.trim());
        }
        Ok(())
    }
}

/// Remove cell execution-count markers from exported text.
pub fn strip_cell_markers(text: &str) -> String {
    CELL_MARKER.replace_all(text, "").into_owned()
}

/// Export one notebook to every configured format, placing each result in
/// its subfolder next to the notebook.
pub fn export_notebook(
    notebook_path: &Path,
    config: &NbAutoexportConfig,
    converter: &dyn Converter,
) -> Result<()> {
    let notebook = Notebook::from_file(notebook_path)?;
    log::info!("Exporting {} ...", notebook_path.display());

    let directory = match notebook.directory() {
        d if d.as_os_str().is_empty() => Path::new("."),
        d => d,
    };

    for format in &config.export_formats {
        let format = *format;
        let subfolder = export_subfolder(&notebook, format, config.organize_by);
        let output_base = match format {
            ExportFormat::Notebook => format!("{}{NOTEBOOK_INFIX}", notebook.name()),
            _ => notebook.name(),
        };

        let build_dir = tempfile::Builder::new()
            .prefix(".nbautoexport-build-")
            .tempdir_in(directory)?;
        converter.convert(&notebook.path, format, build_dir.path(), &output_base)?;
        relocate(build_dir.path(), &subfolder, format)?;
        log::debug!("Wrote {format} export to {}", subfolder.display());
    }
    Ok(())
}

/// Move everything the converter wrote into `subfolder`. Text outputs have
/// their cell markers stripped; asset directories are merged.
fn relocate(build_dir: &Path, subfolder: &Path, format: ExportFormat) -> Result<()> {
    std::fs::create_dir_all(subfolder)?;

    for entry in std::fs::read_dir(build_dir)? {
        let entry = entry?;
        let source = entry.path();
        let target = subfolder.join(entry.file_name());

        if entry.file_type()?.is_dir() {
            copy_tree(&source, &target)?;
        } else if format.is_text() {
            match std::fs::read_to_string(&source) {
                Ok(text) => std::fs::write(&target, strip_cell_markers(&text))?,
                Err(_) => {
                    std::fs::copy(&source, &target)?;
                }
            }
        } else {
            std::fs::copy(&source, &target)?;
        }
    }
    Ok(())
}

fn copy_tree(source: &Path, target: &Path) -> Result<()> {
    std::fs::create_dir_all(target)?;
    for entry in std::fs::read_dir(source)? {
        let entry = entry?;
        let dest = target.join(entry.file_name());
        if entry.file_type()?.is_dir() {
            copy_tree(&entry.path(), &dest)?;
        } else {
            std::fs::copy(entry.path(), &dest)?;
        }
    }
    Ok(())
}
