// Notebook documents - reading, structural validation, discovery

use crate::error::{NbAutoexportError, Result};
use crate::format::{exporter_extension, FALLBACK_SCRIPT_EXTENSION};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const NOTEBOOK_EXTENSION: &str = "ipynb";

/// The `metadata.language_info` fields that decide a script's extension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LanguageInfo {
    #[serde(default)]
    pub nbconvert_exporter: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub file_extension: Option<String>,
}

/// A notebook file that parsed and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notebook {
    pub path: PathBuf,
    pub language_info: LanguageInfo,
}

impl Notebook {
    /// Read and validate a notebook file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let malformed = |reason: String| NbAutoexportError::MalformedNotebook {
            path: path.to_path_buf(),
            reason,
        };

        let content = std::fs::read_to_string(path)
            .map_err(|e| malformed(format!("[io] {e}")))?;
        let value: Value = serde_json::from_str(&content)
            .map_err(|e| malformed(format!("[json] {e}")))?;
        validate_notebook(&value).map_err(|e| malformed(format!("[validation] {e}")))?;

        let language_info = match value["metadata"].get("language_info") {
            Some(info) => serde_json::from_value(info.clone())
                .map_err(|e| malformed(format!("[validation] language_info: {e}")))?,
            None => LanguageInfo::default(),
        };

        Ok(Notebook {
            path: path.to_path_buf(),
            language_info,
        })
    }

    /// The file stem, used for subfolder and output file names.
    pub fn name(&self) -> String {
        self.path
            .file_stem()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string()
    }

    /// The directory holding the notebook.
    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Script extension, matching nbconvert's ScriptExporter.
    /// Precedence: nbconvert_exporter, recognized language name, file_extension, `.txt`.
    pub fn script_extension(&self) -> String {
        let info = &self.language_info;
        if let Some(exporter) = info.nbconvert_exporter.as_deref() {
            match exporter_extension(exporter) {
                Some(ext) => return ext.to_string(),
                None => log::debug!(
                    "{}: unknown nbconvert_exporter '{exporter}', falling back to language name",
                    self.path.display()
                ),
            }
        }
        if let Some(ext) = info.name.as_deref().and_then(exporter_extension) {
            return ext.to_string();
        }
        info.file_extension
            .clone()
            .unwrap_or_else(|| FALLBACK_SCRIPT_EXTENSION.to_string())
    }
}

/// Whether the path has the `.ipynb` extension (case-insensitive).
pub fn has_notebook_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case(NOTEBOOK_EXTENSION))
        .unwrap_or(false)
}

/// Find the notebooks directly inside `directory`, sorted by path.
///
/// Files that do not parse as notebooks are skipped. Files with the notebook
/// extension that fail are reported as warnings.
pub fn find_notebooks(directory: &Path) -> Result<Vec<Notebook>> {
    let (notebooks, malformed) = scan_notebooks(directory)?;
    for e in malformed {
        log::warn!("{e}");
    }
    Ok(notebooks)
}

/// Like `find_notebooks`, but hands back the errors for `.ipynb` files that
/// failed to load instead of logging them.
pub fn scan_notebooks(directory: &Path) -> Result<(Vec<Notebook>, Vec<NbAutoexportError>)> {
    let mut paths = Vec::new();
    for entry in std::fs::read_dir(directory)? {
        let entry = entry?;
        if entry.file_type()?.is_file() {
            paths.push(entry.path());
        }
    }
    paths.sort();

    let mut notebooks = Vec::new();
    let mut malformed = Vec::new();
    for path in paths {
        let is_ipynb = has_notebook_extension(&path);
        if !is_ipynb && !starts_like_json_object(&path) {
            continue;
        }
        match Notebook::from_file(&path) {
            Ok(notebook) => notebooks.push(notebook),
            Err(e) if is_ipynb => malformed.push(e),
            Err(_) => {}
        }
    }
    Ok((notebooks, malformed))
}

/// Peek at the first non-whitespace byte so exported binaries are not read in full.
fn starts_like_json_object(path: &Path) -> bool {
    let mut buf = [0u8; 256];
    let read = match std::fs::File::open(path).and_then(|mut f| f.read(&mut buf)) {
        Ok(n) => n,
        Err(_) => return false,
    };
    buf[..read]
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .map(|b| *b == b'{')
        .unwrap_or(false)
}

/// Structural validation against the nbformat v3/v4 document layout.
fn validate_notebook(value: &Value) -> std::result::Result<(), String> {
    let root = value.as_object().ok_or("notebook must be a JSON object")?;

    let major = root
        .get("nbformat")
        .and_then(Value::as_u64)
        .ok_or("'nbformat' must be an integer")?;
    root.get("nbformat_minor")
        .and_then(Value::as_u64)
        .ok_or("'nbformat_minor' must be an integer")?;
    if !root.get("metadata").map(Value::is_object).unwrap_or(false) {
        return Err("'metadata' must be an object".into());
    }

    match major {
        4 => {
            let cells = root
                .get("cells")
                .and_then(Value::as_array)
                .ok_or("'cells' must be an array")?;
            for (i, cell) in cells.iter().enumerate() {
                validate_cell(cell).map_err(|e| format!("cell {i}: {e}"))?;
            }
            Ok(())
        }
        3 => {
            root.get("worksheets")
                .and_then(Value::as_array)
                .ok_or("'worksheets' must be an array")?;
            Ok(())
        }
        other => Err(format!("unsupported nbformat version {other}")),
    }
}

fn validate_cell(cell: &Value) -> std::result::Result<(), String> {
    let cell = cell.as_object().ok_or("cell must be an object")?;

    let cell_type = cell
        .get("cell_type")
        .and_then(Value::as_str)
        .ok_or("'cell_type' must be a string")?;

    match cell.get("source") {
        Some(Value::String(_)) => {}
        Some(Value::Array(lines)) if lines.iter().all(Value::is_string) => {}
        _ => return Err("'source' must be a string or a list of strings".into()),
    }

    if !cell.get("metadata").map(Value::is_object).unwrap_or(false) {
        return Err("'metadata' must be an object".into());
    }

    match cell_type {
        "code" => {
            if !cell.get("outputs").map(Value::is_array).unwrap_or(false) {
                return Err("code cell 'outputs' must be an array".into());
            }
            match cell.get("execution_count") {
                Some(Value::Null) => Ok(()),
                Some(count) if count.is_u64() => Ok(()),
                _ => Err("code cell 'execution_count' must be an integer or null".into()),
            }
        }
        "markdown" | "raw" => Ok(()),
        other => Err(format!("unknown cell_type '{other}'")),
    }
}
