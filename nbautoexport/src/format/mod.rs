// Format registry - export formats, organize-by strategy, file extensions

use crate::error::{NbAutoexportError, Result};
use crate::notebook::Notebook;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Infix nbconvert puts in front of `.ipynb` when re-exporting a notebook.
pub const NOTEBOOK_INFIX: &str = ".nbconvert";

/// Extension used for scripts whose language cannot be determined.
pub const FALLBACK_SCRIPT_EXTENSION: &str = ".txt";

/// An nbconvert export format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Html,
    Latex,
    Pdf,
    Slides,
    Markdown,
    Asciidoc,
    Script,
    Notebook,
    Rst,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 9] = [
        ExportFormat::Html,
        ExportFormat::Latex,
        ExportFormat::Pdf,
        ExportFormat::Slides,
        ExportFormat::Markdown,
        ExportFormat::Asciidoc,
        ExportFormat::Script,
        ExportFormat::Notebook,
        ExportFormat::Rst,
    ];

    /// The identifier used in the sidecar file, on the command line, and by nbconvert's `--to`.
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportFormat::Html => "html",
            ExportFormat::Latex => "latex",
            ExportFormat::Pdf => "pdf",
            ExportFormat::Slides => "slides",
            ExportFormat::Markdown => "markdown",
            ExportFormat::Asciidoc => "asciidoc",
            ExportFormat::Script => "script",
            ExportFormat::Notebook => "notebook",
            ExportFormat::Rst => "rst",
        }
    }

    /// Whether `value` names one of the supported formats.
    pub fn is_known(value: &str) -> bool {
        ExportFormat::ALL.iter().any(|f| f.as_str() == value)
    }

    /// Formats that write an `<name>_files` directory of images next to the output.
    pub fn has_image_dir(&self) -> bool {
        matches!(
            self,
            ExportFormat::Asciidoc
                | ExportFormat::Latex
                | ExportFormat::Markdown
                | ExportFormat::Rst
        )
    }

    /// Whether the exported file is text (and can have cell markers stripped).
    pub fn is_text(&self) -> bool {
        !matches!(self, ExportFormat::Pdf)
    }

    /// File extension produced for this format.
    ///
    /// `Script` depends on the notebook's language and fails without one.
    pub fn extension_for(&self, notebook: Option<&Notebook>) -> Result<String> {
        match self {
            ExportFormat::Script => notebook
                .map(Notebook::script_extension)
                .ok_or(NbAutoexportError::ScriptExtensionNeedsNotebook),
            ExportFormat::Notebook => Ok(format!("{NOTEBOOK_INFIX}.ipynb")),
            other => Ok(exporter_extension(other.as_str())
                .unwrap_or(FALLBACK_SCRIPT_EXTENSION)
                .to_string()),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportFormat {
    type Err = NbAutoexportError;

    fn from_str(s: &str) -> Result<Self> {
        ExportFormat::ALL
            .iter()
            .copied()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| {
                NbAutoexportError::Config(format!(
                    "invalid export format '{s}' (expected one of: {})",
                    ExportFormat::ALL.map(|f| f.as_str()).join(", ")
                ))
            })
    }
}

/// How exported files are grouped into subfolders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrganizeBy {
    /// One subfolder per notebook, holding every format.
    Notebook,
    /// One subfolder per export format, holding every notebook.
    #[default]
    Extension,
}

impl OrganizeBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganizeBy::Notebook => "notebook",
            OrganizeBy::Extension => "extension",
        }
    }
}

impl fmt::Display for OrganizeBy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrganizeBy {
    type Err = NbAutoexportError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "notebook" => Ok(OrganizeBy::Notebook),
            "extension" => Ok(OrganizeBy::Extension),
            _ => Err(NbAutoexportError::Config(format!(
                "invalid organize-by value '{s}' (expected 'notebook' or 'extension')"
            ))),
        }
    }
}

/// File extension declared by the nbconvert exporter with the given name.
pub fn exporter_extension(name: &str) -> Option<&'static str> {
    let ext = match name {
        "asciidoc" => ".asciidoc",
        "html" => ".html",
        "latex" => ".tex",
        "markdown" => ".md",
        "notebook" => ".ipynb",
        "pdf" | "webpdf" => ".pdf",
        "python" => ".py",
        "rst" => ".rst",
        "script" => ".txt",
        "slides" => ".slides.html",
        _ => return None,
    };
    Some(ext)
}
