use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NbAutoexportError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing expected nbautoexport config file [{}].", path.display())]
    MissingConfig { path: PathBuf },

    #[error(
        "Detected existing autoexport configuration at {}. If you wish to overwrite, use the --overwrite flag.",
        path.display()
    )]
    AlreadyExists { path: PathBuf },

    #[error("Error reading {} as Jupyter Notebook: {reason}", path.display())]
    MalformedNotebook { path: PathBuf, reason: String },

    #[error("Script extension is language-dependent and requires a notebook")]
    ScriptExtensionNeedsNotebook,

    #[error("Conversion to '{format}' failed: {message}")]
    Conversion { format: String, message: String },

    #[error("Install error: {0}")]
    Install(String),

    #[error("Glob error: {0}")]
    Glob(String),

    #[error("Watch error: {0}")]
    Watch(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<notify::Error> for NbAutoexportError {
    fn from(e: notify::Error) -> Self {
        NbAutoexportError::Watch(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, NbAutoexportError>;
