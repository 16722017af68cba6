pub mod format;
pub mod notebook;
pub mod sentinel;
pub mod export;
pub mod clean;
pub mod convert;
pub mod hook;
pub mod jupyter_config;
pub mod watcher;
pub mod error;

pub use clean::find_files_to_clean;
pub use convert::{export_notebook, Converter, NbConvert};
pub use error::{NbAutoexportError, Result};
pub use export::expected_exports;
pub use format::{ExportFormat, OrganizeBy};
pub use hook::{post_save, ContentModel};
pub use notebook::{find_notebooks, Notebook};
pub use sentinel::{CleanConfig, NbAutoexportConfig, SAVE_PROGRESS_INDICATOR_FILE};
