// Configuration store - the `.nbautoexport` sidecar file

use crate::error::{NbAutoexportError, Result};
use crate::format::{ExportFormat, OrganizeBy};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the sidecar file that opts a directory into automatic export.
pub const SAVE_PROGRESS_INDICATOR_FILE: &str = ".nbautoexport";

pub const DEFAULT_EXPORT_FORMATS: [ExportFormat; 1] = [ExportFormat::Script];
pub const DEFAULT_ORGANIZE_BY: OrganizeBy = OrganizeBy::Extension;

/// Cleanup settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CleanConfig {
    /// Run cleanup after every automatic export.
    #[serde(default)]
    pub enabled: bool,
    /// Glob patterns, relative to the watched directory, that are never cleaned.
    #[serde(default)]
    pub exclude: Vec<String>,
}

/// Per-directory export configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NbAutoexportConfig {
    #[serde(default = "default_export_formats")]
    pub export_formats: Vec<ExportFormat>,
    #[serde(default)]
    pub organize_by: OrganizeBy,
    #[serde(default)]
    pub clean: CleanConfig,
}

fn default_export_formats() -> Vec<ExportFormat> {
    DEFAULT_EXPORT_FORMATS.to_vec()
}

impl Default for NbAutoexportConfig {
    fn default() -> Self {
        NbAutoexportConfig {
            export_formats: default_export_formats(),
            organize_by: DEFAULT_ORGANIZE_BY,
            clean: CleanConfig::default(),
        }
    }
}

impl NbAutoexportConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        let mut config: NbAutoexportConfig = serde_json::from_str(content)
            .map_err(|e| NbAutoexportError::Config(e.to_string()))?;
        config.validate()?;
        config.dedup_formats();
        Ok(config)
    }

    /// Pretty-printed JSON, the on-disk representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.export_formats.is_empty() {
            return Err(NbAutoexportError::Config(
                "export_formats must contain at least one format".into(),
            ));
        }
        Ok(())
    }

    /// Drop repeated formats, keeping first occurrences in order.
    pub fn dedup_formats(&mut self) {
        let mut seen = Vec::with_capacity(self.export_formats.len());
        self.export_formats.retain(|f| {
            if seen.contains(f) {
                false
            } else {
                seen.push(*f);
                true
            }
        });
    }
}

/// Path of the sidecar file for a directory.
pub fn sentinel_path(directory: &Path) -> PathBuf {
    directory.join(SAVE_PROGRESS_INDICATOR_FILE)
}

/// Load a configuration from a sidecar file.
pub fn load(path: &Path) -> Result<NbAutoexportConfig> {
    if !path.exists() {
        return Err(NbAutoexportError::MissingConfig {
            path: path.to_path_buf(),
        });
    }
    let content = std::fs::read_to_string(path)?;
    NbAutoexportConfig::from_json(&content).map_err(|e| match e {
        NbAutoexportError::Config(reason) => {
            NbAutoexportError::Config(format!("{}: {reason}", path.display()))
        }
        other => other,
    })
}

/// Load the sidecar in `directory`, if there is one.
pub fn load_if_present(directory: &Path) -> Result<Option<NbAutoexportConfig>> {
    let path = sentinel_path(directory);
    if path.exists() {
        load(&path).map(Some)
    } else {
        Ok(None)
    }
}

/// Write the sidecar for `directory`. Returns the path written.
pub fn save(directory: &Path, config: &NbAutoexportConfig, overwrite: bool) -> Result<PathBuf> {
    let path = sentinel_path(directory);
    if path.exists() && !overwrite {
        return Err(NbAutoexportError::AlreadyExists { path });
    }
    config.validate()?;

    let json = config.to_json()?;
    log::info!("Creating configuration file at {}", path.display());
    log::info!("\n{json}");
    std::fs::write(&path, json)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = NbAutoexportConfig::default();
        assert_eq!(config.export_formats, vec![ExportFormat::Script]);
        assert_eq!(config.organize_by, OrganizeBy::Extension);
        assert!(!config.clean.enabled);
        assert!(config.clean.exclude.is_empty());

        assert_eq!(NbAutoexportConfig::from_json("{}").unwrap(), config);
    }

    #[test]
    fn test_save_and_load() {
        let tmp = TempDir::new().unwrap();
        let config = NbAutoexportConfig {
            export_formats: vec![ExportFormat::Script, ExportFormat::Html],
            organize_by: OrganizeBy::Notebook,
            clean: CleanConfig {
                enabled: false,
                exclude: vec!["README.md".into(), "images/*".into()],
            },
        };

        let path = save(tmp.path(), &config, false).unwrap();
        assert_eq!(path, tmp.path().join(".nbautoexport"));
        assert_eq!(load(&path).unwrap(), config);

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n  \"export_formats\""), "should be pretty-printed");
    }

    #[test]
    fn test_refuses_overwrite() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join(SAVE_PROGRESS_INDICATOR_FILE);
        std::fs::write(&path, "original").unwrap();

        let err = save(tmp.path(), &NbAutoexportConfig::default(), false).unwrap_err();
        assert!(matches!(err, NbAutoexportError::AlreadyExists { .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");

        save(tmp.path(), &NbAutoexportConfig::default(), true).unwrap();
        assert_eq!(load(&path).unwrap(), NbAutoexportConfig::default());
    }

    #[test]
    fn test_rejects_unknown_fields() {
        let err = NbAutoexportConfig::from_json(r#"{"export_formats": ["html"], "color": "red"}"#)
            .unwrap_err();
        assert!(matches!(err, NbAutoexportError::Config(_)));

        let err = NbAutoexportConfig::from_json(r#"{"clean": {"exclude": [], "recursive": true}}"#)
            .unwrap_err();
        assert!(matches!(err, NbAutoexportError::Config(_)));
    }

    #[test]
    fn test_rejects_invalid_values() {
        assert!(NbAutoexportConfig::from_json(r#"{"export_formats": ["docx"]}"#).is_err());
        assert!(NbAutoexportConfig::from_json(r#"{"organize_by": "date"}"#).is_err());
        assert!(NbAutoexportConfig::from_json(r#"{"export_formats": []}"#).is_err());
        assert!(NbAutoexportConfig::from_json("not json").is_err());
    }

    #[test]
    fn test_duplicate_formats_collapse() {
        let config =
            NbAutoexportConfig::from_json(r#"{"export_formats": ["html", "script", "html"]}"#)
                .unwrap();
        assert_eq!(
            config.export_formats,
            vec![ExportFormat::Html, ExportFormat::Script]
        );
    }

    #[test]
    fn test_load_missing() {
        let tmp = TempDir::new().unwrap();
        let err = load(&sentinel_path(tmp.path())).unwrap_err();
        assert!(matches!(err, NbAutoexportError::MissingConfig { .. }));
        assert!(load_if_present(tmp.path()).unwrap().is_none());
    }
}
