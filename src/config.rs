//! Application Configuration
//! Source locations, citation ids and rename tables, read from JSON.

use crate::data::RenameMap;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_PRODUCTION_FILE: &str =
    "classification-wise_production_during_the_year_2017-18.csv";
pub const DEFAULT_RAINFALL_FILE: &str = "RS_Session_257_AU_2106_A.ii_.csv";
pub const DEFAULT_OUTPUT_DIR: &str = "data";

/// One raw extract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub path: PathBuf,
    /// Citation attached to answers; defaults to the file name of `path`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_id: Option<String>,
    /// Raw header to canonical field table; the built-in table when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<RenameMap>,
}

impl SourceConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source_id: None,
            rename: None,
        }
    }

    fn default_production() -> Self {
        Self::new(DEFAULT_PRODUCTION_FILE)
    }

    fn default_rainfall() -> Self {
        Self::new(DEFAULT_RAINFALL_FILE)
    }

    pub fn source_id(&self) -> String {
        self.source_id.clone().unwrap_or_else(|| {
            self.path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.path.display().to_string())
        })
    }

    pub fn rename_or(&self, default: impl FnOnce() -> RenameMap) -> RenameMap {
        self.rename.clone().unwrap_or_else(default)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "SourceConfig::default_production")]
    pub production: SourceConfig,
    #[serde(default = "SourceConfig::default_rainfall")]
    pub rainfall: SourceConfig,
    /// Where normalized artifacts are written; `null` disables persistence.
    #[serde(default = "default_output_dir")]
    pub output_dir: Option<PathBuf>,
}

fn default_output_dir() -> Option<PathBuf> {
    Some(PathBuf::from(DEFAULT_OUTPUT_DIR))
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            production: SourceConfig::default_production(),
            rainfall: SourceConfig::default_rainfall(),
            output_dir: default_output_dir(),
        }
    }
}

impl AppConfig {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).context("invalid configuration JSON")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in config {}", path.display()))
    }
}
