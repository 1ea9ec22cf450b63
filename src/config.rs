use serde::{Deserialize, Serialize};
use std::{
    fs::{read_to_string, write},
    path::{Path, PathBuf},
};

use crate::{error::NotewalkError, hierarchy::PATH_SEPARATOR, retry::RetryPolicy};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub path_separator: String,
}

impl Default for IndexSettings {
    fn default() -> Self {
        IndexSettings {
            path_separator: PATH_SEPARATOR.to_string(),
        }
    }
}

/// Settings file contents.
///
/// ```toml
/// snapshot = "workspace.json"
///
/// [retry]
/// max_attempts = 3
/// base_delay_ms = 250
///
/// [index]
/// path_separator = "/"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<PathBuf>,
    pub retry: RetryPolicy,
    pub index: IndexSettings,
}

impl Settings {
    /// Read settings from `path`, falling back to defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, NotewalkError> {
        let path = path.as_ref();
        tracing::debug!("Attempting to read settings from: {:?}", path);
        if !path.exists() {
            tracing::debug!("Settings file not found, using defaults.");
            return Ok(Settings::default());
        }
        let content = read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), NotewalkError> {
        tracing::debug!("Attempting to write settings to: {:?}", path.as_ref());
        let toml_string = toml::to_string(self)?;
        write(path, toml_string)?;
        Ok(())
    }
}
