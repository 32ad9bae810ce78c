use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use ryuuji_parse::ParseOptions;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CliError;

const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

/// Top-level CLI configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub parser: ParseOptions,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub pretty: bool,
}

impl AppConfig {
    /// Load config: an explicit file, else the user file (if it exists),
    /// else the built-in defaults. Missing keys keep their defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, CliError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Self::config_path();
                if !path.exists() {
                    return Self::defaults();
                }
                path
            }
        };

        debug!(path = %path.display(), "Loading config");
        let content = std::fs::read_to_string(&path)
            .map_err(|e| CliError::Config(format!("{}: {e}", path.display())))?;
        toml::from_str(&content).map_err(|e| CliError::Config(e.to_string()))
    }

    fn defaults() -> Result<Self, CliError> {
        toml::from_str(DEFAULT_CONFIG).map_err(|e| CliError::Config(e.to_string()))
    }

    /// Path to user config file (XDG on Linux, AppData on Windows).
    pub fn config_path() -> PathBuf {
        ProjectDirs::from("", "", "ryuuji-parse")
            .map(|d| d.config_dir().join("config.toml"))
            .unwrap_or_else(|| PathBuf::from("config.toml"))
    }
}
