//! Configuration management for notes CLI

use anyhow::{Context, Result};
use notestore::{DecodeOptions, MetadataConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::cli::OutputFormat;

/// Location of the Notes store relative to the home directory
const DEFAULT_STORE: &str = "Library/Group Containers/group.com.apple.notes/NoteStore.sqlite";

/// Default number of notes per search
pub const DEFAULT_LIMIT: usize = 20;

#[derive(Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct Config {
    pub database: Option<PathBuf>,
    pub format: Option<OutputFormat>,
    pub limit: Option<usize>,
    pub strict: bool,
    pub metadata: MetadataConfig,
}

impl Config {
    /// Get the path to the config file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Could not determine config directory")?
            .join("notestore");

        Ok(config_dir.join("config.toml"))
    }

    /// Load configuration from file, or defaults if it doesn't exist
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config from {}", config_path.display()))?;

        toml::from_str(&contents).context("Failed to parse config file")
    }

    /// Save configuration to file
    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory at {}", parent.display())
            })?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(config_path, contents)
            .with_context(|| format!("Failed to write config to {}", config_path.display()))?;

        Ok(())
    }

    /// Database path: `--db` flag (or `NOTESTORE_DB`), then config, then the platform default
    pub fn database_path(&self, flag: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = flag {
            return Ok(path.to_path_buf());
        }
        if let Some(path) = &self.database {
            return Ok(path.clone());
        }
        default_database_path().context("Could not determine home directory for the Notes store")
    }

    pub fn output_format(&self, flag: Option<OutputFormat>) -> OutputFormat {
        flag.or(self.format).unwrap_or_default()
    }

    pub fn search_limit(&self, flag: Option<usize>) -> usize {
        flag.or(self.limit).unwrap_or(DEFAULT_LIMIT)
    }

    pub fn decode_options(&self, strict_flag: bool) -> DecodeOptions {
        DecodeOptions {
            strict: strict_flag || self.strict,
            metadata: self.metadata.clone(),
        }
    }
}

pub fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(DEFAULT_STORE))
}
