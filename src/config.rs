//! User configuration, read from `config.toml`
//!
//! ```toml
//! deck = "/home/me/decks/german.db"
//! max_study = 30
//! default_hardness = 2
//! editor = "nvim"
//! ```
//!
//! Every key is optional.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Directory name used under the platform config and data directories
const APP_DIR: &str = "recall";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Config directory not found")]
    ConfigDirNotFound,

    #[error("Data directory not found")]
    DataDirNotFound,

    #[error("default_hardness must be between 1 and 5, got {0}")]
    InvalidHardness(i32),

    #[error("max_study must be at least 1")]
    InvalidMaxStudy,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Deck opened when none is given on the command line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck: Option<PathBuf>,
    /// Maximum number of cards reviewed per study session
    pub max_study: usize,
    /// Hardness recorded when a rating is left blank
    pub default_hardness: i32,
    /// Editor command; falls back to $VISUAL, then $EDITOR
    #[serde(skip_serializing_if = "Option::is_none")]
    pub editor: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            deck: None,
            max_study: 20,
            default_hardness: 2,
            editor: None,
        }
    }
}

impl Config {
    /// Default location of the config file
    pub fn default_path() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join(APP_DIR).join("config.toml"))
            .ok_or(ConfigError::ConfigDirNotFound)
    }

    /// Load from the default location
    pub fn load_default() -> Result<Self> {
        Self::load(&Self::default_path()?)
    }

    /// Load from `path`; a missing file yields the defaults
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if !(1..=5).contains(&self.default_hardness) {
            return Err(ConfigError::InvalidHardness(self.default_hardness));
        }
        if self.max_study == 0 {
            return Err(ConfigError::InvalidMaxStudy);
        }
        Ok(())
    }

    /// Deck path from the config, or the default deck in the data directory
    pub fn deck_path(&self) -> Result<PathBuf> {
        match &self.deck {
            Some(path) => Ok(path.clone()),
            None => Self::default_deck_path(),
        }
    }

    pub fn default_deck_path() -> Result<PathBuf> {
        dirs::data_local_dir()
            .map(|p| p.join(APP_DIR).join("deck.db"))
            .ok_or(ConfigError::DataDirNotFound)
    }
}
