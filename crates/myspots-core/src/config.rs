//! Application configuration
//!
//! Configuration is loaded from:
//! 1. Default values
//! 2. Config file (~/.config/myspots/config.toml)
//! 3. Environment variables (MYSPOTS_* prefix)
//!
//! Environment variables take precedence over config file values.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variable prefix
const ENV_PREFIX: &str = "MYSPOTS";

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Google Maps API key (Places + Geocoding)
    #[serde(default)]
    pub google_api_key: String,

    /// Airtable API key
    #[serde(default)]
    pub airtable_api_key: String,

    /// Airtable base containing the places and categories tables
    #[serde(default)]
    pub airtable_base_id: String,

    /// Name of the places table
    #[serde(default = "default_places_table")]
    pub places_table: String,

    /// Name of the categories table
    #[serde(default = "default_categories_table")]
    pub categories_table: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            google_api_key: String::new(),
            airtable_api_key: String::new(),
            airtable_base_id: String::new(),
            places_table: default_places_table(),
            categories_table: default_categories_table(),
        }
    }
}

impl Config {
    /// Load configuration from default location and environment
    ///
    /// Order of precedence (highest to lowest):
    /// 1. Environment variables (MYSPOTS_GOOGLE_API_KEY, MYSPOTS_AIRTABLE_API_KEY, ...)
    /// 2. Config file (~/.config/myspots/config.toml or MYSPOTS_CONFIG)
    /// 3. Default values
    pub fn load() -> Result<Self> {
        Self::load_from_path(&Self::config_file_path())
    }

    /// Load configuration from a specific path
    ///
    /// Environment variables are still applied as overrides.
    /// If the file doesn't exist, defaults are used.
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {:?}", path))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?
        } else {
            Self::default()
        };

        config.apply_env_overrides();
        Ok(config)
    }

    /// Load configuration from a TOML string (useful for testing)
    pub fn load_from_str(toml_content: &str) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_content).context("Failed to parse config TOML")?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var(format!("{}_GOOGLE_API_KEY", ENV_PREFIX)) {
            self.google_api_key = val;
        }

        if let Ok(val) = std::env::var(format!("{}_AIRTABLE_API_KEY", ENV_PREFIX)) {
            self.airtable_api_key = val;
        }

        if let Ok(val) = std::env::var(format!("{}_AIRTABLE_BASE_ID", ENV_PREFIX)) {
            self.airtable_base_id = val;
        }

        if let Ok(val) = std::env::var(format!("{}_PLACES_TABLE", ENV_PREFIX)) {
            if !val.is_empty() {
                self.places_table = val;
            }
        }

        if let Ok(val) = std::env::var(format!("{}_CATEGORIES_TABLE", ENV_PREFIX)) {
            if !val.is_empty() {
                self.categories_table = val;
            }
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_file_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;
        std::fs::write(&config_path, content)
            .with_context(|| format!("Failed to write config file: {:?}", config_path))?;
        Ok(())
    }

    /// Get the config file path
    ///
    /// Can be overridden with MYSPOTS_CONFIG environment variable
    pub fn config_file_path() -> PathBuf {
        if let Ok(path) = std::env::var(format!("{}_CONFIG", ENV_PREFIX)) {
            return PathBuf::from(path);
        }

        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("myspots")
            .join("config.toml")
    }
}

fn default_places_table() -> String {
    "places".to_string()
}

fn default_categories_table() -> String {
    "categories".to_string()
}
