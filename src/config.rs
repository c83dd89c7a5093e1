use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

use crate::Locale;
use crate::macros::DEFAULT_INCLUDE_DEPTH_LIMIT;

/// Run configuration for templater
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Locale of the date/time macros and the table of contents title
    pub locale: Locale,
    /// Maximal nesting of `%INCLUDE(...)%`
    pub include_depth_limit: usize,
    /// Overrides the locale's table of contents title
    pub toc_title: Option<String>,
    pub verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            locale: Locale::default(),
            include_depth_limit: DEFAULT_INCLUDE_DEPTH_LIMIT,
            toc_title: None,
            verbose: false,
        }
    }
}

impl Config {
    /// Load config from config directory
    pub fn load() -> Result<Self> {
        if let Some(config_path) = Self::get_config_path() {
            if config_path.exists() {
                let content = fs::read_to_string(&config_path)?;
                return Self::from_toml(&content);
            }
        }

        // Return default config if no file found
        Ok(Config::default())
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Save config to config directory
    pub fn save(&self) -> Result<()> {
        if let Some(config_path) = Self::get_config_path() {
            if let Some(parent) = config_path.parent() {
                fs::create_dir_all(parent)?;
            }

            let content = toml::to_string_pretty(self)?;
            fs::write(&config_path, content)?;
        }

        Ok(())
    }

    /// Get the path to the config file
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("templater").join("config.toml"))
    }

    /// Initialize default config file
    pub fn init_default() -> Result<()> {
        Config::default().save()
    }

    pub fn toc_title(&self) -> String {
        self.toc_title
            .clone()
            .unwrap_or_else(|| self.locale.toc_title().to_string())
    }
}
