// SPDX-License-Identifier: AGPL-3.0-or-later
// SPDX-FileCopyrightText: 2025 Jonathan D.A. Jewell
//! Configuration management

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::graffle::DEFAULT_APP;

/// Application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Name of the OmniGraffle application to automate
    pub app: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            app: DEFAULT_APP.to_string(),
        }
    }
}

/// Path of the configuration file, when a platform config directory exists
#[must_use]
pub fn config_file() -> Option<PathBuf> {
    directories::ProjectDirs::from("org", "hyperpolymath", "ogexport")
        .map(|dirs| dirs.config_dir().join("config.toml"))
}

/// Load configuration from disk or use defaults
pub fn load() -> Result<Config> {
    let Some(path) = config_file() else {
        return Ok(Config::default());
    };
    if !path.is_file() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    toml::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_app() {
        assert_eq!(Config::default().app, DEFAULT_APP);
    }

    #[test]
    fn test_parse_config() {
        let config: Config = toml::from_str(r#"app = "OmniGraffle 7""#).unwrap();
        assert_eq!(config.app, "OmniGraffle 7");
    }

    #[test]
    fn test_missing_keys_fall_back_to_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.app, DEFAULT_APP);
    }
}
