use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

use crate::app::{APP_ID, CONFIG_FILE_NAME, LOG_ENV};

/// Host configuration settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Directory holding the web UI, relative to the deployment base
    pub web_dir: String,

    /// Font directory, relative to `web_dir`
    pub font_dir: String,

    /// Cursor directory, relative to `web_dir`
    pub cursor_dir: String,

    /// Document loaded into the main window on startup
    pub entry_document: String,

    /// Cursor files the UI expects to find under `cursor_dir`
    pub required_cursors: Vec<String>,

    /// Maximize the main window before showing it
    pub start_maximized: bool,

    /// Max tracing level (trace, debug, info, warn, error)
    pub log_level: String,

    pub launch: LaunchConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LaunchConfig {
    /// Extensions `open-local-file` may execute. Empty means no restriction.
    pub allowed_extensions: Vec<String>,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            web_dir: "Web-Files".to_string(),
            font_dir: "html".to_string(),
            cursor_dir: "cursor".to_string(),
            entry_document: "index.html".to_string(),
            required_cursors: vec![
                "normal.ani".to_string(),
                "text.ani".to_string(),
                "link.ani".to_string(),
            ],
            start_maximized: true,
            log_level: "info".to_string(),
            launch: LaunchConfig::default(),
        }
    }
}

impl HostConfig {
    /// Load configuration from file, then apply environment overrides
    pub fn load() -> Self {
        let mut config = match Self::config_path() {
            Some(path) if !path.exists() => {
                // First run: leave an editable copy of the defaults behind
                let config = Self::default();
                if let Err(e) = config.save_to(&path) {
                    warn!("Failed to write default host config: {:#}", e);
                }
                config
            }
            Some(path) => Self::load_from(&path),
            None => Self::default(),
        };

        if let Ok(level) = std::env::var(LOG_ENV) {
            let level = level.trim();
            if !level.is_empty() {
                config.log_level = level.to_string();
            }
        }

        config
    }

    /// Load configuration from a specific file, falling back to defaults
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(config) => {
                    info!("Loaded host config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Ignoring malformed host config {:?}: {}", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read host config {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory {:?}", parent))?;
        }

        let contents =
            serde_json::to_string_pretty(self).context("Failed to serialize host config")?;
        std::fs::write(path, contents)
            .with_context(|| format!("Failed to write host config {:?}", path))?;

        info!("Saved host config to {:?}", path);
        Ok(())
    }

    /// `<config_dir>/<app id>/host.config.json`
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_ID).join(CONFIG_FILE_NAME))
    }

    /// Parsed `log_level`; unknown values fall back to INFO
    pub fn log_level(&self) -> tracing::Level {
        tracing::Level::from_str(self.log_level.trim()).unwrap_or(tracing::Level::INFO)
    }
}
