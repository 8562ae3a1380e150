//! TOML settings file
//!
//! ```toml
//! [logging]
//! level = "debug"
//! format = "ext"
//! file = "/tmp/plugview.log"
//!
//! [plugins]
//! descriptor = "../config/config.yaml"
//! default_timeout_secs = 30
//!
//! [plugins.config]
//! param1 = "edges"
//! param2 = 3
//! ```
//!
//! Every key is optional. Unknown keys are rejected so typos surface early.

use crate::app::cli::args::Args;
use crate::core::logging::LogFormat;
use crate::plugin::types::PluginConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Descriptor used when neither flag nor settings name one
pub const DEFAULT_DESCRIPTOR: &str = "../config/config.yaml";

/// Task timeout used when neither flag nor settings name one
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Settings file does not exist: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read settings file '{}': {}", .path.display(), .cause)]
    Read { path: PathBuf, cause: String },

    #[error("Invalid settings file '{}': {}", .path.display(), .cause)]
    Parse { path: PathBuf, cause: String },
}

impl crate::core::error_handling::ContextualError for SettingsError {
    fn is_user_actionable(&self) -> bool {
        true
    }

    fn user_message(&self) -> Option<&str> {
        match self {
            SettingsError::NotFound(_) => Some("The specified settings file does not exist"),
            SettingsError::Read { .. } => Some("The settings file could not be read"),
            SettingsError::Parse { .. } => Some("The settings file is not valid TOML"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSettings {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
    pub file: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PluginSettings {
    pub descriptor: Option<PathBuf>,
    pub default_timeout_secs: Option<u64>,
    pub config: Option<PluginConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub logging: LoggingSettings,
    pub plugins: PluginSettings,
}

impl Settings {
    pub fn parse(text: &str, path: &Path) -> Result<Self, SettingsError> {
        toml::from_str(text).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            cause: e.to_string(),
        })
    }

    /// Default settings location: `<config_dir>/Plugview/plugview.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("Plugview").join("plugview.toml"))
    }

    /// Load settings
    ///
    /// An explicitly named file must exist. The default location is optional
    /// and yields default settings when absent.
    pub async fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        let path = match explicit {
            Some(path) if !path.exists() => return Err(SettingsError::NotFound(path.to_path_buf())),
            Some(path) => path.to_path_buf(),
            None => match Self::default_path() {
                Some(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };

        let text = tokio::fs::read_to_string(&path)
            .await
            .map_err(|e| SettingsError::Read {
                path: path.clone(),
                cause: e.to_string(),
            })?;
        let settings = Self::parse(&text, &path)?;
        log::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }
}

/// Effective options after merging flags over settings over defaults
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedOptions {
    pub log_level: Option<String>,
    pub log_format: LogFormat,
    pub log_file: Option<PathBuf>,
    pub descriptor: PathBuf,
    pub timeout: Duration,
    pub plugin_config: Option<PluginConfig>,
}

impl ResolvedOptions {
    pub fn resolve(args: &Args, settings: &Settings) -> Self {
        Self {
            log_level: args
                .log_level
                .clone()
                .or_else(|| settings.logging.level.clone()),
            log_format: args
                .log_format()
                .or(settings.logging.format)
                .unwrap_or_default(),
            log_file: args
                .log_file
                .clone()
                .or_else(|| settings.logging.file.clone()),
            descriptor: args
                .plugins
                .clone()
                .or_else(|| settings.plugins.descriptor.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DESCRIPTOR)),
            timeout: Duration::from_secs(
                args.timeout
                    .or(settings.plugins.default_timeout_secs)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            plugin_config: settings.plugins.config.clone(),
        }
    }
}
