//! Configuration loading and validation for ctxjoin.
//!
//! Loads combinator defaults from `ctxjoin.toml` (or the file named by
//! `CTXJOIN_CONFIG`) with environment variable overrides. Validates all
//! settings before they are used.

use ctxjoin_core::Mode;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Defaults applied by `Combinator::from_config`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinatorConfig {
    /// Deadline arbitration policy
    #[serde(default)]
    pub mode: Mode,

    /// Override whether combined nodes arm their own deadline timer
    /// (unset = the mode's default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline_timer: Option<bool>,

    /// Label attached to every watcher task's tracing span
    #[serde(default = "default_watcher_label")]
    pub watcher_label: String,
}

fn default_watcher_label() -> String {
    "ctxjoin".into()
}

impl CombinatorConfig {
    /// Load configuration from `CTXJOIN_CONFIG`, or `ctxjoin.toml` in the
    /// working directory.
    ///
    /// Environment overrides (highest priority):
    /// - `CTXJOIN_MODE`
    /// - `CTXJOIN_DEADLINE_TIMER`
    /// - `CTXJOIN_WATCHER_LABEL`
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CTXJOIN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("ctxjoin.toml"));

        let mut config = Self::load_from(&path)?;
        config.apply_overrides(|name| std::env::var(name).ok())?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::debug!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::ParseError { reason, .. } => ConfigError::ParseError {
                path: path.to_path_buf(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::new(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Apply overrides from `lookup` (normally the process environment).
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(mode) = lookup("CTXJOIN_MODE") {
            self.mode = mode.parse().map_err(ConfigError::ValidationError)?;
        }

        if let Some(flag) = lookup("CTXJOIN_DEADLINE_TIMER") {
            self.deadline_timer = Some(parse_flag(&flag).ok_or_else(|| {
                ConfigError::ValidationError(format!(
                    "CTXJOIN_DEADLINE_TIMER must be true or false, got '{flag}'"
                ))
            })?);
        }

        if let Some(label) = lookup("CTXJOIN_WATCHER_LABEL") {
            self.watcher_label = label;
        }

        self.validate()
    }

    /// Whether nodes arm their own deadline timer under this configuration.
    pub fn arms_deadline_timer(&self) -> bool {
        self.deadline_timer
            .unwrap_or_else(|| self.mode.arms_deadline_timer())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.watcher_label.is_empty() {
            return Err(ConfigError::ValidationError(
                "watcher_label must not be empty".into(),
            ));
        }

        if self.watcher_label.chars().any(char::is_whitespace) {
            return Err(ConfigError::ValidationError(
                "watcher_label must not contain whitespace".into(),
            ));
        }

        Ok(())
    }

    /// Render the default configuration as TOML.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

impl Default for CombinatorConfig {
    fn default() -> Self {
        Self {
            mode: Mode::default(),
            deadline_timer: None,
            watcher_label: default_watcher_label(),
        }
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
