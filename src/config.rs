//! Configuration management
//!
//! This module handles loading and managing configuration from:
//! - Command-line arguments
//! - Configuration files (TOML)
//! - Defaults

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub builder: BuilderConfig,

    #[serde(default)]
    pub verifier: VerifierConfig,

    #[serde(default)]
    pub store: StoreConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// What to do when a model would be built from zero transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum EmptyModelPolicy {
    /// `initial_state` is the default literal, `states` stays empty
    #[default]
    AllowDetached,
    /// `initial_state` is the default literal and is inserted into `states`
    InsertInitial,
    /// Refuse to build
    Reject,
}

/// Graph builder settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuilderConfig {
    /// State names preferred as initial state, in priority order (compared lowercased)
    #[serde(default = "default_initial_state_preferences")]
    pub initial_state_preferences: Vec<String>,

    #[serde(default)]
    pub empty_model: EmptyModelPolicy,
}

/// Verifier settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifierConfig {
    /// Events every state is expected to handle once they appear in the model
    #[serde(default = "default_common_events")]
    pub common_events: Vec<String>,

    /// Warn when more elementary cycles than this are found
    #[serde(default = "default_cycle_warning_threshold")]
    pub cycle_warning_threshold: usize,

    /// Upper bound on search steps spent enumerating cycles
    #[serde(default = "default_max_cycle_search_steps")]
    pub max_cycle_search_steps: usize,
}

/// Model store configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoreConfig {
    /// Directory holding one JSON document per model
    pub directory: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

// Default value functions

fn default_initial_state_preferences() -> Vec<String> {
    ["idle", "init", "start", "initial", "ready"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_common_events() -> Vec<String> {
    ["error", "reset", "timeout"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_cycle_warning_threshold() -> usize {
    5
}

fn default_max_cycle_search_steps() -> usize {
    100_000
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            initial_state_preferences: default_initial_state_preferences(),
            empty_model: EmptyModelPolicy::default(),
        }
    }
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            common_events: default_common_events(),
            cycle_warning_threshold: default_cycle_warning_threshold(),
            max_cycle_search_steps: default_max_cycle_search_steps(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("Failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("Failed to parse config file {:?}: {}", path, e)))?;

        Ok(config)
    }

    /// Load configuration from default locations
    ///
    /// Searches in order:
    /// 1. ./autostate.toml
    /// 2. ~/.autostate/config.toml
    /// 3. /etc/autostate/config.toml
    pub fn load() -> Result<Self> {
        let mut paths = vec![PathBuf::from("autostate.toml")];
        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".autostate").join("config.toml"));
        }
        paths.push(PathBuf::from("/etc/autostate/config.toml"));

        for path in paths {
            if path.exists() {
                tracing::info!("Loading config from {:?}", path);
                return Self::from_file(path);
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Config::default())
    }

    /// Get store directory with fallback to default
    pub fn store_directory(&self) -> PathBuf {
        self.store.directory.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .map(|h| h.join(".autostate").join("models"))
                .unwrap_or_else(|| PathBuf::from("./autostate-models"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.builder.initial_state_preferences[0], "idle");
        assert_eq!(config.builder.empty_model, EmptyModelPolicy::AllowDetached);
        assert_eq!(config.verifier.common_events, vec!["error", "reset", "timeout"]);
        assert_eq!(config.verifier.cycle_warning_threshold, 5);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_toml_config() {
        let toml = r#"
[builder]
empty_model = "insert-initial"

[verifier]
common_events = ["error", "cancel"]
max_cycle_search_steps = 500

[store]
directory = "/var/lib/autostate"

[logging]
level = "debug"
        "#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.builder.empty_model, EmptyModelPolicy::InsertInitial);
        assert_eq!(config.builder.initial_state_preferences.len(), 5);
        assert_eq!(config.verifier.common_events, vec!["error", "cancel"]);
        assert_eq!(config.verifier.cycle_warning_threshold, 5);
        assert_eq!(config.verifier.max_cycle_search_steps, 500);
        assert_eq!(
            config.store_directory(),
            PathBuf::from("/var/lib/autostate")
        );
        assert_eq!(config.logging.level, "debug");
    }
}
