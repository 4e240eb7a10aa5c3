//! Configuration management
//!
//! Manages selector bank configuration: storage location, feedback-loop
//! tuning, and resolver timeouts. Supplied wholesale to the core; the
//! core never writes it back during a run.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Storage settings
    #[serde(default)]
    pub storage: StorageConfig,
    /// Selector bank tuning
    #[serde(default)]
    pub selectors: SelectorConfig,
    /// Resolver settings
    #[serde(default)]
    pub resolver: ResolverConfig,
}

/// Where the selector database lives
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite database file
    #[serde(default = "default_database_path")]
    pub database_path: PathBuf,
}

fn default_database_path() -> PathBuf {
    data_dir()
        .unwrap_or_else(|_| PathBuf::from("."))
        .join("selectors.db")
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
        }
    }
}

/// Feedback-loop tuning for the selector bank
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelectorConfig {
    /// Master switch for selector intelligence
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Allow the resolver to generate new candidates on total failure
    /// (seam for future self-healing; no generator ships yet)
    #[serde(default)]
    pub auto_mutation: bool,
    /// Confidence assigned to candidates created at runtime
    #[serde(default = "default_confidence")]
    pub default_confidence: f64,
    /// Confidence gained per successful resolution
    #[serde(default = "default_promote_step")]
    pub promote_step: f64,
    /// Confidence lost per failed resolution
    #[serde(default = "default_degrade_step")]
    pub degrade_step: f64,
    /// Candidates below this confidence are eligible for retirement
    #[serde(default = "default_retire_confidence")]
    pub retire_confidence: f64,
    /// Retirement also requires strictly more than this many failures
    #[serde(default = "default_retire_failures")]
    pub retire_failures: u32,
}

fn default_true() -> bool {
    true
}

fn default_confidence() -> f64 {
    50.0
}

fn default_promote_step() -> f64 {
    5.0
}

fn default_degrade_step() -> f64 {
    10.0
}

fn default_retire_confidence() -> f64 {
    10.0
}

fn default_retire_failures() -> u32 {
    5
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            auto_mutation: false,
            default_confidence: default_confidence(),
            promote_step: default_promote_step(),
            degrade_step: default_degrade_step(),
            retire_confidence: default_retire_confidence(),
            retire_failures: default_retire_failures(),
        }
    }
}

/// Resolver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Default per-candidate probe timeout in milliseconds
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    5_000
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig::default(),
            selectors: SelectorConfig::default(),
            resolver: ResolverConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file, creating a default one if absent
    pub fn load() -> Result<Self> {
        let config_path = config_path()?;

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = config_path()?;
        let parent = config_path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(&config_path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "dom-pilot", "dom-pilot")
        .context("Failed to get project directories")?;
    Ok(base.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    let base = directories::ProjectDirs::from("com", "dom-pilot", "dom-pilot")
        .context("Failed to get project directories")?;
    Ok(base.data_dir().to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_feedback_contract() {
        let config = SelectorConfig::default();
        assert!(config.enabled);
        assert!(!config.auto_mutation);
        assert_eq!(config.default_confidence, 50.0);
        assert_eq!(config.promote_step, 5.0);
        assert_eq!(config.degrade_step, 10.0);
        assert_eq!(config.retire_confidence, 10.0);
        assert_eq!(config.retire_failures, 5);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: Config = toml::from_str(
            r#"
            [selectors]
            degrade_step = 20.0
            "#,
        )
        .unwrap();
        assert_eq!(config.selectors.degrade_step, 20.0);
        assert_eq!(config.selectors.promote_step, 5.0);
        assert_eq!(config.resolver.probe_timeout_ms, 5_000);
    }
}
