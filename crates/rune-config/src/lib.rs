//! Rune configuration system
//!
//! This crate provides centralized configuration management for the Rune
//! transition runtime, loading settings from `rune.toml` with environment
//! variable overrides.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Default capacity the transition registries start with and shrink back to.
pub const DEFAULT_INITIAL_CAPACITY: usize = 8;

/// Errors produced while loading configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct RuneConfig {
    /// Transition engine settings
    pub transitions: TransitionConfig,
    /// Headless demo driver settings
    pub demo: DemoConfig,
}

/// Transition engine configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TransitionConfig {
    /// Capacity each per-kind registry starts with, and returns to after a full clear
    pub initial_capacity: usize,
    /// Run the registry/counter consistency checks at the end of every update
    pub check_invariants: bool,
    /// Trace every dispatched lifecycle event
    pub log_events: bool,
}

/// Demo driver configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DemoConfig {
    /// Number of simulated frames
    pub frames: u32,
    /// Simulated frame interval in milliseconds
    pub frame_interval_ms: i64,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            initial_capacity: DEFAULT_INITIAL_CAPACITY,
            check_invariants: cfg!(debug_assertions),
            log_events: false,
        }
    }
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            frames: 90,
            frame_interval_ms: 16,
        }
    }
}

fn env_flag(val: &str) -> bool {
    val == "1" || val.eq_ignore_ascii_case("true")
}

impl RuneConfig {
    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(toml::from_str(&content)?)
    }

    /// Load configuration from the default location (rune.toml in the current directory)
    /// or return default configuration if file doesn't exist or fails to parse
    pub fn load_or_default() -> Self {
        match Self::load_from_file("rune.toml") {
            Ok(config) => config,
            Err(ConfigError::Read { .. }) => Self::default(),
            Err(err) => {
                log::warn!("{err}; falling back to defaults");
                Self::default()
            }
        }
    }

    /// Merge configuration with environment variables
    ///
    /// Environment variables take precedence over configuration file values.
    pub fn merge_with_env(&mut self) {
        if let Ok(val) = std::env::var("RUNE_TRANSITION_CAPACITY") {
            match val.parse::<usize>() {
                Ok(capacity) => self.transitions.initial_capacity = capacity,
                Err(_) => log::warn!("Ignoring RUNE_TRANSITION_CAPACITY={val}: not an integer"),
            }
        }
        if let Ok(val) = std::env::var("RUNE_TRANSITION_CHECKS") {
            self.transitions.check_invariants = env_flag(&val);
        }
        if let Ok(val) = std::env::var("RUNE_TRANSITION_LOG_EVENTS") {
            self.transitions.log_events = env_flag(&val);
        }

        if let Ok(val) = std::env::var("RUNE_DEMO_FRAMES") {
            if let Ok(frames) = val.parse::<u32>() {
                self.demo.frames = frames;
            }
        }
        if let Ok(val) = std::env::var("RUNE_DEMO_FRAME_INTERVAL") {
            if let Ok(interval) = val.parse::<i64>() {
                self.demo.frame_interval_ms = interval;
            }
        }
    }

    /// Load configuration with environment variable overrides
    ///
    /// This is the recommended way to load configuration:
    /// 1. Load from rune.toml (or use defaults if not found)
    /// 2. Override with environment variables if present
    pub fn load() -> Self {
        let mut config = Self::load_or_default();
        config.merge_with_env();
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = RuneConfig::default();
        assert_eq!(config.transitions.initial_capacity, DEFAULT_INITIAL_CAPACITY);
        assert!(!config.transitions.log_events);
        assert_eq!(config.demo.frame_interval_ms, 16);
    }

    #[test]
    fn test_toml_serialization() {
        let config = RuneConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        let parsed: RuneConfig = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed.transitions, config.transitions);
        assert_eq!(parsed.demo, config.demo);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let parsed: RuneConfig = toml::from_str(
            r#"
            [transitions]
            log_events = true
            "#,
        )
        .unwrap();
        assert!(parsed.transitions.log_events);
        assert_eq!(parsed.transitions.initial_capacity, DEFAULT_INITIAL_CAPACITY);
        assert_eq!(parsed.demo.frames, 90);
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = RuneConfig::load_from_file("does/not/exist/rune.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn test_invalid_toml_is_parse_error() {
        let dir = std::env::temp_dir().join(format!("rune-config-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("rune.toml");
        std::fs::write(&path, "[transitions\ninitial_capacity = ").unwrap();

        let err = RuneConfig::load_from_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_load_or_default() {
        // Should not panic even if rune.toml doesn't exist
        let config = RuneConfig::load_or_default();
        assert!(config.demo.frame_interval_ms > 0);
    }

    #[test]
    fn test_merge_with_env() {
        unsafe {
            std::env::set_var("RUNE_TRANSITION_CAPACITY", "32");
            std::env::set_var("RUNE_TRANSITION_LOG_EVENTS", "true");
            std::env::set_var("RUNE_TRANSITION_CHECKS", "0");
        }

        let mut config = RuneConfig::default();
        config.merge_with_env();

        assert_eq!(config.transitions.initial_capacity, 32);
        assert!(config.transitions.log_events);
        assert!(!config.transitions.check_invariants);

        unsafe {
            std::env::remove_var("RUNE_TRANSITION_CAPACITY");
            std::env::remove_var("RUNE_TRANSITION_LOG_EVENTS");
            std::env::remove_var("RUNE_TRANSITION_CHECKS");
        }
    }
}
