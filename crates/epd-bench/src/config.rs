//! Configuration file loading for the bench tool.
//!
//! Engines and default search settings live in a `bench.toml` file in the
//! working directory. Everything is optional: a missing file yields the
//! built-in defaults, and engine names that are not configured are treated
//! as executable paths by the caller.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading or parsing configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),
    /// Failed to parse the configuration file as valid TOML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    /// Requested engine was not found in the configuration.
    #[error("engine not found in config: {0}")]
    EngineNotFound(String),
}

/// A named engine entry.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    /// Path to the engine executable.
    pub path: PathBuf,
    /// Hash size override for this engine, in megabytes.
    pub hash_mb: Option<u32>,
    /// Thread count override for this engine.
    pub threads: Option<u32>,
}

/// Search settings applied when neither the command line nor the engine
/// entry says otherwise.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SearchDefaults {
    #[serde(default = "default_depth")]
    pub depth: u32,
    #[serde(default = "default_hash_mb")]
    pub hash_mb: u32,
    #[serde(default = "default_threads")]
    pub threads: u32,
}

fn default_depth() -> u32 {
    8
}

fn default_hash_mb() -> u32 {
    64
}

fn default_threads() -> u32 {
    1
}

fn default_summary_file() -> PathBuf {
    PathBuf::from("bench_summary.txt")
}

impl Default for SearchDefaults {
    fn default() -> Self {
        Self {
            depth: default_depth(),
            hash_mb: default_hash_mb(),
            threads: default_threads(),
        }
    }
}

/// Main configuration structure, loaded from `bench.toml`.
#[derive(Debug, Deserialize, Serialize)]
pub struct BenchConfig {
    /// Map of engine names to their configurations.
    #[serde(default)]
    pub engines: HashMap<String, EngineConfig>,
    /// Fallback search settings.
    #[serde(default)]
    pub defaults: SearchDefaults,
    /// Where the plain-text summary block is appended after each run.
    #[serde(default = "default_summary_file")]
    pub summary_file: PathBuf,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            engines: HashMap::new(),
            defaults: SearchDefaults::default(),
            summary_file: default_summary_file(),
        }
    }
}

impl BenchConfig {
    /// Loads the configuration from disk.
    ///
    /// A missing file is not an error; it yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Read`] if the file exists but cannot be
    /// read, or [`ConfigError::Parse`] if it contains invalid TOML.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Returns the path to the configuration file.
    pub fn config_path() -> PathBuf {
        PathBuf::from("bench.toml")
    }

    /// Retrieves an engine configuration by name.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::EngineNotFound`] if no engine with the given
    /// name exists.
    pub fn get_engine(&self, name: &str) -> Result<&EngineConfig, ConfigError> {
        self.engines
            .get(name)
            .ok_or_else(|| ConfigError::EngineNotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_toml_config() {
        let toml_content = r#"
summary_file = "results/summary.txt"

[engines.stockfish]
path = "/usr/bin/stockfish"
hash_mb = 256
threads = 4

[engines.homebrew]
path = "/opt/engines/homebrew"

[defaults]
depth = 12
hash_mb = 128
"#;

        let config: BenchConfig = toml::from_str(toml_content).unwrap();

        assert_eq!(config.engines.len(), 2);

        let stockfish = config.engines.get("stockfish").unwrap();
        assert_eq!(stockfish.path, PathBuf::from("/usr/bin/stockfish"));
        assert_eq!(stockfish.hash_mb, Some(256));
        assert_eq!(stockfish.threads, Some(4));

        let homebrew = config.engines.get("homebrew").unwrap();
        assert_eq!(homebrew.hash_mb, None);
        assert_eq!(homebrew.threads, None);

        assert_eq!(config.defaults.depth, 12);
        assert_eq!(config.defaults.hash_mb, 128);
        assert_eq!(config.defaults.threads, 1); // default
        assert_eq!(config.summary_file, PathBuf::from("results/summary.txt"));
    }

    #[test]
    fn test_empty_config_has_defaults() {
        let config: BenchConfig = toml::from_str("").unwrap();

        assert!(config.engines.is_empty());
        assert_eq!(config.defaults.depth, 8);
        assert_eq!(config.defaults.hash_mb, 64);
        assert_eq!(config.defaults.threads, 1);
        assert_eq!(config.summary_file, PathBuf::from("bench_summary.txt"));
    }

    #[test]
    fn test_get_engine_returns_error_for_unknown_engine() {
        let config = BenchConfig::default();

        match config.get_engine("nonexistent") {
            Err(ConfigError::EngineNotFound(name)) => assert_eq!(name, "nonexistent"),
            _ => panic!("Expected EngineNotFound error"),
        }
    }

    #[test]
    fn test_get_engine_returns_config_for_existing_engine() {
        let toml_content = r#"
[engines.mybot]
path = "/path/to/bot"
threads = 2
"#;

        let config: BenchConfig = toml::from_str(toml_content).unwrap();

        let engine = config.get_engine("mybot").unwrap();
        assert_eq!(engine.path, PathBuf::from("/path/to/bot"));
        assert_eq!(engine.threads, Some(2));
    }

    #[test]
    fn test_config_path_returns_expected_path() {
        assert_eq!(BenchConfig::config_path(), PathBuf::from("bench.toml"));
    }

    #[test]
    fn test_engine_config_serialization_roundtrip() {
        let engine = EngineConfig {
            path: PathBuf::from("/usr/bin/stockfish"),
            hash_mb: Some(512),
            threads: None,
        };

        let serialized = toml::to_string(&engine).unwrap();
        let deserialized: EngineConfig = toml::from_str(&serialized).unwrap();

        assert_eq!(deserialized.path, engine.path);
        assert_eq!(deserialized.hash_mb, engine.hash_mb);
        assert_eq!(deserialized.threads, engine.threads);
    }
}
