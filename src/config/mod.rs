//! Configuration management
//!
//! Handles loading, validation, and merging of configuration from:
//! - TOML files
//! - Environment variables (through clap)
//! - CLI arguments
//!
//! Every field has a documented default, so a partial file (or none at all)
//! is valid.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

pub mod types;

pub use types::{LoggingConfig, TargetConfig};

use crate::sampler::SamplerConfig;
use crate::speculation::SpeculationConfig;

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Shared motion sampler
    #[serde(default)]
    pub sampler: SamplerConfig,
    /// Speculation controllers
    #[serde(default)]
    pub speculation: SpeculationConfig,
    /// Logging
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Watched targets
    #[serde(default)]
    pub targets: Vec<TargetConfig>,
}

impl Config {
    /// Load configuration from file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;
        Ok(config)
    }

    /// Create default configuration
    pub fn default_config() -> Self {
        Self::default()
    }

    /// Default config file location (`$XDG_CONFIG_HOME/intent-prefetch/config.toml`)
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("intent-prefetch")
            .join("config.toml")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.sampler.buffer_size == 0 {
            anyhow::bail!("sampler.buffer_size must be positive");
        }
        if self.sampler.tick_hz == 0 || self.sampler.tick_hz > 1000 {
            anyhow::bail!("sampler.tick_hz must be in 1..=1000, got {}", self.sampler.tick_hz);
        }

        self.speculation
            .validate()
            .context("Invalid [speculation] section")?;

        if self.speculation.history_size > self.sampler.buffer_size {
            anyhow::bail!(
                "speculation.history_size ({}) cannot exceed sampler.buffer_size ({})",
                self.speculation.history_size,
                self.sampler.buffer_size
            );
        }

        match self.logging.format.as_str() {
            "pretty" | "compact" | "json" => {}
            _ => anyhow::bail!("Invalid log format: {}", self.logging.format),
        }

        let mut names = HashSet::new();
        for target in &self.targets {
            if !names.insert(target.name.as_str()) {
                anyhow::bail!("Duplicate target name: {}", target.name);
            }
            if !target.rect().is_valid() {
                anyhow::bail!("Target '{}' has inverted bounds", target.name);
            }
        }

        Ok(())
    }

    /// Override config with CLI arguments
    pub fn with_overrides(mut self, sensitivity: Option<f64>, debug_logging: bool) -> Self {
        if let Some(sensitivity) = sensitivity {
            self.speculation.sensitivity = sensitivity;
        }
        if debug_logging {
            self.speculation.debug_logging = true;
        }

        self
    }

    /// Look up a target by name
    pub fn target(&self, name: &str) -> Option<&TargetConfig> {
        self.targets.iter().find(|t| t.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default_config();
        assert_eq!(config.sampler.buffer_size, 30);
        assert_eq!(config.speculation.sensitivity, 0.5);
        assert!(config.targets.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[speculation]
sensitivity = 0.7

[[targets]]
name = "pricing"
left = 200.0
top = 200.0
right = 300.0
bottom = 300.0
"#
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.speculation.sensitivity, 0.7);
        assert_eq!(config.speculation.grace_period_ms, 500);
        assert_eq!(config.sampler.tick_hz, 60);
        assert_eq!(config.target("pricing").map(|t| t.latency_ms), Some(150));
    }

    #[test]
    fn test_config_validation_history_exceeds_buffer() {
        let mut config = Config::default_config();
        config.speculation.history_size = 40;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_duplicate_target() {
        let mut config = Config::default_config();
        let target = TargetConfig {
            name: "a".to_string(),
            left: 0.0,
            top: 0.0,
            right: 10.0,
            bottom: 10.0,
            latency_ms: 10,
            fail: false,
        };
        config.targets = vec![target.clone(), target];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_validation_invalid_log_format() {
        let mut config = Config::default_config();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let config = Config::default_config().with_overrides(Some(0.8), true);
        assert_eq!(config.speculation.sensitivity, 0.8);
        assert!(config.speculation.debug_logging);
    }
}
