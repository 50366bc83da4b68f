//! Configuration type definitions

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::intent::TargetRect;

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level ("trace", "debug", "info", "warn", "error")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("pretty", "compact", "json")
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Also write logs to this file
    #[serde(default)]
    pub file: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

/// A watched target for the replay harness
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    /// Unique target name (used by trace commits and in reports)
    pub name: String,

    /// Left edge (px)
    pub left: f64,

    /// Top edge (px)
    pub top: f64,

    /// Right edge (px)
    pub right: f64,

    /// Bottom edge (px)
    pub bottom: f64,

    /// Simulated action latency (ms)
    #[serde(default = "default_latency_ms")]
    pub latency_ms: u64,

    /// Make the simulated action fail after its latency
    #[serde(default)]
    pub fail: bool,
}

fn default_latency_ms() -> u64 {
    150
}

impl TargetConfig {
    /// Target bounds
    pub fn rect(&self) -> TargetRect {
        TargetRect::new(self.left, self.top, self.right, self.bottom)
    }
}
