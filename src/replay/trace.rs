//! Recorded pointer traces
//!
//! JSON format:
//!
//! ```json
//! {
//!   "samples": [{ "x": 0, "y": 250, "t": 0 }, { "x": 50, "y": 250, "t": 16 }],
//!   "commits": [{ "target": "pricing", "t": 420 }]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::Config;
use crate::intent::PositionSample;

/// A user commit (click) scheduled in a trace
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceCommit {
    /// Target name from the config
    pub target: String,
    /// Timestamp in the trace's clock (ms)
    pub t: f64,
}

/// Pointer samples plus scheduled commits
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointerTrace {
    /// Samples in non-decreasing `t` order
    pub samples: Vec<PositionSample>,
    /// Commits to issue during the replay
    #[serde(default)]
    pub commits: Vec<TraceCommit>,
}

/// One replay event, merged from samples and commits
#[derive(Debug, Clone, PartialEq)]
pub enum TraceEvent {
    /// Pointer moved
    Sample(PositionSample),
    /// User committed to a target
    Commit(TraceCommit),
}

impl TraceEvent {
    /// Timestamp of the event
    pub fn t(&self) -> f64 {
        match self {
            Self::Sample(s) => s.t,
            Self::Commit(c) => c.t,
        }
    }
}

impl PointerTrace {
    /// Load a trace from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read trace file: {}", path.display()))?;
        serde_json::from_str(&content).context("Failed to parse trace file")
    }

    /// Check ordering and that every commit names a configured target
    pub fn validate(&self, config: &Config) -> Result<()> {
        if let Some(pair) = self.samples.windows(2).find(|w| w[1].t < w[0].t) {
            anyhow::bail!(
                "Trace samples out of order: t={} follows t={}",
                pair[1].t,
                pair[0].t
            );
        }
        for commit in &self.commits {
            if config.target(&commit.target).is_none() {
                anyhow::bail!("Trace commit references unknown target '{}'", commit.target);
            }
        }
        Ok(())
    }

    /// Timestamp of the earliest event
    pub fn start_t(&self) -> f64 {
        self.samples
            .iter()
            .map(|s| s.t)
            .chain(self.commits.iter().map(|c| c.t))
            .fold(f64::INFINITY, f64::min)
    }

    /// Span between first and last event (ms)
    pub fn duration_ms(&self) -> f64 {
        let end = self
            .samples
            .iter()
            .map(|s| s.t)
            .chain(self.commits.iter().map(|c| c.t))
            .fold(f64::NEG_INFINITY, f64::max);
        let start = self.start_t();
        if end.is_finite() && start.is_finite() {
            end - start
        } else {
            0.0
        }
    }

    /// Samples and commits merged in time order; a commit at the same
    /// timestamp as a sample comes after it
    pub fn events(&self) -> Vec<TraceEvent> {
        let mut events: Vec<TraceEvent> = self
            .samples
            .iter()
            .copied()
            .map(TraceEvent::Sample)
            .chain(self.commits.iter().cloned().map(TraceEvent::Commit))
            .collect();
        // Stable sort keeps samples ahead of commits on ties
        events.sort_by(|a, b| a.t().total_cmp(&b.t()));
        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TargetConfig;

    fn trace() -> PointerTrace {
        PointerTrace {
            samples: vec![
                PositionSample::new(0.0, 0.0, 100.0),
                PositionSample::new(1.0, 0.0, 116.0),
            ],
            commits: vec![TraceCommit {
                target: "a".to_string(),
                t: 116.0,
            }],
        }
    }

    #[test]
    fn test_events_merge_in_order() {
        let events = trace().events();
        assert_eq!(events.len(), 3);
        assert!(matches!(events[1], TraceEvent::Sample(_)));
        assert!(matches!(events[2], TraceEvent::Commit(_)));
    }

    #[test]
    fn test_duration() {
        assert_eq!(trace().duration_ms(), 16.0);
        assert_eq!(PointerTrace::default().duration_ms(), 0.0);
    }

    #[test]
    fn test_validate_unknown_target() {
        let config = Config::default_config();
        assert!(trace().validate(&config).is_err());

        let mut config = Config::default_config();
        config.targets.push(TargetConfig {
            name: "a".to_string(),
            left: 0.0,
            top: 0.0,
            right: 1.0,
            bottom: 1.0,
            latency_ms: 1,
            fail: false,
        });
        assert!(trace().validate(&config).is_ok());
    }

    #[test]
    fn test_parse_json() {
        let json = r#"{"samples":[{"x":1,"y":2,"t":3}]}"#;
        let trace: PointerTrace = serde_json::from_str(json).unwrap();
        assert_eq!(trace.samples[0], PositionSample::new(1.0, 2.0, 3.0));
        assert!(trace.commits.is_empty());
    }
}
