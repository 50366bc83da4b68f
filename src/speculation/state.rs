//! Speculation status and counters

use serde::{Deserialize, Serialize};

/// Lifecycle state of one watched target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SpeculationStatus {
    /// Nothing running, nothing cached
    #[default]
    Idle,

    /// Action in flight ahead of a commit
    Speculating,

    /// Action finished; result cached awaiting commit
    Ready,

    /// User committed; terminal for the current cycle
    Committed,
}

impl SpeculationStatus {
    /// Get human-readable description
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "No speculative work",
            Self::Speculating => "Speculative action in flight",
            Self::Ready => "Result cached, waiting for commit",
            Self::Committed => "Committed by user",
        }
    }

    /// Check whether ticks still drive this state
    pub fn accepts_ticks(&self) -> bool {
        !matches!(self, Self::Committed)
    }
}

impl std::fmt::Display for SpeculationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Speculating => write!(f, "speculating"),
            Self::Ready => write!(f, "ready"),
            Self::Committed => write!(f, "committed"),
        }
    }
}

impl std::str::FromStr for SpeculationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(Self::Idle),
            "speculating" => Ok(Self::Speculating),
            "ready" => Ok(Self::Ready),
            "committed" => Ok(Self::Committed),
            _ => Err(format!("Unknown speculation status: {}", s)),
        }
    }
}

/// How a commit was served
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CommitServe {
    /// Result was already cached
    Cached,
    /// Joined a speculation already in flight
    Joined,
    /// No speculation; action started on commit
    Cold,
}

impl std::fmt::Display for CommitServe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Cached => write!(f, "cached"),
            Self::Joined => write!(f, "joined"),
            Self::Cold => write!(f, "cold"),
        }
    }
}

/// Per-controller counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SpeculationStats {
    /// Actions started by a tick
    pub speculations_started: u64,
    /// Speculations cancelled because the score dropped
    pub speculations_aborted: u64,
    /// Cached results discarded after the grace period
    pub results_evicted: u64,
    /// Actions that failed (not counting cancellation)
    pub actions_failed: u64,
    /// Commits served from the cache
    pub commit_hits: u64,
    /// Commits that joined an in-flight speculation
    pub commit_joins: u64,
    /// Commits that had to start the action themselves
    pub commit_cold: u64,
}

impl SpeculationStats {
    /// Total commits
    pub fn commits(&self) -> u64 {
        self.commit_hits + self.commit_joins + self.commit_cold
    }

    /// Fraction of commits that benefited from speculation
    pub fn hit_rate(&self) -> f64 {
        let commits = self.commits();
        if commits == 0 {
            return 0.0;
        }
        (self.commit_hits + self.commit_joins) as f64 / commits as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse_roundtrip() {
        for status in [
            SpeculationStatus::Idle,
            SpeculationStatus::Speculating,
            SpeculationStatus::Ready,
            SpeculationStatus::Committed,
        ] {
            assert_eq!(status.to_string().parse::<SpeculationStatus>(), Ok(status));
        }
        assert!("bogus".parse::<SpeculationStatus>().is_err());
    }

    #[test]
    fn test_only_committed_ignores_ticks() {
        assert!(SpeculationStatus::Idle.accepts_ticks());
        assert!(SpeculationStatus::Speculating.accepts_ticks());
        assert!(SpeculationStatus::Ready.accepts_ticks());
        assert!(!SpeculationStatus::Committed.accepts_ticks());
        assert!(!SpeculationStatus::Ready.description().is_empty());
    }

    #[test]
    fn test_hit_rate() {
        let stats = SpeculationStats {
            commit_hits: 2,
            commit_joins: 1,
            commit_cold: 1,
            ..Default::default()
        };
        assert_eq!(stats.commits(), 4);
        assert!((stats.hit_rate() - 0.75).abs() < f64::EPSILON);
        assert_eq!(SpeculationStats::default().hit_rate(), 0.0);
    }
}
