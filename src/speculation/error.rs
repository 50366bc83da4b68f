//! Speculation error types

use thiserror::Error;

/// Result type for speculative action outcomes
pub type Result<T> = std::result::Result<T, ActionError>;

/// Outcome of a failed or abandoned action
///
/// Cloneable so that one in-flight outcome can be shared between the
/// controller and any number of `commit()` callers.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ActionError {
    /// The action observed its cancellation token and stopped
    #[error("Action cancelled")]
    Cancelled,

    /// The action failed
    #[error("Action failed: {0}")]
    Failed(String),

    /// The action's task ended without producing an outcome
    #[error("Action abandoned: {0}")]
    Abandoned(String),
}

impl ActionError {
    /// Build a failure from any displayable error
    pub fn failed(err: impl std::fmt::Display) -> Self {
        Self::Failed(err.to_string())
    }

    /// True for expected cancellation
    pub fn is_cancellation(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl From<anyhow::Error> for ActionError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(format!("{:#}", err))
    }
}

/// Controller construction and runtime errors
#[derive(Error, Debug)]
pub enum SpeculationError {
    /// Configuration rejected by validation
    #[error("Invalid speculation config: {0}")]
    InvalidConfig(String),

    /// Per-controller window exceeds the sampler's buffer
    #[error("history_size {history_size} exceeds sampler buffer_size {buffer_size}")]
    HistoryExceedsBuffer {
        /// Requested window
        history_size: usize,
        /// Sampler capacity
        buffer_size: usize,
    },

    /// Controller used outside a tokio runtime
    #[error("No tokio runtime available to run speculative actions")]
    NoRuntime,
}
