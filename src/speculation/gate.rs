//! Environment gate
//!
//! Decides once, at activation, whether speculation may run on this device
//! at all. The heuristics behind the decision (power, bandwidth, cores) live
//! with the embedding application.

use async_trait::async_trait;

/// Capability check evaluated when a controller is activated
#[async_trait]
pub trait EnvironmentGate: Send + Sync {
    /// True if speculative work is acceptable in the current environment
    async fn allows_speculation(&self) -> bool;
}

/// Gate that always allows speculation
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysAllow;

#[async_trait]
impl EnvironmentGate for AlwaysAllow {
    async fn allows_speculation(&self) -> bool {
        true
    }
}

/// Gate with a fixed answer
#[derive(Debug, Clone, Copy)]
pub struct StaticGate(pub bool);

#[async_trait]
impl EnvironmentGate for StaticGate {
    async fn allows_speculation(&self) -> bool {
        self.0
    }
}
