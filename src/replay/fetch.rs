//! Simulated fetch action
//!
//! Stands in for a network prefetch: waits for a fixed latency, honouring
//! cancellation, then yields a payload or a failure.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::speculation::{ActionError, Result, SpeculativeAction};

/// Payload produced by [`SimulatedFetch`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FetchedPayload {
    /// Target the payload belongs to
    pub target: String,
    /// Sequence number of the invocation that produced it
    pub invocation: u64,
}

/// Latency-only stand-in for a read-only fetch
#[derive(Debug, Clone)]
pub struct SimulatedFetch {
    target: String,
    latency: Duration,
    fail: bool,
    invocations: Arc<AtomicU64>,
}

impl SimulatedFetch {
    /// Create a fetch for `target`
    pub fn new(target: impl Into<String>, latency: Duration, fail: bool) -> Self {
        Self {
            target: target.into(),
            latency,
            fail,
            invocations: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Shared invocation counter (clones of this action share it)
    pub fn invocations(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.invocations)
    }
}

#[async_trait]
impl SpeculativeAction for SimulatedFetch {
    type Output = FetchedPayload;

    async fn run(&self, cancel: CancellationToken) -> Result<FetchedPayload> {
        let invocation = self.invocations.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Fetch #{} for '{}' started", invocation, self.target);

        tokio::select! {
            _ = cancel.cancelled() => Err(ActionError::Cancelled),
            _ = tokio::time::sleep(self.latency) => {
                if self.fail {
                    Err(ActionError::Failed(format!("simulated failure for '{}'", self.target)))
                } else {
                    Ok(FetchedPayload {
                        target: self.target.clone(),
                        invocation,
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_fetch_completes_after_latency() {
        let fetch = SimulatedFetch::new("a", Duration::from_millis(100), false);
        let started = tokio::time::Instant::now();
        let payload = fetch.run(CancellationToken::new()).await.unwrap();
        assert_eq!(payload.invocation, 1);
        assert!(started.elapsed() >= Duration::from_millis(100));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_honours_cancellation() {
        let fetch = SimulatedFetch::new("a", Duration::from_secs(10), false);
        let token = CancellationToken::new();
        let stop = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            stop.cancel();
        });
        assert_eq!(fetch.run(token).await, Err(ActionError::Cancelled));
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetch_failure() {
        let fetch = SimulatedFetch::new("a", Duration::from_millis(1), true);
        let result = fetch.run(CancellationToken::new()).await;
        assert!(matches!(result, Err(ActionError::Failed(_))));
    }
}
