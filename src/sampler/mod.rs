//! Shared motion sampler
//!
//! A single broadcaster owns the pointer history and fans the same snapshot
//! out to every registered listener once per tick. Watching N targets costs
//! one sampler, not N pointer listeners.
//!
//! # Architecture
//!
//! ```text
//! Position source
//!   └─> SamplerDriver (mpsc)
//!       └─> MotionSampler::record()     (single owner of HistoryBuffer)
//!
//! Tick (tick_hz interval)
//!   └─> MotionSampler::tick()
//!       └─> snapshot ─┬─> listener 1 (SpeculationController)
//!                     ├─> listener 2
//!                     └─> ...
//! ```
//!
//! Listeners receive a read-only slice and hold only a [`Subscription`],
//! never a reference into the buffer.

mod driver;
mod history;

pub use driver::SamplerDriver;
pub use history::{HistoryBuffer, HistorySnapshot, RecordOutcome};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};
use std::time::Duration;
use tracing::{debug, trace};

use crate::intent::PositionSample;

/// Sampler configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerConfig {
    /// Global history capacity shared by all listeners
    #[serde(default = "default_buffer_size")]
    pub buffer_size: usize,

    /// Tick rate (Hz), normally the display refresh rate
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,

    /// Whether sampling runs at all (false on coarse-pointer devices)
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_buffer_size() -> usize {
    30
}
fn default_tick_hz() -> u32 {
    60
}
fn default_enabled() -> bool {
    true
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            buffer_size: default_buffer_size(),
            tick_hz: default_tick_hz(),
            enabled: default_enabled(),
        }
    }
}

impl SamplerConfig {
    /// Interval between ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }
}

/// Callback invoked with the history snapshot on every tick
pub type Listener = Arc<dyn Fn(&[PositionSample]) + Send + Sync>;

#[derive(Default)]
struct ListenerRegistry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Handle returned by [`MotionSampler::subscribe`]
///
/// The listener is removed when the handle is dropped or
/// [`unsubscribe`](Subscription::unsubscribe) is called.
#[must_use = "dropping the subscription unsubscribes the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<ListenerRegistry>>,
}

impl Subscription {
    /// Remove the listener now
    pub fn unsubscribe(self) {
        // Drop does the work
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.lock().listeners.retain(|(id, _)| *id != self.id);
            trace!("Listener {} unsubscribed", self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

/// Sampler counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SamplerStats {
    /// Ticks delivered to listeners
    pub ticks: u64,
    /// Samples appended or coalesced
    pub samples_recorded: u64,
    /// Samples dropped for arriving out of order
    pub samples_rejected: u64,
}

/// Process-wide pointer history broadcaster
pub struct MotionSampler {
    config: SamplerConfig,
    history: Mutex<HistoryBuffer>,
    registry: Arc<Mutex<ListenerRegistry>>,
    active: AtomicBool,
    ticks: AtomicU64,
    recorded: AtomicU64,
    rejected: AtomicU64,
}

static GLOBAL_SAMPLER: OnceLock<Arc<MotionSampler>> = OnceLock::new();

impl MotionSampler {
    /// Create a sampler
    pub fn new(config: SamplerConfig) -> Self {
        debug!(
            "Motion sampler: buffer={}, tick={}Hz, enabled={}",
            config.buffer_size, config.tick_hz, config.enabled
        );
        Self {
            history: Mutex::new(HistoryBuffer::new(config.buffer_size)),
            registry: Arc::new(Mutex::new(ListenerRegistry::default())),
            active: AtomicBool::new(config.enabled),
            ticks: AtomicU64::new(0),
            recorded: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            config,
        }
    }

    /// The process-wide sampler, created with default configuration on
    /// first use
    pub fn global() -> Arc<MotionSampler> {
        GLOBAL_SAMPLER
            .get_or_init(|| Arc::new(MotionSampler::new(SamplerConfig::default())))
            .clone()
    }

    /// Configuration
    pub fn config(&self) -> &SamplerConfig {
        &self.config
    }

    /// Global history capacity
    pub fn buffer_size(&self) -> usize {
        self.config.buffer_size
    }

    /// Whether sampling is active
    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Enable or disable sampling (e.g. when the primary pointer becomes
    /// coarse). Disabling clears the history.
    pub fn set_active(&self, active: bool) {
        let was = self.active.swap(active, Ordering::AcqRel);
        if was && !active {
            self.history.lock().clear();
        }
        if was != active {
            debug!("Motion sampler {}", if active { "enabled" } else { "disabled" });
        }
    }

    /// Record a pointer sample
    pub fn record(&self, sample: PositionSample) -> RecordOutcome {
        if !self.is_active() {
            return RecordOutcome::Rejected;
        }

        let outcome = self.history.lock().push(sample);
        match outcome {
            RecordOutcome::Rejected => {
                self.rejected.fetch_add(1, Ordering::Relaxed);
                trace!("Dropped sample ({}, {}) at t={}", sample.x, sample.y, sample.t);
            }
            _ => {
                self.recorded.fetch_add(1, Ordering::Relaxed);
            }
        }
        outcome
    }

    /// Current history contents
    pub fn snapshot(&self) -> HistorySnapshot {
        self.history.lock().snapshot()
    }

    /// Register a listener called once per tick
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&[PositionSample]) + Send + Sync + 'static,
    {
        let mut registry = self.registry.lock();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.listeners.push((id, Arc::new(listener)));
        trace!("Listener {} subscribed ({} total)", id, registry.listeners.len());

        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        self.registry.lock().listeners.len()
    }

    /// Deliver the current snapshot to every listener
    ///
    /// Listeners run synchronously, in subscription order, outside the
    /// sampler's locks so they may subscribe or unsubscribe re-entrantly.
    /// Returns the number of listeners notified.
    pub fn tick(&self) -> usize {
        if !self.is_active() {
            return 0;
        }

        let snapshot = self.snapshot();
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        for listener in &listeners {
            listener(&snapshot);
        }

        self.ticks.fetch_add(1, Ordering::Relaxed);
        listeners.len()
    }

    /// Counters
    pub fn stats(&self) -> SamplerStats {
        SamplerStats {
            ticks: self.ticks.load(Ordering::Relaxed),
            samples_recorded: self.recorded.load(Ordering::Relaxed),
            samples_rejected: self.rejected.load(Ordering::Relaxed),
        }
    }
}

impl std::fmt::Debug for MotionSampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MotionSampler")
            .field("config", &self.config)
            .field("active", &self.is_active())
            .field("listeners", &self.listener_count())
            .finish()
    }
}
