//! Speculation Lifecycle Controller
//!
//! One controller per watched target. Every sampler tick it scores the
//! shared history against the target's current bounds and steps a four-state
//! machine:
//!
//! ```text
//!            s > sensitivity                 action resolves
//!   Idle ─────────────────────> Speculating ─────────────────> Ready
//!    ^  <───────────────────────     │                           │
//!    │     s < abort_threshold       │ action fails              │ grace period
//!    │     (cancel token)            v                           │ expires
//!    └───────────────────────────────┴───────────────────────────┘
//!
//!   commit(): Idle | Speculating | Ready ──> Committed (ticks ignored)
//! ```
//!
//! `abort_threshold = sensitivity * abort_ratio` with `abort_ratio < 1`, so
//! a running speculation survives small score dips.
//!
//! # Ordering
//!
//! Status lives in one mutex-guarded slot, updated through a single
//! transition function. Ticks, commits, action completions and grace timers
//! all read that slot, never a published copy, so a decision always sees
//! the latest transition. Completions carry the generation of the attempt
//! that produced them and are dropped if a newer attempt (or none) is in
//! flight.

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, trace, warn};

use super::action::SpeculativeAction;
use super::error::{ActionError, Result, SpeculationError};
use super::gate::EnvironmentGate;
use super::state::{CommitServe, SpeculationStats, SpeculationStatus};
use crate::intent::{GeometryProvider, IntentScorer, PositionSample, ScoringParams, MIN_SAMPLES};
use crate::sampler::{MotionSampler, Subscription};

/// Controller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeculationConfig {
    /// Score above which an idle controller starts speculating
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    /// Fraction of `sensitivity` below which speculation is abandoned
    #[serde(default = "default_abort_ratio")]
    pub abort_ratio: f64,

    /// How long a ready result survives once the pointer turns away (ms)
    #[serde(default = "default_grace_period_ms")]
    pub grace_period_ms: u64,

    /// Trailing samples used for scoring (must not exceed the sampler buffer)
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Speed below which motion is jitter (px/ms)
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold: f64,

    /// Distance beyond which a target is ignored (px)
    #[serde(default = "default_max_influence_distance")]
    pub max_influence_distance: f64,

    /// Weight of the braking bonus
    #[serde(default = "default_deceleration_weight")]
    pub deceleration_weight: f64,

    /// Log every transition and cancellation at debug level
    #[serde(default)]
    pub debug_logging: bool,
}

fn default_sensitivity() -> f64 {
    0.5
}
fn default_abort_ratio() -> f64 {
    0.6
}
fn default_grace_period_ms() -> u64 {
    500
}
fn default_history_size() -> usize {
    ScoringParams::default().history_size
}
fn default_noise_threshold() -> f64 {
    ScoringParams::default().noise_threshold
}
fn default_max_influence_distance() -> f64 {
    ScoringParams::default().max_influence_distance
}
fn default_deceleration_weight() -> f64 {
    ScoringParams::default().deceleration_weight
}

impl Default for SpeculationConfig {
    fn default() -> Self {
        Self {
            sensitivity: default_sensitivity(),
            abort_ratio: default_abort_ratio(),
            grace_period_ms: default_grace_period_ms(),
            history_size: default_history_size(),
            noise_threshold: default_noise_threshold(),
            max_influence_distance: default_max_influence_distance(),
            deceleration_weight: default_deceleration_weight(),
            debug_logging: false,
        }
    }
}

impl SpeculationConfig {
    /// Score below which speculation is abandoned or a ready result decays
    pub fn abort_threshold(&self) -> f64 {
        self.sensitivity * self.abort_ratio
    }

    /// Grace period as a duration
    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    /// Scoring parameters for the intent scorer
    pub fn scoring_params(&self) -> ScoringParams {
        ScoringParams {
            history_size: self.history_size,
            noise_threshold: self.noise_threshold,
            max_influence_distance: self.max_influence_distance,
            deceleration_weight: self.deceleration_weight,
        }
    }

    /// Validate ranges
    pub fn validate(&self) -> std::result::Result<(), SpeculationError> {
        if !(0.0..=1.0).contains(&self.sensitivity) {
            return Err(SpeculationError::InvalidConfig(format!(
                "sensitivity must be in [0, 1], got {}",
                self.sensitivity
            )));
        }
        if !(0.0..1.0).contains(&self.abort_ratio) {
            return Err(SpeculationError::InvalidConfig(format!(
                "abort_ratio must be in [0, 1), got {}",
                self.abort_ratio
            )));
        }
        if self.history_size < MIN_SAMPLES {
            return Err(SpeculationError::InvalidConfig(format!(
                "history_size must be at least {}, got {}",
                MIN_SAMPLES, self.history_size
            )));
        }
        if self.noise_threshold.is_nan() || self.noise_threshold < 0.0 {
            return Err(SpeculationError::InvalidConfig(format!(
                "noise_threshold must be non-negative, got {}",
                self.noise_threshold
            )));
        }
        if self.max_influence_distance.is_nan() || self.max_influence_distance <= 0.0 {
            return Err(SpeculationError::InvalidConfig(format!(
                "max_influence_distance must be positive, got {}",
                self.max_influence_distance
            )));
        }
        if !(0.0..=1.0).contains(&self.deceleration_weight) {
            return Err(SpeculationError::InvalidConfig(format!(
                "deceleration_weight must be in [0, 1], got {}",
                self.deceleration_weight
            )));
        }
        Ok(())
    }
}

type SharedOutcome<T> = Shared<BoxFuture<'static, Result<T>>>;

/// The one action attempt allowed in flight
struct InFlight<T> {
    generation: u64,
    cancel: CancellationToken,
    outcome: SharedOutcome<T>,
}

struct GraceTimer {
    generation: u64,
    task: JoinHandle<()>,
}

/// Mutable controller state, guarded as a unit
struct Slot<T> {
    status: SpeculationStatus,
    enabled: bool,
    generation: u64,
    in_flight: Option<InFlight<T>>,
    shadow: Option<T>,
    grace: Option<GraceTimer>,
    last_score: f64,
    stats: SpeculationStats,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            status: SpeculationStatus::Idle,
            enabled: true,
            generation: 0,
            in_flight: None,
            shadow: None,
            grace: None,
            last_score: 0.0,
            stats: SpeculationStats::default(),
        }
    }

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn disarm_grace(&mut self) {
        if let Some(timer) = self.grace.take() {
            timer.task.abort();
        }
    }

    fn cancel_in_flight(&mut self) -> bool {
        match self.in_flight.take() {
            Some(in_flight) => {
                in_flight.cancel.cancel();
                true
            }
            None => false,
        }
    }
}

enum CommitPath<T> {
    Cached(T),
    Pending(CommitServe, SharedOutcome<T>),
}

struct ControllerCore<A: SpeculativeAction> {
    name: String,
    config: SpeculationConfig,
    scorer: IntentScorer,
    geometry: Box<dyn GeometryProvider>,
    action: Arc<A>,
    slot: Mutex<Slot<A::Output>>,
    status_tx: watch::Sender<SpeculationStatus>,
    runtime: Handle,
}

impl<A: SpeculativeAction> ControllerCore<A> {
    fn transition(&self, slot: &mut Slot<A::Output>, next: SpeculationStatus) {
        let prev = slot.status;
        if prev == next {
            return;
        }

        if prev == SpeculationStatus::Ready {
            slot.disarm_grace();
        }
        if next == SpeculationStatus::Idle {
            slot.shadow = None;
        }

        slot.status = next;
        self.status_tx.send_replace(next);

        if self.config.debug_logging {
            debug!(
                "[{}] {} -> {}: {} (score {:.3})",
                self.name,
                prev,
                next,
                next.description(),
                slot.last_score
            );
        } else {
            trace!("[{}] {} -> {}", self.name, prev, next);
        }
    }

    fn start_action(self: &Arc<Self>, slot: &mut Slot<A::Output>) -> SharedOutcome<A::Output> {
        let generation = slot.next_generation();
        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let action = Arc::clone(&self.action);

        let outcome: SharedOutcome<A::Output> = AssertUnwindSafe(async move { action.run(token).await })
            .catch_unwind()
            .map(|result| {
                result.unwrap_or_else(|_| Err(ActionError::Abandoned("action panicked".to_string())))
            })
            .boxed()
            .shared();

        let weak: Weak<Self> = Arc::downgrade(self);
        let watched = outcome.clone();
        self.runtime.spawn(async move {
            let result = watched.await;
            match weak.upgrade() {
                Some(core) => core.settle(generation, result),
                None => trace!("Action {} settled after controller teardown", generation),
            }
        });

        slot.in_flight = Some(InFlight {
            generation,
            cancel,
            outcome: outcome.clone(),
        });
        outcome
    }

    fn settle(&self, generation: u64, result: Result<A::Output>) {
        let mut slot = self.slot.lock();

        match &slot.in_flight {
            Some(in_flight) if in_flight.generation == generation => {}
            _ => {
                if self.config.debug_logging {
                    debug!("[{}] Ignoring stale outcome of attempt {}", self.name, generation);
                }
                return;
            }
        }
        slot.in_flight = None;

        match result {
            Ok(value) => {
                slot.shadow = Some(value);
                // A committed cycle keeps its status; only speculation moves to ready
                if slot.status == SpeculationStatus::Speculating {
                    self.transition(&mut slot, SpeculationStatus::Ready);
                }
            }
            Err(e) if e.is_cancellation() => {
                if self.config.debug_logging {
                    debug!("[{}] Attempt {} cancelled", self.name, generation);
                }
                self.transition(&mut slot, SpeculationStatus::Idle);
            }
            Err(e) => {
                warn!("[{}] Speculative action failed: {}", self.name, e);
                slot.stats.actions_failed += 1;
                self.transition(&mut slot, SpeculationStatus::Idle);
            }
        }
    }

    fn on_tick(self: &Arc<Self>, history: &[PositionSample]) -> f64 {
        {
            let slot = self.slot.lock();
            if !slot.enabled || !slot.status.accepts_ticks() {
                return 0.0;
            }
        }

        // Geometry is queried fresh every tick and outside the lock
        let bounds = self.geometry.bounds();
        let score = self.scorer.score(&bounds, history);

        let mut slot = self.slot.lock();
        slot.last_score = score;

        match slot.status {
            SpeculationStatus::Idle => {
                if score > self.config.sensitivity {
                    if slot.in_flight.is_none() {
                        self.start_action(&mut slot);
                        slot.stats.speculations_started += 1;
                    }
                    self.transition(&mut slot, SpeculationStatus::Speculating);
                }
            }
            SpeculationStatus::Speculating => {
                if score < self.config.abort_threshold() {
                    slot.cancel_in_flight();
                    slot.stats.speculations_aborted += 1;
                    if self.config.debug_logging {
                        debug!("[{}] Intent lost (score {:.3}), cancelling", self.name, score);
                    }
                    self.transition(&mut slot, SpeculationStatus::Idle);
                }
            }
            SpeculationStatus::Ready => {
                if score < self.config.abort_threshold() {
                    if slot.grace.is_none() {
                        self.arm_grace(&mut slot);
                    }
                } else if slot.grace.is_some() {
                    slot.disarm_grace();
                    if self.config.debug_logging {
                        debug!("[{}] Pointer re-approached, keeping result", self.name);
                    }
                }
            }
            SpeculationStatus::Committed => {}
        }

        score
    }

    fn arm_grace(self: &Arc<Self>, slot: &mut Slot<A::Output>) {
        let generation = slot.next_generation();
        let period = self.config.grace_period();
        let weak: Weak<Self> = Arc::downgrade(self);

        let task = self.runtime.spawn(async move {
            tokio::time::sleep(period).await;
            if let Some(core) = weak.upgrade() {
                core.expire_grace(generation);
            }
        });

        slot.grace = Some(GraceTimer { generation, task });
        trace!("[{}] Grace timer armed for {:?}", self.name, period);
    }

    fn expire_grace(&self, generation: u64) {
        let mut slot = self.slot.lock();
        match &slot.grace {
            Some(timer) if timer.generation == generation => {}
            _ => return,
        }
        slot.grace = None;

        if slot.status == SpeculationStatus::Ready {
            slot.stats.results_evicted += 1;
            if self.config.debug_logging {
                debug!("[{}] Grace period elapsed, evicting result", self.name);
            }
            self.transition(&mut slot, SpeculationStatus::Idle);
        }
    }

    fn begin_commit(self: &Arc<Self>) -> CommitPath<A::Output> {
        let mut guard = self.slot.lock();
        let slot = &mut *guard;

        if slot.in_flight.is_none() {
            if let Some(value) = slot.shadow.clone() {
                slot.stats.commit_hits += 1;
                self.transition(slot, SpeculationStatus::Committed);
                return CommitPath::Cached(value);
            }
        }

        let (served, pending) = match slot.in_flight.as_ref().map(|f| f.outcome.clone()) {
            Some(outcome) => {
                slot.stats.commit_joins += 1;
                (CommitServe::Joined, outcome)
            }
            None => {
                slot.stats.commit_cold += 1;
                (CommitServe::Cold, self.start_action(slot))
            }
        };
        self.transition(slot, SpeculationStatus::Committed);
        CommitPath::Pending(served, pending)
    }

    fn reset(&self) {
        let mut slot = self.slot.lock();
        slot.cancel_in_flight();
        slot.disarm_grace();
        self.transition(&mut slot, SpeculationStatus::Idle);
        slot.shadow = None;
    }

    fn teardown(&self) {
        let mut slot = self.slot.lock();
        slot.enabled = false;
        if slot.cancel_in_flight() && self.config.debug_logging {
            debug!("[{}] Cancelled in-flight action on teardown", self.name);
        }
        slot.disarm_grace();
    }
}

/// Per-target speculation controller
///
/// Created when a target starts being watched; dropping it cancels any
/// in-flight action and pending grace timer and unsubscribes from the
/// sampler.
pub struct SpeculationController<A: SpeculativeAction> {
    core: Arc<ControllerCore<A>>,
    subscription: Option<Subscription>,
}

impl<A: SpeculativeAction> SpeculationController<A> {
    /// Create a controller for one target
    ///
    /// Must be called within a tokio runtime; actions and grace timers are
    /// spawned onto it.
    pub fn new(
        name: impl Into<String>,
        config: SpeculationConfig,
        geometry: impl GeometryProvider + 'static,
        action: A,
    ) -> std::result::Result<Self, SpeculationError> {
        config.validate()?;
        let runtime = Handle::try_current().map_err(|_| SpeculationError::NoRuntime)?;
        let (status_tx, _) = watch::channel(SpeculationStatus::Idle);

        Ok(Self {
            core: Arc::new(ControllerCore {
                name: name.into(),
                scorer: IntentScorer::new(config.scoring_params()),
                config,
                geometry: Box::new(geometry),
                action: Arc::new(action),
                slot: Mutex::new(Slot::new()),
                status_tx,
                runtime,
            }),
            subscription: None,
        })
    }

    /// Subscribe to a sampler's ticks
    ///
    /// Attaching is an explicit opt-in: it re-enables tick processing even
    /// if an earlier [`activate`](Self::activate) found the gate closed.
    pub fn attach(&mut self, sampler: &MotionSampler) -> std::result::Result<(), SpeculationError> {
        if self.core.config.history_size > sampler.buffer_size() {
            return Err(SpeculationError::HistoryExceedsBuffer {
                history_size: self.core.config.history_size,
                buffer_size: sampler.buffer_size(),
            });
        }

        self.core.slot.lock().enabled = true;

        let weak = Arc::downgrade(&self.core);
        self.subscription = Some(sampler.subscribe(move |history| {
            if let Some(core) = weak.upgrade() {
                core.on_tick(history);
            }
        }));

        if !sampler.is_active() {
            debug!("[{}] Attached to inactive sampler", self.core.name);
        }
        Ok(())
    }

    /// Evaluate the environment gate once and attach if it allows
    /// speculation
    ///
    /// Returns whether the controller is now active. While inactive it
    /// ignores ticks, though `commit()` still works.
    pub async fn activate(
        &mut self,
        sampler: &MotionSampler,
        gate: &dyn EnvironmentGate,
    ) -> std::result::Result<bool, SpeculationError> {
        let allowed = gate.allows_speculation().await;
        self.core.slot.lock().enabled = allowed;

        if !allowed {
            info!("[{}] Speculation disabled by environment gate", self.core.name);
            self.subscription = None;
            return Ok(false);
        }

        self.attach(sampler)?;
        Ok(true)
    }

    /// Process one history snapshot and return the computed score
    ///
    /// Normally called by the sampler subscription; exposed for callers that
    /// drive ticks themselves.
    pub fn tick(&self, history: &[PositionSample]) -> f64 {
        self.core.on_tick(history)
    }

    /// Commit to the action
    ///
    /// Returns the cached result if one is ready, joins the in-flight attempt
    /// if speculation is running, and otherwise starts the action now.
    pub async fn commit(&self) -> Result<A::Output> {
        self.commit_traced().await.1
    }

    /// Like [`commit`](Self::commit), also reporting how the commit was
    /// served
    ///
    /// The path is decided under the same lock as the transition, so it
    /// always agrees with the counters in [`stats`](Self::stats).
    pub async fn commit_traced(&self) -> (CommitServe, Result<A::Output>) {
        match self.core.begin_commit() {
            CommitPath::Cached(value) => (CommitServe::Cached, Ok(value)),
            CommitPath::Pending(served, outcome) => (served, outcome.await),
        }
    }

    /// Start a new cycle: cancel all work, drop any result, return to idle
    pub fn reset(&self) {
        self.core.reset();
    }

    /// Current status
    pub fn status(&self) -> SpeculationStatus {
        self.core.slot.lock().status
    }

    /// Cached result, if any
    pub fn result(&self) -> Option<A::Output> {
        self.core.slot.lock().shadow.clone()
    }

    /// Score computed on the most recent tick
    pub fn last_score(&self) -> f64 {
        self.core.slot.lock().last_score
    }

    /// Whether an action is currently in flight
    pub fn is_in_flight(&self) -> bool {
        self.core.slot.lock().in_flight.is_some()
    }

    /// Whether a grace timer is armed
    pub fn is_decaying(&self) -> bool {
        self.core.slot.lock().grace.is_some()
    }

    /// Whether ticks are processed
    pub fn is_enabled(&self) -> bool {
        self.core.slot.lock().enabled
    }

    /// Counters
    pub fn stats(&self) -> SpeculationStats {
        self.core.slot.lock().stats
    }

    /// Observe status changes (for display only; transitions never read it)
    pub fn watch_status(&self) -> watch::Receiver<SpeculationStatus> {
        self.core.status_tx.subscribe()
    }

    /// Target name
    pub fn name(&self) -> &str {
        &self.core.name
    }

    /// Configuration
    pub fn config(&self) -> &SpeculationConfig {
        &self.core.config
    }
}

impl<A: SpeculativeAction> Drop for SpeculationController<A> {
    fn drop(&mut self) {
        drop(self.subscription.take());
        self.core.teardown();
        trace!("[{}] Controller torn down", self.core.name);
    }
}

impl<A: SpeculativeAction> std::fmt::Debug for SpeculationController<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeculationController")
            .field("name", &self.core.name)
            .field("status", &self.status())
            .field("attached", &self.subscription.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::TargetRect;
    use crate::speculation::{action_fn, StaticGate};
    use crate::sampler::SamplerConfig;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn target() -> TargetRect {
        TargetRect::new(200.0, 200.0, 300.0, 300.0)
    }

    fn approaching() -> Vec<PositionSample> {
        vec![
            PositionSample::new(0.0, 250.0, 0.0),
            PositionSample::new(50.0, 250.0, 16.0),
            PositionSample::new(100.0, 250.0, 32.0),
        ]
    }

    fn leaving() -> Vec<PositionSample> {
        vec![
            PositionSample::new(100.0, 250.0, 0.0),
            PositionSample::new(50.0, 250.0, 16.0),
            PositionSample::new(0.0, 250.0, 32.0),
        ]
    }

    #[test]
    fn test_default_config() {
        let config = SpeculationConfig::default();
        assert_eq!(config.sensitivity, 0.5);
        assert!((config.abort_threshold() - 0.3).abs() < 1e-12);
        assert_eq!(config.grace_period(), Duration::from_millis(500));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        let mut config = SpeculationConfig::default();
        config.abort_ratio = 1.0;
        assert!(config.validate().is_err());

        let mut config = SpeculationConfig::default();
        config.history_size = 2;
        assert!(config.validate().is_err());

        let mut config = SpeculationConfig::default();
        config.max_influence_distance = 0.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_new_requires_runtime() {
        let result = SpeculationController::new(
            "outside",
            SpeculationConfig::default(),
            target(),
            action_fn(|_| async { Ok::<_, ActionError>(()) }),
        );
        assert!(matches!(result, Err(SpeculationError::NoRuntime)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_tick_starts_one_action() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let controller = SpeculationController::new(
            "pricing",
            SpeculationConfig::default(),
            target(),
            action_fn(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
                async { Ok::<_, ActionError>("page") }
            }),
        )
        .unwrap();

        let history = approaching();
        controller.tick(&history);
        controller.tick(&history);
        assert_eq!(controller.status(), SpeculationStatus::Speculating);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(controller.status(), SpeculationStatus::Ready);
        assert_eq!(controller.result(), Some("page"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_rejects_oversized_window() {
        let sampler = MotionSampler::new(SamplerConfig {
            buffer_size: 5,
            ..SamplerConfig::default()
        });
        let mut controller = SpeculationController::new(
            "wide",
            SpeculationConfig::default(),
            target(),
            action_fn(|_| async { Ok::<_, ActionError>(()) }),
        )
        .unwrap();
        assert!(matches!(
            controller.attach(&sampler),
            Err(SpeculationError::HistoryExceedsBuffer { .. })
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_closed_gate_disables_ticks() {
        let sampler = MotionSampler::new(SamplerConfig::default());
        let mut controller = SpeculationController::new(
            "gated",
            SpeculationConfig::default(),
            target(),
            action_fn(|_| async { Ok::<_, ActionError>(()) }),
        )
        .unwrap();

        let active = controller.activate(&sampler, &StaticGate(false)).await.unwrap();
        assert!(!active);
        assert_eq!(sampler.listener_count(), 0);
        assert_eq!(controller.tick(&approaching()), 0.0);
        assert_eq!(controller.status(), SpeculationStatus::Idle);
    }

    #[tokio::test(start_paused = true)]
    async fn test_attach_after_closed_gate_processes_ticks() {
        let sampler = MotionSampler::new(SamplerConfig::default());
        let mut controller = SpeculationController::new(
            "reopened",
            SpeculationConfig::default(),
            target(),
            action_fn(|_| async { Ok::<_, ActionError>(()) }),
        )
        .unwrap();

        assert!(!controller.activate(&sampler, &StaticGate(false)).await.unwrap());
        assert!(!controller.is_enabled());

        controller.attach(&sampler).unwrap();
        assert!(controller.is_enabled());
        assert_eq!(sampler.listener_count(), 1);

        for sample in approaching() {
            sampler.record(sample);
        }
        sampler.tick();
        assert!(controller.last_score() > 0.5);
        assert_eq!(controller.status(), SpeculationStatus::Speculating);
    }

    #[tokio::test(start_paused = true)]
    async fn test_committed_skips_scoring() {
        let controller = SpeculationController::new(
            "settled",
            SpeculationConfig::default(),
            target(),
            action_fn(|_| async { Ok::<_, ActionError>(1u8) }),
        )
        .unwrap();

        controller.tick(&leaving());
        assert_eq!(controller.commit().await, Ok(1));
        assert!(!controller.status().accepts_ticks());

        assert_eq!(controller.tick(&approaching()), 0.0);
        assert_eq!(controller.last_score(), 0.0);
        assert_eq!(controller.stats().speculations_started, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_reset_leaves_committed() {
        let controller = SpeculationController::new(
            "cycle",
            SpeculationConfig::default(),
            target(),
            action_fn(|_| async { Ok::<_, ActionError>(7u8) }),
        )
        .unwrap();

        assert_eq!(controller.commit().await, Ok(7));
        assert_eq!(controller.status(), SpeculationStatus::Committed);
        controller.tick(&leaving());
        assert_eq!(controller.status(), SpeculationStatus::Committed);

        controller.reset();
        assert_eq!(controller.status(), SpeculationStatus::Idle);
        assert_eq!(controller.result(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watch_status_follows_transitions() {
        let controller = SpeculationController::new(
            "watched",
            SpeculationConfig::default(),
            target(),
            action_fn(|cancel: CancellationToken| async move {
                cancel.cancelled().await;
                Err::<(), _>(ActionError::Cancelled)
            }),
        )
        .unwrap();
        let mut rx = controller.watch_status();

        controller.tick(&approaching());
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SpeculationStatus::Speculating);
    }
}
