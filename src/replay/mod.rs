//! Trace replay harness
//!
//! Replays a recorded pointer trace through the real sampler, driver and
//! controllers, with [`SimulatedFetch`] standing in for each target's
//! action, and reports how speculation would have served each commit.
//!
//! # Flow
//!
//! ```text
//! PointerTrace::events()
//!   ├─> Sample  ─> SamplerDriver channel ─> MotionSampler
//!   └─> Commit  ─> spawned commit() on the target's controller
//!
//! SamplerDriver tick ─> every SpeculationController
//! ```
//!
//! Event timing follows the trace's timestamps, scaled by `speed`.

mod fetch;
mod trace;

pub use fetch::{FetchedPayload, SimulatedFetch};
pub use trace::{PointerTrace, TraceCommit, TraceEvent};

use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::sampler::{MotionSampler, SamplerDriver, SamplerStats};
use crate::speculation::{
    AlwaysAllow, CommitServe, SpeculationController, SpeculationStats, SpeculationStatus,
};

/// Outcome of one commit
#[derive(Debug, Clone, Serialize)]
pub struct CommitReport {
    /// Target committed to
    pub target: String,
    /// Trace timestamp of the commit (ms)
    pub t: f64,
    /// How it was served
    pub served: CommitServe,
    /// Time the caller waited for the result (ms, replay clock)
    pub wait_ms: f64,
    /// Error text if the action failed
    pub error: Option<String>,
}

/// Per-target summary
#[derive(Debug, Clone, Serialize)]
pub struct TargetReport {
    /// Target name
    pub name: String,
    /// Status when the replay ended
    pub final_status: SpeculationStatus,
    /// Times the action actually ran
    pub invocations: u64,
    /// Controller counters
    pub stats: SpeculationStats,
}

/// Replay summary
#[derive(Debug, Clone, Serialize)]
pub struct ReplayReport {
    /// Trace span (ms)
    pub duration_ms: f64,
    /// Sampler counters
    pub sampler: SamplerStats,
    /// Per-target summaries, in config order
    pub targets: Vec<TargetReport>,
    /// Commits in completion order
    pub commits: Vec<CommitReport>,
}

struct Watched {
    controller: Arc<SpeculationController<SimulatedFetch>>,
    fetch: SimulatedFetch,
}

/// Replay `trace` against the targets in `config`
///
/// `speed` scales the trace clock (2.0 replays twice as fast).
pub async fn run(config: &Config, trace: &PointerTrace, speed: f64) -> Result<ReplayReport> {
    trace.validate(config)?;
    if !speed.is_finite() || speed <= 0.0 {
        anyhow::bail!("Replay speed must be positive, got {}", speed);
    }

    let sampler = Arc::new(MotionSampler::new(config.sampler.clone()));

    let mut watched = Vec::with_capacity(config.targets.len());
    for target in &config.targets {
        let fetch = SimulatedFetch::new(
            target.name.clone(),
            Duration::from_millis(target.latency_ms),
            target.fail,
        );
        let mut controller = SpeculationController::new(
            target.name.clone(),
            config.speculation.clone(),
            target.rect(),
            fetch.clone(),
        )
        .with_context(|| format!("Failed to create controller for '{}'", target.name))?;
        controller
            .activate(&sampler, &AlwaysAllow)
            .await
            .with_context(|| format!("Failed to activate controller for '{}'", target.name))?;

        watched.push(Watched {
            controller: Arc::new(controller),
            fetch,
        });
    }

    info!(
        "Replaying {} samples, {} commits across {} targets ({:.0} ms at {}x)",
        trace.samples.len(),
        trace.commits.len(),
        watched.len(),
        trace.duration_ms(),
        speed
    );

    let driver = SamplerDriver::spawn(Arc::clone(&sampler));
    let samples = driver.sender();
    let mut commits: JoinSet<CommitReport> = JoinSet::new();

    let start = Instant::now();
    let start_t = trace.start_t();

    for event in trace.events() {
        let offset = Duration::from_secs_f64(((event.t() - start_t) / speed).max(0.0) / 1000.0);
        tokio::time::sleep_until(start + offset).await;

        match event {
            TraceEvent::Sample(sample) => {
                if samples.send(sample).await.is_err() {
                    warn!("Sampler driver stopped early");
                    break;
                }
            }
            TraceEvent::Commit(commit) => {
                let Some(index) = config.targets.iter().position(|t| t.name == commit.target)
                else {
                    continue;
                };
                let controller = Arc::clone(&watched[index].controller);
                commits.spawn(async move {
                    let began = Instant::now();
                    let (served, result) = controller.commit_traced().await;
                    let wait_ms = began.elapsed().as_secs_f64() * 1000.0;
                    debug!(
                        "Commit '{}' at t={} served {} after {:.1} ms",
                        commit.target, commit.t, served, wait_ms
                    );
                    CommitReport {
                        target: commit.target,
                        t: commit.t,
                        served,
                        wait_ms,
                        error: result.err().map(|e| e.to_string()),
                    }
                });
            }
        }
    }

    let mut commit_reports = Vec::new();
    while let Some(joined) = commits.join_next().await {
        match joined {
            Ok(report) => commit_reports.push(report),
            Err(e) => warn!("Commit task failed: {}", e),
        }
    }

    // Let the last samples reach one more tick
    tokio::time::sleep(config.sampler.tick_interval()).await;
    driver.shutdown().await;

    let targets = config
        .targets
        .iter()
        .zip(&watched)
        .map(|(target, w)| TargetReport {
            name: target.name.clone(),
            final_status: w.controller.status(),
            invocations: w.fetch.invocations().load(Ordering::SeqCst),
            stats: w.controller.stats(),
        })
        .collect();

    Ok(ReplayReport {
        duration_ms: trace.duration_ms(),
        sampler: sampler.stats(),
        targets,
        commits: commit_reports,
    })
}

impl ReplayReport {
    /// Plain-text summary
    pub fn to_text(&self) -> String {
        use std::fmt::Write;

        let mut out = String::new();
        writeln!(
            out,
            "Replay: {:.0} ms, {} ticks, {} samples ({} rejected)",
            self.duration_ms,
            self.sampler.ticks,
            self.sampler.samples_recorded,
            self.sampler.samples_rejected
        )
        .ok();
        writeln!(out).ok();

        for target in &self.targets {
            writeln!(
                out,
                "  {:<16} {:<12} runs={:<3} started={:<3} aborted={:<3} evicted={:<3} failed={:<3} hit-rate={:.0}%",
                target.name,
                target.final_status,
                target.invocations,
                target.stats.speculations_started,
                target.stats.speculations_aborted,
                target.stats.results_evicted,
                target.stats.actions_failed,
                target.stats.hit_rate() * 100.0
            )
            .ok();
        }

        if !self.commits.is_empty() {
            writeln!(out).ok();
            for commit in &self.commits {
                let outcome = commit.error.as_deref().unwrap_or("ok");
                writeln!(
                    out,
                    "  commit {:<16} t={:<8.0} {:<7} waited {:>6.1} ms  {}",
                    commit.target,
                    commit.t,
                    commit.served.to_string(),
                    commit.wait_ms,
                    outcome
                )
                .ok();
            }
        }

        out
    }
}
