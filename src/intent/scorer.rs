//! Intent Scorer
//!
//! Converts a short pointer history and a target's bounds into a confidence
//! in [0, 1] that the pointer is heading for that target.
//!
//! # Kinematic Model
//!
//! The window is split in two halves around `mid = n / 2`:
//!
//! ```text
//! early: samples[0]   -> samples[mid]    speed1
//! late:  samples[mid] -> samples[n - 1]  speed2, (vx, vy)
//! ```
//!
//! The late-half direction is compared with the direction to the target
//! centre, then combined with a linear distance falloff:
//!
//! ```text
//! score = alignment³ · (1 - distance / max_influence_distance) + braking_bonus
//! ```
//!
//! `braking_bonus` only applies when the pointer is well aligned
//! (`alignment > 0.8`) and slowing down (`speed2 < speed1`).
//!
//! Speeds are in pixels per millisecond.

use serde::{Deserialize, Serialize};
use tracing::trace;

use super::geometry::{PositionSample, TargetRect};

/// Fewest samples that still yield two velocity segments
pub const MIN_SAMPLES: usize = 3;

/// Alignment above which deceleration counts as braking toward the target
pub const BRAKING_ALIGNMENT: f64 = 0.8;

/// Scoring parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringParams {
    /// Trailing samples considered per evaluation
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// Late-half speed below which motion is treated as jitter (px/ms)
    #[serde(default = "default_noise_threshold")]
    pub noise_threshold: f64,

    /// Distance from the target centre beyond which the score is 0 (px)
    #[serde(default = "default_max_influence_distance")]
    pub max_influence_distance: f64,

    /// Weight of the braking bonus (0.0-1.0)
    #[serde(default = "default_deceleration_weight")]
    pub deceleration_weight: f64,
}

fn default_history_size() -> usize {
    10
}
fn default_noise_threshold() -> f64 {
    0.05
}
fn default_max_influence_distance() -> f64 {
    500.0
}
fn default_deceleration_weight() -> f64 {
    0.3
}

impl Default for ScoringParams {
    fn default() -> Self {
        Self {
            history_size: default_history_size(),
            noise_threshold: default_noise_threshold(),
            max_influence_distance: default_max_influence_distance(),
            deceleration_weight: default_deceleration_weight(),
        }
    }
}

/// Displacement over one segment of the window
#[derive(Debug, Clone, Copy, Default)]
struct Segment {
    speed: f64,
    vx: f64,
    vy: f64,
}

impl Segment {
    fn between(from: &PositionSample, to: &PositionSample) -> Self {
        let dt = to.t - from.t;
        // Same-tick samples carry no velocity information
        if dt <= 0.0 {
            return Self::default();
        }

        let vx = (to.x - from.x) / dt;
        let vy = (to.y - from.y) / dt;
        Self {
            speed: vx.hypot(vy),
            vx,
            vy,
        }
    }
}

/// Stateless intent scorer
///
/// Holds only immutable parameters; identical inputs always produce the
/// same score.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentScorer {
    params: ScoringParams,
}

impl IntentScorer {
    /// Create a scorer with the given parameters
    pub fn new(params: ScoringParams) -> Self {
        Self { params }
    }

    /// Scoring parameters
    pub fn params(&self) -> &ScoringParams {
        &self.params
    }

    /// Score the likelihood that the pointer is heading for `target`
    ///
    /// `history` is ordered oldest first. Returns a value in [0, 1].
    pub fn score(&self, target: &TargetRect, history: &[PositionSample]) -> f64 {
        let start = history.len().saturating_sub(self.params.history_size);
        let window = &history[start..];
        if window.len() < MIN_SAMPLES {
            return 0.0;
        }

        let current = window[window.len() - 1];
        if target.contains(current.x, current.y) {
            return 1.0;
        }

        let (cx, cy) = target.center();
        let distance = current.distance_to(cx, cy);
        if distance > self.params.max_influence_distance {
            return 0.0;
        }

        let mid = window.len() / 2;
        let early = Segment::between(&window[0], &window[mid]);
        let late = Segment::between(&window[mid], &current);

        if late.speed < self.params.noise_threshold || late.speed == 0.0 {
            return 0.0;
        }

        let alignment = if distance > 0.0 {
            (late.vx / late.speed) * ((cx - current.x) / distance)
                + (late.vy / late.speed) * ((cy - current.y) / distance)
        } else {
            0.0
        };
        if alignment <= 0.0 {
            return 0.0;
        }

        let alignment_score = alignment.powi(3);
        let distance_score = 1.0 - distance / self.params.max_influence_distance;

        let braking_bonus = if late.speed < early.speed && alignment > BRAKING_ALIGNMENT {
            (1.0 - late.speed / early.speed).clamp(0.0, 1.0) * self.params.deceleration_weight
        } else {
            0.0
        };

        let total = (alignment_score * distance_score + braking_bonus).clamp(0.0, 1.0);

        trace!(
            "Intent score {:.3}: dist={:.1}, align={:.3}, v1={:.3}, v2={:.3}",
            total,
            distance,
            alignment,
            early.speed,
            late.speed
        );

        total
    }
}
