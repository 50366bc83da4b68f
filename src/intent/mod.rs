//! Intent scoring
//!
//! Stateless geometric/kinematic scoring of pointer motion against a
//! target region.
//!
//! # Pipeline
//!
//! ```text
//! history snapshot (oldest first)
//!   └─> window (trailing history_size samples)
//!       ├─> hit test          -> 1.0
//!       ├─> proximity gate    -> 0.0
//!       ├─> two-phase velocity
//!       ├─> noise gate        -> 0.0
//!       ├─> alignment gate    -> 0.0
//!       └─> alignment³ · distance falloff + braking bonus
//! ```

mod geometry;
mod scorer;

pub use geometry::{GeometryProvider, PositionSample, SharedGeometry, TargetRect};
pub use scorer::{IntentScorer, ScoringParams, BRAKING_ALIGNMENT, MIN_SAMPLES};
