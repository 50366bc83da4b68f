//! # intent-prefetch
//!
//! Speculative prefetching driven by pointer intent.
//!
//! A single shared sampler records pointer positions. Each watched target
//! scores the recent motion against its bounds and, when the score clears
//! a threshold, starts its action early so the result is ready (or at
//! least in flight) by the time the user actually commits.
//!
//! # Architecture
//!
//! ```text
//! intent-prefetch
//!   ├─> MotionSampler (one ring buffer, one tick loop, many listeners)
//!   ├─> IntentScorer (pure scoring of a window against a rectangle)
//!   ├─> SpeculationController (per target: idle → speculating → ready → committed)
//!   └─> Replay harness (drives real controllers from a recorded trace)
//! ```
//!
//! # Data Flow
//!
//! **Motion Path:** pointer → SamplerDriver → MotionSampler → tick → controllers
//!
//! **Action Path:** controller → spawned action → cached result → commit()

#![warn(missing_docs)]
#![warn(clippy::all)]

/// Configuration file handling
pub mod config;

/// Intent scoring and target geometry
pub mod intent;

/// Shared motion sampler
pub mod sampler;

/// Speculation lifecycle
pub mod speculation;

/// Trace replay harness
pub mod replay;

/// Utility functions
pub mod utils;
