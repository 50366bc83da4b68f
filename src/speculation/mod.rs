//! Speculative action lifecycle
//!
//! Runs a read-only action ahead of the user's commit when the intent score
//! for a target says they are about to interact with it, and keeps the
//! result until they do (or clearly don't).
//!
//! # Components
//!
//! | Type | Role |
//! |------|------|
//! | [`SpeculationController`] | Per-target state machine |
//! | [`SpeculativeAction`] | The cancellable work being speculated |
//! | [`EnvironmentGate`] | One-shot "may we speculate here" check |
//! | [`SpeculationStatus`] | `idle`, `speculating`, `ready`, `committed` |
//!
//! # Failure Semantics
//!
//! - Cancellation is expected and silent (logged only with `debug_logging`)
//! - Any other action failure drops the shadow result and returns to idle;
//!   nothing is retried automatically
//! - A failure only reaches a caller through `commit()` when the attempt it
//!   awaited failed

mod action;
mod controller;
mod error;
mod gate;
mod state;

pub use action::{action_fn, ActionFn, SpeculativeAction};
pub use controller::{SpeculationConfig, SpeculationController};
pub use error::{ActionError, Result, SpeculationError};
pub use gate::{AlwaysAllow, EnvironmentGate, StaticGate};
pub use state::{CommitServe, SpeculationStats, SpeculationStatus};
