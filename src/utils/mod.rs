//! Utility Functions
//!
//! User-friendly error formatting for the replay binary.
//!
//! ```rust
//! use intent_prefetch::utils::format_user_error;
//!
//! let err = anyhow::anyhow!("Failed to read trace file: missing.json");
//! eprintln!("{}", format_user_error(&err));
//! ```

pub mod errors;

pub use errors::format_user_error;
