//! Crate-wide error aggregation.
//!
//! Every other module defines its own error enum; this module exists
//! only to aggregate them into one `Error`/`Result` pair for consumers
//! that don't want to match on each subsystem separately.
pub mod error;

pub use error::{Error, Result};
