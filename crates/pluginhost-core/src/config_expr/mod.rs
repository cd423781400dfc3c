//! Configuration expression evaluator.
//!
//! A [`ConfigurationExpr`] is an immutable tree describing either a
//! *provided* configuration (what resources and versions are present) or a
//! *required* one (a predicate over those resources). [`ConfigurationExpr::satisfies`]
//! evaluates a required expression against a provided one using the
//! process-wide [`ComparatorRegistry`](crate::resource::ComparatorRegistry)
//! for any version comparisons it needs.

mod error;
mod expr;

pub use error::ConfigExprError;
pub use expr::{ConfigurationExpr, RelOp};
