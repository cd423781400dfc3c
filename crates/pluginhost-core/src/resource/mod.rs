//! Resource identity and version comparison.
//!
//! A [`ResourceId`] is a globally interned handle for a human-readable
//! resource name (a plugin name, a feature name, anything the
//! [`crate::config_expr`] evaluator reasons about). [`Comparator`] is a
//! process-wide, write-once-per-resource registry of version comparison
//! functions, used by [`crate::config_expr`] to evaluate `Rel` nodes.

mod error;
mod id;
mod registry;

pub use error::ResourceError;
pub use id::ResourceId;
pub use registry::{default_compare, ComparatorRegistry, CompareFn};
