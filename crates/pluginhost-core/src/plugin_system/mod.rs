//! Plugin discovery, dependency resolution, and lifecycle management.
//!
//! - [`spec`]: one parsed description file and its state machine
//!   (`PluginSpec`, `PluginSpecState`).
//! - [`dependency`]: the `PluginDependency` value type.
//! - [`parser`]: the XML spec-file grammar.
//! - [`loader`]: the dynamic-loading boundary (`Plugin`, `DynamicLoader`).
//! - [`resolver`]: arena-wide dependency resolution, propagation, and
//!   load/unload ordering.
//! - [`manager`]: the orchestrator (`PluginManager`) tying the above
//!   together with discovery and persistence.
//! - [`error`][]: `PluginSystemError`.

pub mod dependency;
pub mod error;
pub mod loader;
pub mod manager;
pub mod parser;
pub mod resolver;
pub mod spec;

#[cfg(test)]
mod tests;

pub use dependency::PluginDependency;
pub use error::PluginSystemError;
pub use loader::{DynamicLoader, LibloadingDynamicLoader, Plugin};
pub use manager::{NullProgressMonitor, PluginManager, ProgressMonitor};
pub use spec::{PluginSpec, PluginSpecState};
