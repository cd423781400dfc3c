//! A plugin lifecycle manager: discovers plugin description files,
//! resolves their dependency graph, and drives each plugin through
//! `Invalid -> Read -> Resolved -> Loaded -> Initialized`.
//!
//! The engine is built from three largely independent layers:
//!
//! - [`topo`]: a generic topological sort kernel with pluggable
//!   tie-break policies, used by [`plugin_system::resolver`] but usable
//!   on its own.
//! - [`resource`] and [`config_expr`]: resource identity, a per-resource
//!   version comparator registry, and the configuration-expression
//!   predicate language built on top of it.
//! - [`plugin_system`]: the plugin spec state machine, the XML spec-file
//!   parser, the dynamic loader boundary, the dependency resolver, and
//!   the [`plugin_system::PluginManager`] that ties them together.
//!
//! [`persistence`] and [`kernel`] are the ambient stack: a settings
//! store and a crate-wide error aggregator, respectively.

pub mod config_expr;
pub mod kernel;
pub mod persistence;
pub mod plugin_system;
pub mod resource;
pub mod topo;

pub use kernel::{Error, Result};
pub use plugin_system::{DynamicLoader, Plugin, PluginDependency, PluginManager, PluginSpec, PluginSpecState};
