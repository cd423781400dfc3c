//! # Plugin System Errors
//!
//! Defines error types specific to the plugin lifecycle: reading a spec file,
//! resolving its dependencies, loading its library, and initializing it.
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum PluginSystemError {
    #[error("plugin spec file '{path}' could not be read: {source}")]
    FileUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("plugin spec file '{path}' is not valid XML (line {line}): {message}")]
    ParseError {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("plugin '{plugin_name}' could not resolve dependency on '{dependency_name}'")]
    UnresolvedDependency {
        plugin_name: String,
        dependency_name: String,
    },

    #[error("Circular dependency detected among: {}", .cycle.join(" -> "))]
    CircularDependency { cycle: Vec<String> },

    #[error("failed to load library for plugin '{plugin_name}' at '{path}': {message}")]
    LoadingError {
        plugin_name: String,
        path: PathBuf,
        message: String,
    },

    #[error("plugin '{plugin_name}' failed to initialize: {message}")]
    InitializationError { plugin_name: String, message: String },

    #[error("operation '{operation}' invalid for plugin '{plugin_name}' in state {state}")]
    InvalidState {
        plugin_name: String,
        operation: &'static str,
        state: String,
    },

    #[error("internal plugin system error: {0}")]
    InternalError(String),
}
