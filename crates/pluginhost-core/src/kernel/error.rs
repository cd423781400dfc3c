//! The crate-root error type, aggregating every subsystem's error enum
//! behind `#[from]` so a library consumer can work with a single
//! `Result<T>` end to end, while internal code keeps the narrower,
//! subsystem-specific error type where that's more precise (e.g.
//! `PluginSpec::read` returns a `PluginSystemError`, not this one).
use std::result::Result as StdResult;

use crate::config_expr::ConfigExprError;
use crate::persistence::PersistenceError;
use crate::plugin_system::PluginSystemError;
use crate::resource::ResourceError;
use crate::topo::TopoError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("plugin system error: {0}")]
    PluginSystem(#[from] PluginSystemError),

    #[error("topological sort error: {0}")]
    Topo(#[from] TopoError),

    #[error("configuration expression error: {0}")]
    ConfigExpr(#[from] ConfigExprError),

    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),

    #[error("persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = StdResult<T, Error>;

impl From<&str> for Error {
    fn from(msg: &str) -> Self {
        Error::Other(msg.to_string())
    }
}

impl From<String> for Error {
    fn from(msg: String) -> Self {
        Error::Other(msg)
    }
}
