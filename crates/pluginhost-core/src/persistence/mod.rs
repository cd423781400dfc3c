//! The host-provided key-value settings store the plugin manager persists
//! its disabled-plugin list and active style-sheet name through (§6 of the
//! design: `PluginManager/PluginSpec.DisabledPlugins` and
//! `PluginManager/ActiveStyleSheet`).

mod error;
mod file_store;

pub use error::PersistenceError;
pub use file_store::FilePersistenceStore;

pub const DISABLED_PLUGINS_KEY: &str = "PluginManager/PluginSpec.DisabledPlugins";
pub const ACTIVE_STYLE_SHEET_KEY: &str = "PluginManager/ActiveStyleSheet";

/// A host-provided settings store. The plugin manager only ever reads and
/// writes whole JSON values under string keys — it has no opinion on how
/// the host actually persists them.
pub trait PersistenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<serde_json::Value>;
    fn set(&mut self, key: &str, value: serde_json::Value);

    /// Flushes pending writes to the backing medium. Stores with no
    /// separate flush step (an in-memory store, say) can leave this as
    /// the default no-op.
    fn save(&self) -> Result<(), PersistenceError> {
        Ok(())
    }
}
