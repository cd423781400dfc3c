//! The dynamic loader boundary: turning a path on disk into a live
//! [`Plugin`] instance. This module owns the trait, not the plugins
//! themselves — everything past [`DynamicLoader::load`] is opaque to the
//! rest of the crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use libloading::Library;

/// The interface every loaded plugin library must implement.
pub trait Plugin: Send {
    /// Allocates whatever resources the plugin needs. `Err` carries the
    /// message to surface to the user; the plugin spec stays at `Loaded`.
    fn initialize(&mut self) -> Result<(), String>;

    /// Releases resources. Called at most once, and only after a
    /// successful `initialize`.
    fn shutdown(&mut self) {}

    /// Advisory: if true, the manager aborts the remainder of the
    /// current initialization pass.
    fn is_shutdown_requested(&self) -> bool {
        false
    }
}

/// A loaded plugin instance together with the library handle that must
/// outlive it (dropping the `Library` before the `Plugin` trait object
/// would leave the vtable dangling).
pub struct LoadedPlugin {
    plugin: Box<dyn Plugin>,
    _library: Option<Library>,
}

impl LoadedPlugin {
    pub fn new(plugin: Box<dyn Plugin>, library: Option<Library>) -> Self {
        Self {
            plugin,
            _library: library,
        }
    }

    pub fn initialize(&mut self) -> Result<(), String> {
        self.plugin.initialize()
    }

    pub fn shutdown(&mut self) {
        self.plugin.shutdown()
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.plugin.is_shutdown_requested()
    }
}

/// The opaque dynamic-loading service a [`super::spec::PluginSpec`]
/// depends on. Swappable so tests can load plugins without touching disk.
pub trait DynamicLoader: Send + Sync {
    fn load(&self, path: &Path) -> Result<LoadedPlugin, String>;
    fn unload(&self, path: &Path) -> bool;
}

/// The symbol every plugin library exports: a factory returning a freshly
/// boxed plugin instance.
pub type PluginCreateFn = unsafe extern "C" fn() -> *mut dyn Plugin;

const ENTRY_SYMBOL: &[u8] = b"pluginhost_plugin_create";

/// `libloading`-backed [`DynamicLoader`]. Keeps every library it has
/// opened alive for the process lifetime so repeated `unload` calls on a
/// still-referenced library can be detected rather than crashing.
pub struct LibloadingDynamicLoader {
    open: Mutex<HashMap<PathBuf, usize>>,
}

impl LibloadingDynamicLoader {
    pub fn new() -> Self {
        Self {
            open: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for LibloadingDynamicLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl DynamicLoader for LibloadingDynamicLoader {
    fn load(&self, path: &Path) -> Result<LoadedPlugin, String> {
        // SAFETY: the caller guarantees `path` names a library built against
        // this crate's `Plugin` ABI and exporting `ENTRY_SYMBOL`. A plugin
        // that violates that contract is a configuration error, not
        // something this loader can validate ahead of the call.
        let library = unsafe { Library::new(path) }.map_err(|e| e.to_string())?;
        let create: libloading::Symbol<PluginCreateFn> =
            unsafe { library.get(ENTRY_SYMBOL) }.map_err(|e| e.to_string())?;
        let raw = unsafe { create() };
        if raw.is_null() {
            return Err(format!("{} returned a null plugin", String::from_utf8_lossy(ENTRY_SYMBOL)));
        }
        let plugin = unsafe { Box::from_raw(raw) };

        let mut open = self.open.lock().expect("loader table poisoned");
        *open.entry(path.to_path_buf()).or_insert(0) += 1;

        Ok(LoadedPlugin::new(plugin, Some(library)))
    }

    fn unload(&self, path: &Path) -> bool {
        let mut open = self.open.lock().expect("loader table poisoned");
        match open.get_mut(path) {
            Some(count) if *count > 1 => {
                *count -= 1;
                false
            }
            Some(_) => {
                open.remove(path);
                true
            }
            None => true,
        }
    }
}

pub fn platform_library_name(plugin_name: &str) -> String {
    #[cfg(all(debug_assertions, target_os = "windows"))]
    {
        format!("{plugin_name}d.dll")
    }
    #[cfg(all(not(debug_assertions), target_os = "windows"))]
    {
        format!("{plugin_name}.dll")
    }
    #[cfg(all(debug_assertions, target_os = "macos"))]
    {
        format!("lib{plugin_name}_debug.dylib")
    }
    #[cfg(all(not(debug_assertions), target_os = "macos"))]
    {
        format!("lib{plugin_name}.dylib")
    }
    #[cfg(not(any(target_os = "windows", target_os = "macos")))]
    {
        format!("lib{plugin_name}.so")
    }
}
