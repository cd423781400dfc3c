//! The plugin spec state machine: one parsed description file and its
//! position in `Invalid -> Read -> Resolved -> Loaded -> Initialized`.

use std::path::{Path, PathBuf};

use super::dependency::PluginDependency;
use super::error::PluginSystemError;
use super::loader::{DynamicLoader, LoadedPlugin};
use super::parser;

/// A plugin's position in its lifecycle. Ordered: a spec can only move
/// forward except for the two explicitly-modeled backward transitions
/// (`Resolved -> Read` on re-resolution, `Initialized -> Resolved` via
/// [`PluginSpec::unload_plugin`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum PluginSpecState {
    Invalid,
    Read,
    Resolved,
    Loaded,
    Initialized,
}

impl std::fmt::Display for PluginSpecState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PluginSpecState::Invalid => "Invalid",
            PluginSpecState::Read => "Read",
            PluginSpecState::Resolved => "Resolved",
            PluginSpecState::Loaded => "Loaded",
            PluginSpecState::Initialized => "Initialized",
        };
        f.write_str(s)
    }
}

/// A handle into the [`super::manager::PluginManager`]'s spec arena. Edges
/// between specs (`dependency_specs`, `provides_specs`) are stored as these
/// handles rather than owned references — specs never own one another.
pub type SpecHandle = usize;

/// One parsed plugin description file and everything derived from it.
pub struct PluginSpec {
    pub name: String,
    pub version: String,
    pub description: String,
    pub category: String,
    pub dependencies: Vec<PluginDependency>,
    pub file_path: PathBuf,
    pub file_name: String,

    pub enabled: bool,
    pub persistent: bool,
    pub indirectly_disabled: bool,
    pub initialization_failed: bool,
    pub circular_dependency_detected: bool,

    pub dependency_specs: Vec<SpecHandle>,
    pub provides_specs: Vec<SpecHandle>,

    plugin: Option<LoadedPlugin>,
    state: PluginSpecState,
    has_error: bool,
    error_string: String,
}

impl PluginSpec {
    /// A freshly constructed spec, not yet read from any file.
    pub fn empty() -> Self {
        Self {
            name: String::new(),
            version: String::new(),
            description: String::new(),
            category: String::new(),
            dependencies: Vec::new(),
            file_path: PathBuf::new(),
            file_name: String::new(),
            enabled: false,
            persistent: false,
            indirectly_disabled: false,
            initialization_failed: false,
            circular_dependency_detected: false,
            dependency_specs: Vec::new(),
            provides_specs: Vec::new(),
            plugin: None,
            state: PluginSpecState::Invalid,
            has_error: false,
            error_string: String::new(),
        }
    }

    pub fn state(&self) -> PluginSpecState {
        self.state
    }

    pub fn has_error(&self) -> bool {
        self.has_error
    }

    pub fn error_string(&self) -> &str {
        &self.error_string
    }

    pub fn plugin(&self) -> Option<&LoadedPlugin> {
        self.plugin.as_ref()
    }

    pub(crate) fn record_error(&mut self, message: impl AsRef<str>) {
        self.has_error = true;
        if self.error_string.is_empty() {
            self.error_string = message.as_ref().to_string();
        } else {
            self.error_string.push('\n');
            self.error_string.push_str(message.as_ref());
        }
    }

    /// Parses a spec file from disk, resetting all prior state. On
    /// success advances to [`PluginSpecState::Read`] and sets `enabled`.
    pub fn read(&mut self, path: &Path) -> Result<(), PluginSystemError> {
        *self = Self::empty();
        self.file_path = path.to_path_buf();
        self.file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let contents = std::fs::read_to_string(path).map_err(|source| PluginSystemError::FileUnreadable {
            path: path.to_path_buf(),
            source,
        })?;

        let parsed = parser::parse(&contents, path)?;
        self.name = parsed.name;
        self.version = parsed.version;
        self.description = parsed.description;
        self.category = parsed.category;
        self.dependencies = parsed.dependencies;
        self.enabled = true;
        self.state = PluginSpecState::Read;
        Ok(())
    }

    /// Resolves `dependencies` against `all_specs` by name, recording a
    /// forward edge on self and a reverse edge on the dependency. Missing
    /// dependencies are recorded as errors but do not stop the scan — every
    /// missing dependency is reported. Idempotent: re-resolving first
    /// reverts an already-`Resolved` spec back to `Read`.
    pub fn resolve_dependencies(
        &mut self,
        self_handle: SpecHandle,
        name_lookup: &std::collections::HashMap<String, SpecHandle>,
        reverse_edges: &mut Vec<(SpecHandle, SpecHandle)>,
    ) -> Result<(), PluginSystemError> {
        if self.state < PluginSpecState::Read {
            return Err(PluginSystemError::InvalidState {
                plugin_name: self.name.clone(),
                operation: "resolve_dependencies",
                state: self.state.to_string(),
            });
        }
        if self.state == PluginSpecState::Resolved {
            self.state = PluginSpecState::Read;
        }
        self.dependency_specs.clear();

        let dependencies = self.dependencies.clone();
        for dep in &dependencies {
            match name_lookup.get(&dep.name) {
                Some(&handle) => {
                    self.dependency_specs.push(handle);
                    reverse_edges.push((handle, self_handle));
                }
                None => {
                    self.record_error(format!("could not resolve dependency on {}", dep.name));
                }
            }
        }
        self.state = PluginSpecState::Resolved;
        Ok(())
    }

    /// Builds the platform library file name for this spec.
    pub fn library_file_name(&self) -> PathBuf {
        let dir = self.file_path.parent().unwrap_or_else(|| Path::new("."));
        dir.join(super::loader::platform_library_name(&self.name))
    }

    /// Loads this spec's library. Requires every forward dependency to
    /// already be loaded (the caller is expected to have driven the load
    /// queue in order).
    pub fn load_plugin(
        &mut self,
        dependency_states: &[PluginSpecState],
        loader: &dyn DynamicLoader,
    ) -> Result<(), PluginSystemError> {
        if self.state != PluginSpecState::Resolved {
            return Err(PluginSystemError::InvalidState {
                plugin_name: self.name.clone(),
                operation: "load_plugin",
                state: self.state.to_string(),
            });
        }
        if dependency_states.iter().any(|s| *s < PluginSpecState::Loaded) {
            return Ok(());
        }

        let path = self.library_file_name();
        match loader.load(&path) {
            Ok(plugin) => {
                self.plugin = Some(plugin);
                self.state = PluginSpecState::Loaded;
                Ok(())
            }
            Err(message) => {
                self.record_error(&message);
                Err(PluginSystemError::LoadingError {
                    plugin_name: self.name.clone(),
                    path,
                    message,
                })
            }
        }
    }

    pub fn initialize_plugin(&mut self) -> Result<(), PluginSystemError> {
        if self.state != PluginSpecState::Loaded {
            return Err(PluginSystemError::InvalidState {
                plugin_name: self.name.clone(),
                operation: "initialize_plugin",
                state: self.state.to_string(),
            });
        }
        let plugin = self
            .plugin
            .as_mut()
            .expect("state Loaded implies plugin is populated");
        match plugin.initialize() {
            Ok(()) => {
                self.state = PluginSpecState::Initialized;
                self.initialization_failed = false;
                Ok(())
            }
            Err(message) => {
                self.initialization_failed = true;
                self.record_error(&message);
                Err(PluginSystemError::InitializationError {
                    plugin_name: self.name.clone(),
                    message,
                })
            }
        }
    }

    pub fn unload_plugin(&mut self, loader: &dyn DynamicLoader) {
        if self.state >= PluginSpecState::Initialized
            && let Some(plugin) = self.plugin.as_mut()
        {
            plugin.shutdown();
        }
        if self.plugin.is_some() && !loader.unload(&self.library_file_name()) {
            log::warn!("library for plugin '{}' reported as still referenced on unload", self.name);
        }
        self.plugin = None;
        if self.state >= PluginSpecState::Resolved {
            self.state = PluginSpecState::Resolved;
        }
    }

    pub fn is_shutdown_requested(&self) -> bool {
        self.plugin
            .as_ref()
            .map(|p| p.is_shutdown_requested())
            .unwrap_or(false)
    }

    /// Test-only: lets resolver/manager tests build a spec in memory
    /// (no file on disk) and drive it straight to `Read`, exactly as
    /// `read()` would leave it on success.
    #[cfg(test)]
    pub(crate) fn promote_to_read_for_tests(&mut self) {
        self.state = PluginSpecState::Read;
    }

    /// Test-only: lets resolver tests exercise `unload_queue` (which only
    /// considers specs at `Loaded` or later) without a real dynamic loader.
    #[cfg(test)]
    pub(crate) fn promote_to_loaded_for_tests(&mut self) {
        self.state = PluginSpecState::Loaded;
    }
}
