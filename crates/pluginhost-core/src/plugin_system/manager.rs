//! The plugin manager: discovers spec files, drives every spec through
//! its lifecycle, and persists the disabled-plugin list.

use std::collections::HashSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use tokio::fs;

use crate::persistence::{PersistenceStore, ACTIVE_STYLE_SHEET_KEY, DISABLED_PLUGINS_KEY};

use super::error::PluginSystemError;
use super::loader::DynamicLoader;
use super::resolver;
use super::spec::{PluginSpec, PluginSpecState};

/// Suffix a spec file must end in to be discovered.
pub const SPEC_FILE_SUFFIX: &str = ".plugin.xml";

/// Notified once per plugin immediately before its `initialize` is called.
pub trait ProgressMonitor {
    fn set_status(&mut self, text: &str);
}

/// A [`ProgressMonitor`] that does nothing, for callers that don't care.
pub struct NullProgressMonitor;
impl ProgressMonitor for NullProgressMonitor {
    fn set_status(&mut self, _text: &str) {}
}

/// Owns every [`PluginSpec`] discovered so far and orchestrates their
/// lifecycle. All edges between specs are handles into `self.arena`; no
/// spec owns another.
pub struct PluginManager {
    arena: Vec<PluginSpec>,
    store: Box<dyn PersistenceStore>,
}

impl PluginManager {
    pub fn new(store: Box<dyn PersistenceStore>) -> Self {
        Self {
            arena: Vec::new(),
            store,
        }
    }

    pub fn specs(&self) -> &[PluginSpec] {
        &self.arena
    }

    pub fn find_by_name(&self, name: &str) -> Option<&PluginSpec> {
        self.arena.iter().find(|s| s.name == name)
    }

    fn disabled_names(&self) -> HashSet<String> {
        self.store
            .get(DISABLED_PLUGINS_KEY)
            .and_then(|v| serde_json::from_value::<Vec<String>>(v).ok())
            .map(|names| names.into_iter().collect())
            .unwrap_or_default()
    }

    /// Writes the current disabled-plugin set back to the persistence
    /// store, de-duplicated. Does not flush the store to its backing
    /// medium — callers must call [`PluginManager::save`] themselves
    /// afterward.
    pub fn save_disabled_plugins(&mut self) {
        let mut names: Vec<String> = self
            .arena
            .iter()
            .filter(|s| !s.enabled && !s.persistent)
            .map(|s| s.name.clone())
            .collect();
        names.sort();
        names.dedup();
        self.store.set(DISABLED_PLUGINS_KEY, serde_json::json!(names));
    }

    /// Flushes the persistence store to its backing medium. A no-op for
    /// stores that don't buffer writes.
    pub fn save(&self) -> Result<(), crate::persistence::PersistenceError> {
        self.store.save()
    }

    /// The name of the active style sheet, as last persisted. Opaque to
    /// this core — nothing here reads it back for its own purposes — but
    /// the persistence contract names it, so it is carried regardless.
    pub fn active_style_sheet(&self) -> Option<String> {
        self.store
            .get(ACTIVE_STYLE_SHEET_KEY)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    /// Persists the active style sheet name. Like
    /// [`PluginManager::save_disabled_plugins`], does not flush the store
    /// to its backing medium — callers must call
    /// [`PluginManager::save`] themselves afterward.
    pub fn set_active_style_sheet(&mut self, name: &str) {
        self.store.set(ACTIVE_STYLE_SHEET_KEY, serde_json::json!(name));
    }

    /// Discovers spec files under `roots`, reads each one, resolves the
    /// dependency graph, and loads every plugin in dependency order.
    /// Precondition: no plugins are currently loaded.
    pub async fn load_plugins(
        &mut self,
        roots: &[PathBuf],
        loader: &dyn DynamicLoader,
    ) -> Result<(), PluginSystemError> {
        assert!(
            self.arena.iter().all(|s| s.state() < PluginSpecState::Loaded),
            "load_plugins called while plugins are already loaded"
        );

        let mut files = Vec::new();
        for root in roots {
            discover_spec_files(root, &mut files).await;
        }
        log::info!("discovered {} plugin spec file(s)", files.len());

        self.arena.clear();
        for path in &files {
            let mut spec = PluginSpec::empty();
            match spec.read(path) {
                Ok(()) => log::debug!("read plugin spec '{}' from {}", spec.name, path.display()),
                Err(e) => log::warn!("failed to read plugin spec {}: {e}", path.display()),
            }
            self.arena.push(spec);
        }

        let disabled = self.disabled_names();
        for spec in self.arena.iter_mut() {
            if disabled.contains(&spec.name) {
                spec.enabled = false;
            }
        }

        resolver::resolve_all(&mut self.arena);

        for handle in resolver::load_queue(&self.arena) {
            let dep_states: Vec<PluginSpecState> = self.arena[handle]
                .dependency_specs
                .iter()
                .map(|&d| self.arena[d].state())
                .collect();
            if let Err(e) = self.arena[handle].load_plugin(&dep_states, loader) {
                log::error!("{e}");
            }
        }

        Ok(())
    }

    /// Initializes every loaded plugin in dependency order. Returns
    /// `false` if a plugin's initialization failure requested shutdown
    /// (in which case the pass stops immediately); otherwise `true`
    /// once every loaded plugin reached `Initialized`.
    pub fn initialize_plugins(&mut self, monitor: &mut dyn ProgressMonitor, loader: &dyn DynamicLoader) -> bool {
        let queue = resolver::load_queue(&self.arena);
        for handle in queue {
            if self.arena[handle].state() != PluginSpecState::Loaded {
                continue;
            }
            monitor.set_status(&self.arena[handle].name);
            if let Err(e) = self.arena[handle].initialize_plugin() {
                log::error!("{e}");
                if self.arena[handle].is_shutdown_requested() {
                    log::error!("plugin '{}' requested shutdown during initialization", self.arena[handle].name);
                    return false;
                }
                let mut stack = Vec::new();
                resolver::resolve_indirectly_disabled(&mut self.arena, handle, true, &mut stack);
                for h in resolver::unload_queue(&self.arena) {
                    if self.arena[h].indirectly_disabled && self.arena[h].state() >= PluginSpecState::Loaded {
                        self.arena[h].unload_plugin(loader);
                    }
                }
            }
        }
        log::info!("plugin initialization pass complete");
        self.arena
            .iter()
            .filter(|s| s.enabled && !s.indirectly_disabled && s.state() >= PluginSpecState::Loaded)
            .all(|s| s.state() == PluginSpecState::Initialized)
    }

    /// Unloads every loaded plugin, dependents before dependencies.
    pub fn unload_plugins(&mut self, loader: &dyn DynamicLoader) {
        for handle in resolver::unload_queue(&self.arena) {
            self.arena[handle].unload_plugin(loader);
        }
    }

    /// Marks a spec as persistent: the application's required core
    /// plugins, which [`PluginManager::set_enabled`] must refuse to
    /// disable. No-op if no spec by that name exists.
    pub fn mark_persistent(&mut self, name: &str) {
        if let Some(spec) = self.arena.iter_mut().find(|s| s.name == name) {
            spec.persistent = true;
        }
    }

    pub fn set_enabled(&mut self, name: &str, enabled: bool) {
        if let Some(spec) = self.arena.iter_mut().find(|s| s.name == name) {
            if spec.persistent {
                return;
            }
            spec.enabled = enabled;
        }
        resolver::resolve_all(&mut self.arena);
    }
}

fn discover_spec_files<'a>(
    dir: &'a Path,
    out: &'a mut Vec<PathBuf>,
) -> Pin<Box<dyn Future<Output = ()> + 'a>> {
    Box::pin(async move {
        let mut entries = match fs::read_dir(dir).await {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("could not read plugin directory {}: {e}", dir.display());
                return;
            }
        };

        while let Ok(Some(entry)) = entries.next_entry().await {
            let path = entry.path();
            let metadata = match fs::metadata(&path).await {
                Ok(m) => m,
                Err(e) => {
                    log::warn!("could not stat {}: {e}", path.display());
                    continue;
                }
            };
            if metadata.is_dir() {
                discover_spec_files(&path, out).await;
            } else if path.to_string_lossy().ends_with(SPEC_FILE_SUFFIX) {
                out.push(path);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::FilePersistenceStore;
    use crate::plugin_system::loader::LibloadingDynamicLoader;
    use std::io::Write;

    fn write_spec(dir: &Path, name: &str, deps: &[&str]) {
        let dep_xml: String = deps
            .iter()
            .map(|d| format!(r#"<dependency name="{d}"/>"#))
            .collect();
        let xml = format!(
            r#"<plugin name="{name}" version="1.0"><description>{name}</description><dependencyList>{dep_xml}</dependencyList></plugin>"#
        );
        let path = dir.join(format!("{name}{SPEC_FILE_SUFFIX}"));
        let mut f = std::fs::File::create(path).unwrap();
        f.write_all(xml.as_bytes()).unwrap();
    }

    #[tokio::test]
    async fn discovers_and_resolves_a_linear_chain() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "A", &[]);
        write_spec(dir.path(), "B", &["A"]);

        let store = FilePersistenceStore::open(dir.path().join("settings.json")).unwrap();
        let mut manager = PluginManager::new(Box::new(store));
        let loader = LibloadingDynamicLoader::new();

        manager
            .load_plugins(&[dir.path().to_path_buf()], &loader)
            .await
            .unwrap();

        assert_eq!(manager.specs().len(), 2);
        assert!(manager.find_by_name("A").is_some());
        assert!(manager.find_by_name("B").is_some());
    }

    #[tokio::test]
    async fn disabled_plugin_persists_and_is_reloaded_as_disabled() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "experimental", &[]);
        let settings_path = dir.path().join("settings.json");

        {
            let store = FilePersistenceStore::open(&settings_path).unwrap();
            let mut manager = PluginManager::new(Box::new(store));
            let loader = LibloadingDynamicLoader::new();
            manager
                .load_plugins(&[dir.path().to_path_buf()], &loader)
                .await
                .unwrap();
            manager.set_enabled("experimental", false);
            manager.save_disabled_plugins();
            manager.save().unwrap();
        }

        let store = FilePersistenceStore::open(&settings_path).unwrap();
        let names: Vec<String> =
            serde_json::from_value(store.get(DISABLED_PLUGINS_KEY).unwrap()).unwrap();
        assert_eq!(names, vec!["experimental".to_string()]);
    }

    #[tokio::test]
    async fn active_style_sheet_persists_across_a_reopened_store() {
        let dir = tempfile::tempdir().unwrap();
        let settings_path = dir.path().join("settings.json");

        {
            let store = FilePersistenceStore::open(&settings_path).unwrap();
            let mut manager = PluginManager::new(Box::new(store));
            assert_eq!(manager.active_style_sheet(), None);
            manager.set_active_style_sheet("midnight");
            manager.save().unwrap();
        }

        let store = FilePersistenceStore::open(&settings_path).unwrap();
        let manager = PluginManager::new(Box::new(store));
        assert_eq!(manager.active_style_sheet(), Some("midnight".to_string()));
    }

    #[tokio::test]
    async fn a_persistent_plugin_cannot_be_disabled() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "core", &[]);

        let store = FilePersistenceStore::open(dir.path().join("settings.json")).unwrap();
        let mut manager = PluginManager::new(Box::new(store));
        let loader = LibloadingDynamicLoader::new();
        manager
            .load_plugins(&[dir.path().to_path_buf()], &loader)
            .await
            .unwrap();

        manager.mark_persistent("core");
        manager.set_enabled("core", false);

        assert!(manager.find_by_name("core").unwrap().enabled);
    }

    #[tokio::test]
    async fn repeated_set_enabled_calls_do_not_duplicate_reverse_edges() {
        let dir = tempfile::tempdir().unwrap();
        write_spec(dir.path(), "A", &[]);
        write_spec(dir.path(), "B", &["A"]);

        let store = FilePersistenceStore::open(dir.path().join("settings.json")).unwrap();
        let mut manager = PluginManager::new(Box::new(store));
        let loader = LibloadingDynamicLoader::new();
        manager
            .load_plugins(&[dir.path().to_path_buf()], &loader)
            .await
            .unwrap();

        for _ in 0..3 {
            manager.set_enabled("B", false);
            manager.set_enabled("B", true);
        }

        assert_eq!(manager.find_by_name("A").unwrap().provides_specs.len(), 1);
    }
}
