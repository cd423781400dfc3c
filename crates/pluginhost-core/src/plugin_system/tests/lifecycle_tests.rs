//! End-to-end coverage of [`PluginManager::initialize_plugins`] and
//! [`PluginManager::unload_plugins`], driving real spec files on disk
//! through a fake [`DynamicLoader`] so plugin behaviour (init success,
//! init failure, shutdown requests) is fully controllable.

use std::io::Write as _;
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::persistence::FilePersistenceStore;
use crate::plugin_system::loader::test_support::FakeLoader;
use crate::plugin_system::loader::Plugin;
use crate::plugin_system::manager::{PluginManager, ProgressMonitor, SPEC_FILE_SUFFIX};
use crate::plugin_system::spec::PluginSpecState;

struct RecordingMonitor {
    statuses: Vec<String>,
}

impl ProgressMonitor for RecordingMonitor {
    fn set_status(&mut self, text: &str) {
        self.statuses.push(text.to_string());
    }
}

#[derive(Clone, Default)]
struct Behaviour {
    fail_init: bool,
    shutdown_requested: bool,
}

struct ScriptedPlugin {
    name: String,
    behaviour: Behaviour,
    events: Arc<Mutex<Vec<String>>>,
}

impl Plugin for ScriptedPlugin {
    fn initialize(&mut self) -> Result<(), String> {
        self.events.lock().unwrap().push(format!("init:{}", self.name));
        if self.behaviour.fail_init {
            Err(format!("{} refused to initialize", self.name))
        } else {
            Ok(())
        }
    }

    fn shutdown(&mut self) {
        self.events.lock().unwrap().push(format!("shutdown:{}", self.name));
    }

    fn is_shutdown_requested(&self) -> bool {
        self.behaviour.shutdown_requested
    }
}

fn write_spec(dir: &Path, name: &str, deps: &[&str]) {
    let dep_xml: String = deps.iter().map(|d| format!(r#"<dependency name="{d}"/>"#)).collect();
    let xml = format!(
        r#"<plugin name="{name}" version="1.0"><dependencyList>{dep_xml}</dependencyList></plugin>"#
    );
    let path = dir.join(format!("{name}{SPEC_FILE_SUFFIX}"));
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(xml.as_bytes()).unwrap();
}

/// Recovers the plugin name from the library path `loader.load()` receives
/// — the inverse of `loader::platform_library_name`.
fn name_from_path(path: &Path) -> String {
    let stem = path.file_stem().unwrap().to_string_lossy().into_owned();
    let stem = stem.strip_prefix("lib").unwrap_or(&stem);
    let stem = stem.strip_suffix("_debug").unwrap_or(stem);
    #[cfg(all(debug_assertions, target_os = "windows"))]
    let stem = stem.strip_suffix('d').unwrap_or(stem);
    stem.to_string()
}

/// Builds a loader whose plugins are scripted per spec name. Any name
/// not present in `behaviours` gets a plugin that always succeeds.
fn scripted_loader(
    events: Arc<Mutex<Vec<String>>>,
    behaviours: Vec<(&'static str, Behaviour)>,
) -> FakeLoader<impl Fn(&Path) -> Result<Box<dyn Plugin>, String>> {
    let behaviours: std::collections::HashMap<String, Behaviour> =
        behaviours.into_iter().map(|(n, b)| (n.to_string(), b)).collect();
    FakeLoader {
        factory: move |path: &Path| {
            let name = name_from_path(path);
            let behaviour = behaviours.get(&name).cloned().unwrap_or_default();
            Ok(Box::new(ScriptedPlugin {
                name,
                behaviour,
                events: events.clone(),
            }) as Box<dyn Plugin>)
        },
    }
}

fn fresh_manager(dir: &Path) -> PluginManager {
    let store = FilePersistenceStore::open(dir.join("settings.json")).unwrap();
    PluginManager::new(Box::new(store))
}

#[tokio::test]
async fn every_plugin_initializes_in_dependency_order() {
    let dir = tempfile::tempdir().unwrap();
    write_spec(dir.path(), "base", &[]);
    write_spec(dir.path(), "derived", &["base"]);

    let events = Arc::new(Mutex::new(Vec::new()));
    let loader = scripted_loader(events, vec![]);
    let mut manager = fresh_manager(dir.path());
    manager.load_plugins(&[dir.path().to_path_buf()], &loader).await.unwrap();

    let mut monitor = RecordingMonitor { statuses: Vec::new() };
    let ok = manager.initialize_plugins(&mut monitor, &loader);

    assert!(ok);
    assert_eq!(monitor.statuses, vec!["base", "derived"]);
    assert_eq!(manager.find_by_name("base").unwrap().state(), PluginSpecState::Initialized);
    assert_eq!(manager.find_by_name("derived").unwrap().state(), PluginSpecState::Initialized);
}

#[tokio::test]
async fn a_failed_initialize_unloads_its_transitive_dependents() {
    let dir = tempfile::tempdir().unwrap();
    write_spec(dir.path(), "base", &[]);
    write_spec(dir.path(), "middle", &["base"]);
    write_spec(dir.path(), "top", &["middle"]);

    let events = Arc::new(Mutex::new(Vec::new()));
    let loader = scripted_loader(
        events,
        vec![("middle", Behaviour { fail_init: true, shutdown_requested: false })],
    );
    let mut manager = fresh_manager(dir.path());
    manager.load_plugins(&[dir.path().to_path_buf()], &loader).await.unwrap();

    let mut monitor = RecordingMonitor { statuses: Vec::new() };
    let ok = manager.initialize_plugins(&mut monitor, &loader);

    assert!(!ok, "overall pass must report failure when a dependent never reaches Initialized");
    assert_eq!(manager.find_by_name("base").unwrap().state(), PluginSpecState::Initialized);

    let middle = manager.find_by_name("middle").unwrap();
    assert_eq!(middle.state(), PluginSpecState::Loaded);
    assert!(middle.has_error());
    assert!(middle.error_string().contains("refused to initialize"));

    let top = manager.find_by_name("top").unwrap();
    assert!(top.indirectly_disabled, "top depends (transitively) on the failed plugin");
    assert_eq!(top.state(), PluginSpecState::Resolved, "unloaded back down from Loaded");
}

#[tokio::test]
async fn shutdown_request_aborts_the_remaining_initialization_pass() {
    let dir = tempfile::tempdir().unwrap();
    // "first" and "last" are independent of each other; queue order is
    // name-sorted, so "first" initializes strictly before "last".
    write_spec(dir.path(), "first", &[]);
    write_spec(dir.path(), "last", &[]);

    let events = Arc::new(Mutex::new(Vec::new()));
    let loader = scripted_loader(
        events.clone(),
        vec![("first", Behaviour { fail_init: true, shutdown_requested: true })],
    );
    let mut manager = fresh_manager(dir.path());
    manager.load_plugins(&[dir.path().to_path_buf()], &loader).await.unwrap();

    let mut monitor = RecordingMonitor { statuses: Vec::new() };
    let ok = manager.initialize_plugins(&mut monitor, &loader);

    assert!(!ok);
    assert_eq!(monitor.statuses, vec!["first"], "the pass must stop before 'last' is even notified");
    assert_eq!(
        manager.find_by_name("last").unwrap().state(),
        PluginSpecState::Loaded,
        "untouched: neither initialized nor unloaded"
    );
    assert!(!events.lock().unwrap().contains(&"init:last".to_string()));
}

#[tokio::test]
async fn unload_plugins_shuts_down_dependents_before_dependencies() {
    let dir = tempfile::tempdir().unwrap();
    write_spec(dir.path(), "base", &[]);
    write_spec(dir.path(), "mid", &["base"]);
    write_spec(dir.path(), "top", &["mid"]);

    let events = Arc::new(Mutex::new(Vec::new()));
    let loader = scripted_loader(events.clone(), vec![]);
    let mut manager = fresh_manager(dir.path());
    manager.load_plugins(&[dir.path().to_path_buf()], &loader).await.unwrap();
    let mut monitor = RecordingMonitor { statuses: Vec::new() };
    assert!(manager.initialize_plugins(&mut monitor, &loader));

    manager.unload_plugins(&loader);

    let log = events.lock().unwrap().clone();
    let shutdown_order: Vec<&str> = log
        .iter()
        .filter_map(|e| e.strip_prefix("shutdown:"))
        .collect();
    assert_eq!(shutdown_order, vec!["top", "mid", "base"]);

    for name in ["base", "mid", "top"] {
        assert_eq!(manager.find_by_name(name).unwrap().state(), PluginSpecState::Resolved);
    }
}
