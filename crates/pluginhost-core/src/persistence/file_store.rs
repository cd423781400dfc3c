use std::collections::HashMap;
use std::path::PathBuf;

use super::{PersistenceError, PersistenceStore};

/// A [`PersistenceStore`] backed by a single JSON document on disk, read
/// once at construction and written back on [`FilePersistenceStore::save`].
pub struct FilePersistenceStore {
    path: PathBuf,
    values: HashMap<String, serde_json::Value>,
}

impl FilePersistenceStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).map_err(|source| PersistenceError::Malformed {
                path: path.clone(),
                source,
            })?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(source) => return Err(PersistenceError::Read { path, source }),
        };
        Ok(Self { path, values })
    }

}

impl PersistenceStore for FilePersistenceStore {
    fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.values.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: serde_json::Value) {
        self.values.insert(key.to_string(), value);
    }

    fn save(&self) -> Result<(), PersistenceError> {
        let serialized = serde_json::to_string_pretty(&self.values).expect("HashMap<String, Value> always serializes");
        if let Some(parent) = self.path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        std::fs::write(&self.path, serialized).map_err(|source| PersistenceError::Write {
            path: self.path.clone(),
            source,
        })
    }
}
