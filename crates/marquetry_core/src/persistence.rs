//! # Persistence
//!
//! Key-scoped string storage for UI state that must survive redraws:
//! foldout expansion, the type ignore list and global toggles.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ConfigError;

/// Scoped string store: `(scope, field) -> value`.
pub trait PersistenceStore: Send + Sync {
    /// Loads a value.
    fn load(&self, scope: &str, field: &str) -> Option<String>;

    /// Saves a value.
    fn save(&self, scope: &str, field: &str, value: &str);

    /// Removes every field of a scope.
    fn clear(&self, scope: &str);

    /// Loads a boolean, falling back to `default` when absent or malformed.
    fn load_bool(&self, scope: &str, field: &str, default: bool) -> bool {
        self.load(scope, field)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    /// Saves a boolean.
    fn save_bool(&self, scope: &str, field: &str, value: bool) {
        self.save(scope, field, if value { "true" } else { "false" });
    }
}

/// Shared store handle.
pub type SharedStore = Arc<dyn PersistenceStore>;

/// Volatile in-process store.
#[derive(Default)]
pub struct MemoryStore {
    scopes: RwLock<HashMap<String, HashMap<String, String>>>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty shared store.
    #[must_use]
    pub fn shared() -> SharedStore {
        Arc::new(Self::new())
    }
}

impl PersistenceStore for MemoryStore {
    fn load(&self, scope: &str, field: &str) -> Option<String> {
        self.scopes.read().get(scope)?.get(field).cloned()
    }

    fn save(&self, scope: &str, field: &str, value: &str) {
        self.scopes
            .write()
            .entry(scope.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    fn clear(&self, scope: &str) {
        self.scopes.write().remove(scope);
    }
}

type Tables = BTreeMap<String, BTreeMap<String, String>>;

/// Write-through TOML file store.
///
/// Every save rewrites the file. Write failures are logged and the
/// in-memory state stays authoritative.
pub struct TomlFileStore {
    path: PathBuf,
    tables: RwLock<Tables>,
}

impl TomlFileStore {
    /// Opens a store, reading the file if it exists.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref().to_path_buf();
        let tables = if path.exists() {
            let text = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&text)?
        } else {
            Tables::new()
        };
        Ok(Self {
            path,
            tables: RwLock::new(tables),
        })
    }

    /// File backing the store.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, tables: &Tables) {
        let text = match toml::to_string(tables) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), %err, "failed to encode persisted state");
                return;
            }
        };
        if let Err(err) = std::fs::write(&self.path, text) {
            tracing::warn!(path = %self.path.display(), %err, "failed to write persisted state");
        }
    }
}

impl PersistenceStore for TomlFileStore {
    fn load(&self, scope: &str, field: &str) -> Option<String> {
        self.tables.read().get(scope)?.get(field).cloned()
    }

    fn save(&self, scope: &str, field: &str, value: &str) {
        let mut tables = self.tables.write();
        tables
            .entry(scope.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
        self.flush(&tables);
    }

    fn clear(&self, scope: &str) {
        let mut tables = self.tables.write();
        if tables.remove(scope).is_some() {
            self.flush(&tables);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_scopes() {
        let store = MemoryStore::new();
        store.save("foldout", "unit.stats", "true");
        store.save("other", "x", "1");
        assert!(store.load_bool("foldout", "unit.stats", false));
        assert!(!store.load_bool("foldout", "missing", false));
        store.clear("foldout");
        assert_eq!(store.load("foldout", "unit.stats"), None);
        assert_eq!(store.load("other", "x").as_deref(), Some("1"));
    }

    #[test]
    fn test_toml_store_round_trips_through_file() {
        let path = std::env::temp_dir().join(format!("marquetry-store-{}.toml", std::process::id()));
        let _ = std::fs::remove_file(&path);
        {
            let store = TomlFileStore::open(&path).unwrap();
            store.save("marquetry.toggles", "decoration_enabled", "false");
        }
        let reopened = TomlFileStore::open(&path).unwrap();
        assert!(!reopened.load_bool("marquetry.toggles", "decoration_enabled", true));
        let _ = std::fs::remove_file(&path);
    }
}
