//! Persisted settings shared by composers and validators.

use std::collections::BTreeSet;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::persistence::SharedStore;

/// Persistence scope of the toggles.
pub const TOGGLES_SCOPE: &str = "marquetry.toggles";

/// Persistence scope of the ignore list.
pub const IGNORE_LIST_SCOPE: &str = "marquetry.ignore_list";

const DECORATION_FIELD: &str = "decoration_enabled";
const IGNORED_TYPES_FIELD: &str = "ignored_types";

/// Global enable/disable switches read from persisted preferences.
#[derive(Clone)]
pub struct Toggles {
    store: SharedStore,
    decoration_default: bool,
}

impl Toggles {
    /// Creates toggles over a store with the configured defaults.
    #[must_use]
    pub fn new(store: SharedStore, decoration_default: bool) -> Self {
        Self {
            store,
            decoration_default,
        }
    }

    /// Whether decorators run at all.
    #[must_use]
    pub fn decoration_enabled(&self) -> bool {
        self.store
            .load_bool(TOGGLES_SCOPE, DECORATION_FIELD, self.decoration_default)
    }

    /// Persists the decoration toggle.
    pub fn set_decoration_enabled(&self, enabled: bool) {
        tracing::info!(enabled, "decoration toggled");
        self.store.save_bool(TOGGLES_SCOPE, DECORATION_FIELD, enabled);
    }
}

#[derive(Serialize, Deserialize, Default)]
struct PersistedList {
    #[serde(default)]
    ignored_types: BTreeSet<String>,
}

/// Type names excluded from decoration lookups.
///
/// Configured entries are fixed; user entries persist as JSON.
pub struct IgnoreList {
    store: SharedStore,
    configured: BTreeSet<String>,
    persisted: RwLock<BTreeSet<String>>,
}

impl IgnoreList {
    /// Loads the persisted list and merges configured entries.
    #[must_use]
    pub fn load(store: SharedStore, configured: &[String]) -> Self {
        let persisted = store
            .load(IGNORE_LIST_SCOPE, IGNORED_TYPES_FIELD)
            .and_then(|text| match serde_json::from_str::<PersistedList>(&text) {
                Ok(list) => Some(list.ignored_types),
                Err(err) => {
                    tracing::warn!(%err, "discarding malformed ignore list");
                    None
                }
            })
            .unwrap_or_default();
        Self {
            store,
            configured: configured.iter().cloned().collect(),
            persisted: RwLock::new(persisted),
        }
    }

    /// Returns true if the type name is ignored.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.configured.contains(type_name) || self.persisted.read().contains(type_name)
    }

    /// Adds a user entry. Returns false if already present.
    pub fn add(&self, type_name: &str) -> bool {
        let mut persisted = self.persisted.write();
        let added = persisted.insert(type_name.to_string());
        if added {
            self.save(&persisted);
        }
        added
    }

    /// Removes a user entry. Configured entries cannot be removed.
    pub fn remove(&self, type_name: &str) -> bool {
        let mut persisted = self.persisted.write();
        let removed = persisted.remove(type_name);
        if removed {
            self.save(&persisted);
        }
        removed
    }

    /// All entries, sorted.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        let persisted = self.persisted.read();
        self.configured.union(&persisted).cloned().collect()
    }

    fn save(&self, persisted: &BTreeSet<String>) {
        let list = PersistedList {
            ignored_types: persisted.clone(),
        };
        match serde_json::to_string(&list) {
            Ok(text) => self.store.save(IGNORE_LIST_SCOPE, IGNORED_TYPES_FIELD, &text),
            Err(err) => tracing::warn!(%err, "failed to encode ignore list"),
        }
    }
}
