//! # Introspection Cache
//!
//! Memoizes whether a node or anything below it needs decoration. Entries are
//! keyed by owner and path and live as long as the composer that owns the
//! cache; they are never shared between composers.
//!
//! A node requires decoration when:
//! - it is a polymorphic slot (the type selector is itself a decoration), or
//! - its declared type is not ignored (sequences are always inspected) and
//!   - it carries a recognized annotation, or
//!   - it is an empty sequence whose element type uses annotations, or
//!   - a method of its runtime value carries one, or
//!   - any visible child requires decoration.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet};

use marquetry_core::{DataNode, GraphHandle, IgnoreList, ObjectId, PropertyPath, Value};

use crate::registry::DecoratorRegistry;

type CacheKey = (ObjectId, PropertyPath);

/// What the cache needs to answer a miss.
pub struct DecorationLookup<'a> {
    /// Graph the nodes belong to.
    pub graph: &'a GraphHandle,
    /// Recognized annotation kinds.
    pub registry: &'a DecoratorRegistry,
    /// Types never inspected.
    pub ignore: &'a IgnoreList,
}

/// Per-composer memo of "requires decoration".
#[derive(Default)]
pub struct IntrospectionCache {
    entries: RefCell<HashMap<CacheKey, bool>>,
    in_progress: RefCell<HashSet<CacheKey>>,
    walks: Cell<u64>,
}

impl IntrospectionCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached answer for a node, if computed.
    #[must_use]
    pub fn get(&self, node: &DataNode) -> Option<bool> {
        self.entries.borrow().get(&key(node)).copied()
    }

    /// Number of child enumerations performed on cache misses.
    #[must_use]
    pub fn walks(&self) -> u64 {
        self.walks.get()
    }

    /// Number of cached entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// Returns true if nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    /// Returns true if any cached node required decoration.
    #[must_use]
    pub fn any_required(&self) -> bool {
        self.entries.borrow().values().any(|required| *required)
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }

    /// Drops the entries strictly below `path`, whose runtime shape changed.
    pub fn invalidate_below(&self, owner: ObjectId, path: &PropertyPath) {
        self.entries
            .borrow_mut()
            .retain(|(o, p), _| *o != owner || p == path || !p.starts_with(path));
    }

    /// Returns whether the node requires decoration, computing it on a miss.
    pub fn requires_decoration(&self, node: &DataNode, lookup: &DecorationLookup<'_>) -> bool {
        let key = key(node);
        if let Some(required) = self.entries.borrow().get(&key).copied() {
            return required;
        }
        // Re-entered through a cycle: the outer computation decides.
        if !self.in_progress.borrow_mut().insert(key.clone()) {
            return false;
        }
        let required = self.compute(node, lookup);
        self.in_progress.borrow_mut().remove(&key);
        self.entries.borrow_mut().insert(key, required);
        required
    }

    fn compute(&self, node: &DataNode, lookup: &DecorationLookup<'_>) -> bool {
        if node.is_polymorphic() {
            return true;
        }
        if !node.is_sequence() && lookup.ignore.contains(&node.type_name()) {
            return false;
        }
        if node.annotations().iter().any(|a| lookup.registry.recognizes(a)) {
            return true;
        }
        if node.is_sequence() && matches!(lookup.graph.value(node), Ok(Value::List(ref items)) if items.is_empty()) {
            return node
                .field_type()
                .element()
                .map(|element| element.type_name())
                .is_some_and(|name| {
                    !lookup.ignore.contains(&name)
                        && lookup.graph.read(|g| g.type_uses_annotations(&name))
                });
        }
        let methods = lookup.graph.methods(node);
        if methods
            .iter()
            .any(|m| m.annotations.iter().any(|a| lookup.registry.recognizes(a)))
        {
            return true;
        }
        self.walks.set(self.walks.get() + 1);
        match lookup.graph.children(node) {
            Ok(children) => children.iter().any(|child| self.requires_decoration(child, lookup)),
            Err(err) => {
                tracing::warn!(node = %node, error = %err, "cannot enumerate children");
                false
            }
        }
    }
}

fn key(node: &DataNode) -> CacheKey {
    (node.owner(), node.path().clone())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use marquetry_core::{
        Annotation, FieldSchema, FieldType, MemoryGraph, MemoryStore, TypeCatalog, TypeSchema,
    };

    use super::*;

    fn fixture() -> (GraphHandle, ObjectId) {
        let catalog = TypeCatalog::new()
            .with(
                TypeSchema::new("Leafy")
                    .field(FieldSchema::new("name", FieldType::Text).annotated(Annotation::Required { message: None })),
            )
            .with(
                TypeSchema::new("Holder")
                    .field(FieldSchema::new("plain", FieldType::Int))
                    .field(FieldSchema::new("inner", FieldType::Object("Leafy".into())))
                    .field(FieldSchema::new("empty", FieldType::parse("[Leafy]").unwrap_or(FieldType::Any))),
            );
        let mut graph = MemoryGraph::new(catalog);
        let id = graph.spawn("holder", "Holder").unwrap();
        (GraphHandle::new(graph), id)
    }

    #[test]
    fn test_monotonic_and_cached() {
        let (graph, id) = fixture();
        let registry = DecoratorRegistry::with_builtins();
        let ignore = IgnoreList::load(MemoryStore::shared(), &[]);
        let lookup = DecorationLookup {
            graph: &graph,
            registry: &registry,
            ignore: &ignore,
        };
        let cache = IntrospectionCache::new();
        let root = graph.root(id).unwrap();
        assert!(cache.requires_decoration(&root, &lookup));
        let children = graph.children(&root).unwrap();
        assert_eq!(cache.get(&children[0]), Some(false));
        assert_eq!(cache.get(&children[1]), Some(true));

        let walks = cache.walks();
        assert!(cache.requires_decoration(&root, &lookup));
        assert_eq!(cache.walks(), walks);
        assert!(cache.any_required());
    }

    #[test]
    fn test_empty_sequence_uses_element_schema() {
        let (graph, id) = fixture();
        let registry = DecoratorRegistry::with_builtins();
        let ignore = IgnoreList::load(MemoryStore::shared(), &[]);
        let lookup = DecorationLookup {
            graph: &graph,
            registry: &registry,
            ignore: &ignore,
        };
        let cache = IntrospectionCache::new();
        let root = graph.root(id).unwrap();
        let empty = graph.children(&root).unwrap().remove(2);
        assert!(cache.requires_decoration(&empty, &lookup));
    }

    #[test]
    fn test_ignored_types_short_circuit() {
        let (graph, id) = fixture();
        let registry = DecoratorRegistry::with_builtins();
        let store = Arc::new(MemoryStore::new());
        let ignore = IgnoreList::load(store, &["Leafy".to_string()]);
        let lookup = DecorationLookup {
            graph: &graph,
            registry: &registry,
            ignore: &ignore,
        };
        let cache = IntrospectionCache::new();
        let root = graph.root(id).unwrap();
        let inner = graph.children(&root).unwrap().remove(1);
        assert!(!cache.requires_decoration(&inner, &lookup));

        cache.invalidate_below(id, root.path());
        assert!(cache.get(&inner).is_none());
    }
}
