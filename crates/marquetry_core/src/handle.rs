//! # Graph Handle
//!
//! Shared, single-threaded handle over an [`ObjectGraph`]. Writes go through
//! a transaction and notify value watchers afterwards; no graph borrow is
//! held while a watcher runs, so watchers may read or write freely.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use crate::error::CoreResult;
use crate::graph::{MemberValue, MethodInfo, ObjectGraph};
use crate::node::{DataNode, ObjectId};
use crate::path::PropertyPath;
use crate::schema::EnumSchema;
use crate::value::Value;

struct Watch {
    id: u64,
    owner: ObjectId,
    path: PropertyPath,
    live: Cell<bool>,
    callback: Box<dyn Fn()>,
}

#[derive(Default)]
struct Watchers {
    next_id: u64,
    entries: Vec<Rc<Watch>>,
}

struct Shared {
    graph: RefCell<Box<dyn ObjectGraph>>,
    watchers: RefCell<Watchers>,
}

/// Shared handle over an object graph.
#[derive(Clone)]
pub struct GraphHandle {
    shared: Rc<Shared>,
}

/// Non-owning handle, for closures that must not keep the graph alive.
#[derive(Clone)]
pub struct WeakGraph {
    shared: Weak<Shared>,
}

impl WeakGraph {
    /// Upgrades to a strong handle while the graph lives.
    #[must_use]
    pub fn upgrade(&self) -> Option<GraphHandle> {
        self.shared.upgrade().map(|shared| GraphHandle { shared })
    }
}

/// Value watcher registration. Dropping it cancels the watcher.
#[must_use = "dropping a subscription cancels it"]
pub struct Subscription {
    watch: Weak<Watch>,
    shared: Weak<Shared>,
}

impl Subscription {
    /// Cancels the watcher. Idempotent.
    pub fn cancel(&self) {
        let Some(watch) = self.watch.upgrade() else {
            return;
        };
        watch.live.set(false);
        if let Some(shared) = self.shared.upgrade() {
            shared.watchers.borrow_mut().entries.retain(|w| w.id != watch.id);
        }
    }

    /// Returns true until cancelled or the graph is gone.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.watch.upgrade().is_some_and(|w| w.live.get())
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl GraphHandle {
    /// Wraps a graph.
    #[must_use]
    pub fn new(graph: impl ObjectGraph + 'static) -> Self {
        Self {
            shared: Rc::new(Shared {
                graph: RefCell::new(Box::new(graph)),
                watchers: RefCell::new(Watchers::default()),
            }),
        }
    }

    /// Weak handle.
    #[must_use]
    pub fn downgrade(&self) -> WeakGraph {
        WeakGraph {
            shared: Rc::downgrade(&self.shared),
        }
    }

    /// Runs a read-only closure against the graph.
    pub fn read<R>(&self, f: impl FnOnce(&dyn ObjectGraph) -> R) -> R {
        f(&**self.shared.graph.borrow())
    }

    /// Root objects.
    #[must_use]
    pub fn roots(&self) -> Vec<ObjectId> {
        self.read(|g| g.roots())
    }

    /// Returns true while the owner exists.
    #[must_use]
    pub fn is_alive(&self, owner: ObjectId) -> bool {
        self.read(|g| g.is_alive(owner))
    }

    /// Root node of an object.
    pub fn root(&self, owner: ObjectId) -> CoreResult<DataNode> {
        self.read(|g| g.root(owner))
    }

    /// Visible children of a node.
    pub fn children(&self, node: &DataNode) -> CoreResult<Vec<DataNode>> {
        self.read(|g| g.visible_children(node))
    }

    /// Current value of a node.
    pub fn value(&self, node: &DataNode) -> CoreResult<Value> {
        self.read(|g| g.value(node))
    }

    /// Resolves a member in the node's enclosing scope.
    #[must_use]
    pub fn resolve_member(&self, scope: &DataNode, name: &str) -> Option<MemberValue> {
        self.read(|g| g.resolve_member(scope, name))
    }

    /// Methods of a node's runtime type.
    #[must_use]
    pub fn methods(&self, node: &DataNode) -> Vec<MethodInfo> {
        self.read(|g| g.methods(node))
    }

    /// Runs mutations as one transaction, then notifies watchers of `scope`.
    pub fn transact<R>(
        &self,
        owner: ObjectId,
        scope: &PropertyPath,
        f: impl FnOnce(&mut dyn ObjectGraph) -> CoreResult<R>,
    ) -> CoreResult<R> {
        let result = {
            let mut graph = self.shared.graph.borrow_mut();
            graph.begin_transaction();
            let result = f(&mut **graph);
            graph.commit()?;
            result
        };
        if result.is_ok() {
            self.notify(owner, scope);
        }
        result
    }

    /// Writes a value in its own transaction.
    pub fn write(&self, node: &DataNode, value: Value) -> CoreResult<()> {
        self.transact(node.owner(), node.path(), |g| g.set_value(node, value))
    }

    /// Invokes a method on the object at the node.
    pub fn invoke(&self, node: &DataNode, method: &str) -> CoreResult<()> {
        self.transact(node.owner(), node.path(), |g| g.invoke(node, method))
    }

    /// Invokes a method on the object enclosing `scope`.
    pub fn invoke_in_scope(&self, scope: &DataNode, method: &str) -> CoreResult<()> {
        self.transact(scope.owner(), &PropertyPath::root(), |g| {
            g.invoke_in_scope(scope, method)
        })
    }

    /// Variants of a catalog enum.
    #[must_use]
    pub fn enum_schema(&self, name: &str) -> Option<EnumSchema> {
        self.read(|g| g.enum_schema(name))
    }

    /// Inserts a sequence element.
    pub fn insert_element(&self, sequence: &DataNode, index: usize, value: Option<Value>) -> CoreResult<()> {
        self.transact(sequence.owner(), sequence.path(), |g| {
            g.insert_element(sequence, index, value)
        })
    }

    /// Removes a sequence element.
    pub fn remove_element(&self, sequence: &DataNode, index: usize) -> CoreResult<()> {
        self.transact(sequence.owner(), sequence.path(), |g| {
            g.remove_element(sequence, index)
        })
    }

    /// Moves a sequence element.
    pub fn move_element(&self, sequence: &DataNode, from: usize, to: usize) -> CoreResult<()> {
        self.transact(sequence.owner(), sequence.path(), |g| {
            g.move_element(sequence, from, to)
        })
    }

    /// Reverts the last undo step and notifies every touched owner.
    pub fn undo(&self) -> bool {
        let touched = self.shared.graph.borrow_mut().undo();
        for owner in &touched {
            self.notify(*owner, &PropertyPath::root());
        }
        !touched.is_empty()
    }

    /// Destroys a root object and notifies its watchers.
    pub fn destroy(&self, owner: ObjectId) -> bool {
        let destroyed = self.shared.graph.borrow_mut().destroy(owner);
        if destroyed {
            self.notify(owner, &PropertyPath::root());
        }
        destroyed
    }

    /// Watches a node. The callback fires after any write at, above or
    /// below the node's path.
    pub fn watch(&self, node: &DataNode, callback: impl Fn() + 'static) -> Subscription {
        let mut watchers = self.shared.watchers.borrow_mut();
        watchers.next_id += 1;
        let watch = Rc::new(Watch {
            id: watchers.next_id,
            owner: node.owner(),
            path: node.path().clone(),
            live: Cell::new(true),
            callback: Box::new(callback),
        });
        let subscription = Subscription {
            watch: Rc::downgrade(&watch),
            shared: Rc::downgrade(&self.shared),
        };
        watchers.entries.push(watch);
        subscription
    }

    /// Number of live watchers.
    #[must_use]
    pub fn watcher_count(&self) -> usize {
        self.shared.watchers.borrow().entries.len()
    }

    fn notify(&self, owner: ObjectId, path: &PropertyPath) {
        let matching: Vec<Rc<Watch>> = self
            .shared
            .watchers
            .borrow()
            .entries
            .iter()
            .filter(|w| w.owner == owner && w.path.overlaps(path))
            .cloned()
            .collect();
        for watch in matching {
            // A watcher cancelled by an earlier one in this batch stays silent.
            if watch.live.get() {
                (watch.callback)();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::memory::MemoryGraph;
    use crate::schema::{FieldSchema, FieldType, TypeCatalog, TypeSchema};

    fn handle() -> (GraphHandle, DataNode, DataNode) {
        let catalog = TypeCatalog::new().with(
            TypeSchema::new("Pair")
                .field(FieldSchema::new("x", FieldType::Int))
                .field(FieldSchema::new("y", FieldType::Int)),
        );
        let mut graph = MemoryGraph::new(catalog);
        let id = graph.spawn("pair", "Pair").unwrap();
        let handle = GraphHandle::new(graph);
        let root = handle.root(id).unwrap();
        let children = handle.children(&root).unwrap();
        (handle, children[0].clone(), children[1].clone())
    }

    #[test]
    fn test_watchers_fire_on_overlapping_writes() {
        let (handle, x, y) = handle();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let _sub = handle.watch(&x, move || counter.set(counter.get() + 1));

        handle.write(&x, Value::Int(1)).unwrap();
        handle.write(&y, Value::Int(2)).unwrap();
        assert_eq!(hits.get(), 1);

        assert!(handle.undo());
        assert_eq!(hits.get(), 2);
        assert_eq!(handle.value(&y).unwrap(), Value::Int(0));
    }

    #[test]
    fn test_dropped_subscription_never_fires() {
        let (handle, x, _) = handle();
        let hits = Rc::new(Cell::new(0));
        let counter = Rc::clone(&hits);
        let sub = handle.watch(&x, move || counter.set(counter.get() + 1));
        assert_eq!(handle.watcher_count(), 1);
        drop(sub);
        assert_eq!(handle.watcher_count(), 0);
        handle.write(&x, Value::Int(5)).unwrap();
        assert_eq!(hits.get(), 0);
    }

    #[test]
    fn test_watcher_may_write_back() {
        let (handle, x, y) = handle();
        let weak = handle.downgrade();
        let target = y.clone();
        let _sub = handle.watch(&x, move || {
            if let Some(graph) = weak.upgrade() {
                let _ = graph.write(&target, Value::Int(42));
            }
        });
        handle.write(&x, Value::Int(1)).unwrap();
        assert_eq!(handle.value(&y).unwrap(), Value::Int(42));
    }
}
