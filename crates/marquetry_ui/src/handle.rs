//! Shared UI handle dispatching lifecycle and value events.
//!
//! Callbacks are always invoked after the tree borrow is released, so a
//! callback may freely create, append or remove nodes.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use marquetry_core::Value;

use crate::node::{UiElement, UiEvent, UiFlags, UiKind, UiNodeId};
use crate::tree::UiTree;

type AttachCallback = Box<dyn FnOnce()>;
type EventListener = Rc<dyn Fn(&UiEvent)>;

#[derive(Default)]
struct Shared {
    tree: RefCell<UiTree>,
    pending_attach: RefCell<HashMap<UiNodeId, Vec<AttachCallback>>>,
    listeners: RefCell<HashMap<UiNodeId, Vec<EventListener>>>,
}

/// Shared, single-threaded handle to a UI tree.
#[derive(Clone, Default)]
pub struct UiHandle {
    shared: Rc<Shared>,
}

impl UiHandle {
    /// Creates an empty tree.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs a closure against the tree.
    pub fn read<R>(&self, f: impl FnOnce(&UiTree) -> R) -> R {
        f(&*self.shared.tree.borrow())
    }

    /// Runs a mutating closure against the tree.
    pub fn update<R>(&self, f: impl FnOnce(&mut UiTree) -> R) -> R {
        f(&mut *self.shared.tree.borrow_mut())
    }

    /// Snapshot of a node.
    #[must_use]
    pub fn element(&self, id: UiNodeId) -> Option<UiElement> {
        self.read(|t| t.get(id).cloned())
    }

    /// Mutates a node in place. Returns false if it is gone.
    pub fn edit_element(&self, id: UiNodeId, f: impl FnOnce(&mut UiElement)) -> bool {
        self.update(|t| t.get_mut(id).map(f).is_some())
    }

    /// Creates a detached node.
    pub fn create(&self, kind: UiKind) -> UiNodeId {
        self.update(|t| t.create(kind))
    }

    /// Creates a detached node with a label.
    pub fn create_labeled(&self, kind: UiKind, label: impl Into<String>) -> UiNodeId {
        let label = label.into();
        self.update(|t| {
            let id = t.create(kind);
            if let Some(node) = t.get_mut(id) {
                node.label = label;
            }
            id
        })
    }

    /// Children of a node.
    #[must_use]
    pub fn children(&self, id: UiNodeId) -> Vec<UiNodeId> {
        self.read(|t| t.children(id).to_vec())
    }

    /// Appends a child. If the parent is live, the child's pending attach
    /// callbacks fire before this returns.
    pub fn append(&self, parent: UiNodeId, child: UiNodeId) -> bool {
        let (appended, newly_attached) = self.update(|t| {
            if !t.append(parent, child) {
                return (false, Vec::new());
            }
            let live = t.get(parent).is_some_and(UiElement::is_attached);
            (true, t.mark_attached(child, live))
        });
        self.fire_attached(&newly_attached);
        appended
    }

    /// Makes a node the root of a live surface, firing attach callbacks of
    /// its whole subtree.
    pub fn attach_root(&self, root: UiNodeId) {
        let newly_attached = self.update(|t| t.mark_attached(root, true));
        self.fire_attached(&newly_attached);
    }

    /// Takes a subtree off the live surface without destroying it.
    pub fn detach(&self, root: UiNodeId) {
        self.update(|t| t.mark_attached(root, false));
    }

    /// Removes a subtree, dropping its pending callbacks and listeners.
    pub fn remove(&self, id: UiNodeId) -> Vec<UiNodeId> {
        let removed = self.update(|t| t.remove(id));
        self.forget(&removed);
        removed
    }

    /// Removes every child subtree of a node.
    pub fn clear_children(&self, id: UiNodeId) -> Vec<UiNodeId> {
        let removed = self.update(|t| t.clear_children(id));
        self.forget(&removed);
        removed
    }

    fn forget(&self, removed: &[UiNodeId]) {
        // Dropped outside the borrows: callbacks may own handles to this tree.
        let mut dropped_attach = Vec::new();
        let mut dropped_listeners = Vec::new();
        {
            let mut pending = self.shared.pending_attach.borrow_mut();
            let mut listeners = self.shared.listeners.borrow_mut();
            for id in removed {
                dropped_attach.extend(pending.remove(id));
                dropped_listeners.extend(listeners.remove(id));
            }
        }
        drop(dropped_attach);
        drop(dropped_listeners);
    }

    /// Adds a class tag.
    pub fn add_class(&self, id: UiNodeId, class: &str) {
        self.update(|t| t.add_class(id, class));
    }

    /// Removes a class tag.
    pub fn remove_class(&self, id: UiNodeId, class: &str) {
        self.update(|t| t.remove_class(id, class));
    }

    /// Adds or removes a class tag.
    pub fn set_class(&self, id: UiNodeId, class: &str, on: bool) {
        self.update(|t| t.set_class(id, class, on));
    }

    /// Returns true if the node carries the class.
    #[must_use]
    pub fn has_class(&self, id: UiNodeId, class: &str) -> bool {
        self.read(|t| t.has_class(id, class))
    }

    /// Returns true if the node and its ancestors are shown.
    #[must_use]
    pub fn is_displayed(&self, id: UiNodeId) -> bool {
        self.read(|t| t.is_displayed(id))
    }

    /// Enables or disables input on a node.
    pub fn set_enabled(&self, id: UiNodeId, enabled: bool) {
        self.edit_element(id, |n| n.flags.assign(UiFlags::ENABLED, enabled));
    }

    /// Registers a one-shot callback fired once the node is on a live
    /// surface. Fires immediately if it already is.
    pub fn on_attach(&self, id: UiNodeId, callback: impl FnOnce() + 'static) {
        let attached = self.read(|t| t.get(id).map(UiElement::is_attached));
        match attached {
            Some(true) => callback(),
            Some(false) => self
                .shared
                .pending_attach
                .borrow_mut()
                .entry(id)
                .or_default()
                .push(Box::new(callback)),
            None => {}
        }
    }

    /// Registers an event listener on a node.
    pub fn on_event(&self, id: UiNodeId, listener: impl Fn(&UiEvent) + 'static) {
        self.shared
            .listeners
            .borrow_mut()
            .entry(id)
            .or_default()
            .push(Rc::new(listener));
    }

    /// Selects a dropdown choice and notifies listeners.
    pub fn select(&self, id: UiNodeId, index: usize) {
        if self.set_selected_silently(id, Some(index)) {
            self.dispatch(id, &UiEvent::Selected(index));
        }
    }

    /// Updates a dropdown's selection without notifying listeners.
    pub fn set_selected_silently(&self, id: UiNodeId, index: Option<usize>) -> bool {
        self.edit_element(id, |node| {
            if let UiKind::Dropdown { choices, selected } = &mut node.kind {
                *selected = index.filter(|i| *i < choices.len());
            }
        })
    }

    /// Flips a foldout and notifies listeners.
    pub fn toggle(&self, id: UiNodeId) {
        let mut expanded = false;
        let found = self.edit_element(id, |node| {
            expanded = !node.is_expanded();
            node.flags.assign(UiFlags::EXPANDED, expanded);
        });
        if found {
            self.dispatch(id, &UiEvent::Toggled(expanded));
        }
    }

    /// Sets a foldout's state without notifying listeners.
    pub fn set_expanded_silently(&self, id: UiNodeId, expanded: bool) {
        self.edit_element(id, |node| node.flags.assign(UiFlags::EXPANDED, expanded));
    }

    /// Presses a button. Disabled nodes ignore clicks.
    pub fn click(&self, id: UiNodeId) {
        if self.read(|t| t.get(id).is_some_and(UiElement::is_enabled)) {
            self.dispatch(id, &UiEvent::Clicked);
        }
    }

    /// Applies a user edit to a field and notifies listeners. Disabled
    /// fields ignore edits.
    pub fn edit(&self, id: UiNodeId, value: Value) {
        let enabled = self.read(|t| t.get(id).is_some_and(UiElement::is_enabled));
        if enabled && self.set_value_silently(id, value.clone()) {
            self.dispatch(id, &UiEvent::Edited(value));
        }
    }

    /// Updates a field's displayed value without notifying listeners.
    pub fn set_value_silently(&self, id: UiNodeId, value: Value) -> bool {
        self.edit_element(id, |node| node.value = value)
    }

    /// Number of pending attach callbacks, for diagnostics.
    #[must_use]
    pub fn pending_attach_count(&self) -> usize {
        self.shared.pending_attach.borrow().values().map(Vec::len).sum()
    }

    fn dispatch(&self, id: UiNodeId, event: &UiEvent) {
        let listeners: Vec<EventListener> = self
            .shared
            .listeners
            .borrow()
            .get(&id)
            .cloned()
            .unwrap_or_default();
        for listener in listeners {
            listener(event);
        }
    }

    fn fire_attached(&self, ids: &[UiNodeId]) {
        let callbacks: Vec<AttachCallback> = {
            let mut pending = self.shared.pending_attach.borrow_mut();
            ids.iter().filter_map(|id| pending.remove(id)).flatten().collect()
        };
        for callback in callbacks {
            callback();
        }
    }
}
