//! # Polymorphic Slot Composer
//!
//! A slot declared with an abstract type shows a selector of every concrete
//! candidate plus `Null`, and below it the children of the current value.
//! Selecting a different type assigns a fresh default instance; reselecting
//! the current type leaves the value alone. The selector follows the slot
//! through undo and external writes, and the child container is rebuilt
//! whenever the concrete type changes.

use std::cell::RefCell;
use std::rc::Rc;

use marquetry_core::{DataNode, Value};
use marquetry_ui::{UiEvent, UiKind, UiNodeId, HIDE_CLASS};

use crate::composer::{foldout_key, DisposalScope, NodeComposer, WeakComposer};
use crate::pipeline;

/// Class of the slot container.
pub const POLYMORPHIC_SLOT_CLASS: &str = "polymorphic-slot";

/// Class of the container holding the current value's children.
pub const REFERENCE_CONTAINER_CLASS: &str = "reference-container";

/// Selector choice clearing the slot.
pub const NULL_CHOICE: &str = "Null";

struct SlotState {
    composer: WeakComposer,
    node: DataNode,
    force: bool,
    choices: Vec<String>,
    selector: UiNodeId,
    children: UiNodeId,
    scope: DisposalScope,
    built_type: RefCell<Option<Option<String>>>,
}

impl SlotState {
    fn current_type(&self, composer: &NodeComposer) -> Option<String> {
        composer
            .graph()
            .value(&self.node)
            .ok()
            .and_then(|v| v.object_type().map(str::to_string))
    }

    fn choice_index(&self, type_name: Option<&str>) -> Option<usize> {
        let wanted = type_name.unwrap_or(NULL_CHOICE);
        self.choices.iter().position(|c| c == wanted)
    }

    /// Re-syncs the selector and rebuilds the children on a type change.
    fn sync(&self) {
        let Some(composer) = self.composer.upgrade().filter(|c| !c.is_disposed()) else {
            return;
        };
        let current = self.current_type(&composer);
        composer
            .ui()
            .set_selected_silently(self.selector, self.choice_index(current.as_deref()));
        if self.built_type.borrow().as_ref() == Some(&current) {
            return;
        }
        self.rebuild(&composer, current);
    }

    fn rebuild(&self, composer: &NodeComposer, current: Option<String>) {
        let ui = composer.ui();
        self.scope.release();
        ui.clear_children(self.children);
        composer
            .cache()
            .invalidate_below(self.node.owner(), self.node.path());
        ui.set_class(self.children, HIDE_CLASS, current.is_none());
        if current.is_some() {
            composer.within_scope(&self.scope, || {
                composer.compose_children_into(&self.node, self.children, self.force);
            });
        }
        tracing::debug!(node = %self.node, concrete = ?current, "polymorphic slot rebuilt");
        *self.built_type.borrow_mut() = Some(current);
    }

    fn select(&self, index: usize) {
        let Some(composer) = self.composer.upgrade().filter(|c| !c.is_disposed()) else {
            return;
        };
        let Some(choice) = self.choices.get(index) else {
            return;
        };
        let current = self.current_type(&composer);
        let graph = composer.graph();
        let result = if choice == NULL_CHOICE {
            if current.is_none() {
                return;
            }
            graph.write(&self.node, Value::Null)
        } else {
            if current.as_deref() == Some(choice.as_str()) {
                return;
            }
            graph
                .read(|g| g.instantiate(choice))
                .and_then(|instance| graph.write(&self.node, instance))
        };
        if let Err(err) = result {
            tracing::warn!(node = %self.node, choice = %choice, error = %err, "type selection rejected");
            self.sync();
        }
    }
}

/// Composes a polymorphic slot, decorators included.
pub fn compose_slot(composer: &NodeComposer, node: &DataNode, force: bool) -> UiNodeId {
    let ui = composer.ui();
    let base = node.type_name();
    let mut choices = vec![NULL_CHOICE.to_string()];
    choices.extend(composer.graph().read(|g| g.polymorphic_candidates(&base)));

    let container = ui.create(UiKind::Container);
    ui.edit_element(container, |e| e.name = node.path().to_string());
    ui.add_class(container, POLYMORPHIC_SLOT_CLASS);

    let selector = ui.create_labeled(
        UiKind::Dropdown {
            choices: choices.clone(),
            selected: None,
        },
        node.display_name(),
    );
    ui.append(container, selector);

    let children = composer.persistent_foldout("Reference Value", &foldout_key(node));
    ui.add_class(children, REFERENCE_CONTAINER_CLASS);
    ui.append(container, children);

    let state = Rc::new(SlotState {
        composer: composer.downgrade(),
        node: node.clone(),
        force,
        choices,
        selector,
        children,
        scope: composer.new_scope(),
        built_type: RefCell::new(None),
    });
    state.sync();

    let listener = Rc::downgrade(&state);
    ui.on_event(selector, move |event| {
        if let (UiEvent::Selected(index), Some(state)) = (event, listener.upgrade()) {
            state.select(*index);
        }
    });
    let watcher = Rc::clone(&state);
    composer.retain_subscription(composer.graph().watch(node, move || watcher.sync()));

    pipeline::apply_decorators(composer, node, container, node.annotations())
}

#[cfg(test)]
mod tests {
    use marquetry_core::{FieldSchema, FieldType, GraphHandle, MemoryGraph, TypeCatalog, TypeSchema};
    use marquetry_ui::UiHandle;

    use super::*;

    fn fixture() -> (NodeComposer, DataNode) {
        let catalog = TypeCatalog::new()
            .with(TypeSchema::abstract_type("Shape"))
            .with(
                TypeSchema::new("Circle")
                    .implementing("Shape")
                    .field(FieldSchema::new("radius", FieldType::Float)),
            )
            .with(
                TypeSchema::new("Square")
                    .implementing("Shape")
                    .field(FieldSchema::new("side", FieldType::Float)),
            )
            .with(TypeSchema::new("Sprite").field(FieldSchema::new("shape", FieldType::parse("dyn Shape").unwrap())));
        let mut graph = MemoryGraph::new(catalog);
        let id = graph.spawn("sprite", "Sprite").unwrap();
        let graph = GraphHandle::new(graph);
        let slot = graph.children(&graph.root(id).unwrap()).unwrap().remove(0);
        (NodeComposer::builder(graph, UiHandle::new()).build(), slot)
    }

    fn find(composer: &NodeComposer, root: UiNodeId, class: &str) -> UiNodeId {
        composer.ui().read(|t| t.query_class(root, class))[0]
    }

    fn selector(composer: &NodeComposer, root: UiNodeId) -> (UiNodeId, Vec<String>, Option<usize>) {
        composer.ui().read(|t| {
            let id = t.query_kind(root, |k| matches!(k, UiKind::Dropdown { .. }))[0];
            match &t.get(id).unwrap().kind {
                UiKind::Dropdown { choices, selected } => (id, choices.clone(), *selected),
                _ => unreachable!(),
            }
        })
    }

    #[test]
    fn test_selection_assigns_and_rebuilds() {
        let (composer, slot) = fixture();
        let root = compose_slot(&composer, &slot, false);
        let (dropdown, choices, selected) = selector(&composer, root);
        assert_eq!(choices, vec!["Null", "Circle", "Square"]);
        assert_eq!(selected, Some(0));
        let children = find(&composer, root, REFERENCE_CONTAINER_CLASS);
        assert!(composer.ui().has_class(children, HIDE_CLASS));

        composer.ui().select(dropdown, 1);
        assert_eq!(composer.graph().value(&slot).unwrap().object_type(), Some("Circle"));
        assert!(!composer.ui().has_class(children, HIDE_CLASS));
        let fields = composer
            .ui()
            .read(|t| t.query_kind(children, |k| matches!(k, UiKind::Field { .. })));
        assert_eq!(fields.len(), 1);
    }

    #[test]
    fn test_reselecting_same_type_keeps_value() {
        let (composer, slot) = fixture();
        let root = compose_slot(&composer, &slot, false);
        let (dropdown, ..) = selector(&composer, root);
        composer.ui().select(dropdown, 2);
        let side = composer.graph().children(&slot).unwrap().pop().unwrap();
        composer.graph().write(&side, Value::Float(4.0)).unwrap();

        composer.ui().select(dropdown, 2);
        assert_eq!(composer.graph().value(&side).unwrap(), Value::Float(4.0));
    }

    #[test]
    fn test_selector_follows_undo() {
        let (composer, slot) = fixture();
        let root = compose_slot(&composer, &slot, false);
        let (dropdown, ..) = selector(&composer, root);
        composer.ui().select(dropdown, 1);
        assert!(composer.graph().undo());
        let (_, _, selected) = selector(&composer, root);
        assert_eq!(selected, Some(0));
        let children = find(&composer, root, REFERENCE_CONTAINER_CLASS);
        assert!(composer.ui().has_class(children, HIDE_CLASS));
        assert!(composer.ui().children(children).is_empty());
    }
}
