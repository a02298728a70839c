//! `on_value_changed`: calls a method of the enclosing object whenever the
//! field's value changes.

use std::cell::{Cell, RefCell};

use marquetry_core::annotation::kinds;
use marquetry_core::{AnnotationKind, DataNode, Value};
use marquetry_ui::UiNodeId;

use crate::composer::NodeComposer;
use crate::decorator::Decorator;
use crate::decorators::Tracker;
use crate::error::DecoratorResult;

/// Invokes a scope method after each change of the node's value.
pub struct OnValueChangedDecorator {
    method: String,
    tracker: Tracker,
}

impl OnValueChangedDecorator {
    /// Creates the decorator.
    #[must_use]
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            tracker: Tracker::default(),
        }
    }
}

impl Decorator for OnValueChangedDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::ON_VALUE_CHANGED
    }

    fn on_bound(&mut self, composer: &NodeComposer, node: &DataNode, _editor: UiNodeId) -> DecoratorResult<()> {
        let graph = composer.graph().downgrade();
        let last = RefCell::new(composer.graph().value(node).unwrap_or(Value::Null));
        let running = Cell::new(false);
        let scope = node.clone();
        let method = self.method.clone();
        self.tracker.watch(composer, node, move || {
            let Some(graph) = graph.upgrade() else {
                return;
            };
            let Ok(current) = graph.value(&scope) else {
                return;
            };
            if *last.borrow() == current {
                return;
            }
            last.replace(current);
            // Writes made by the callback itself only refresh `last`.
            if running.replace(true) {
                return;
            }
            if let Err(err) = graph.invoke_in_scope(&scope, &method) {
                tracing::warn!(node = %scope, method = %method, error = %err, "change callback failed");
            }
            running.set(false);
        });
        Ok(())
    }

    fn release(&mut self) {
        self.tracker.release();
    }
}
