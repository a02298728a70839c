//! `enable_if`: shows the field only while a sibling member matches.

use marquetry_core::annotation::kinds;
use marquetry_core::{AnnotationKind, DataNode, GraphHandle, Value};
use marquetry_ui::{UiKind, UiNodeId, HIDE_CLASS};

use crate::composer::NodeComposer;
use crate::decorator::Decorator;
use crate::decorators::{member_matches, Tracker};
use crate::error::DecoratorResult;

/// Class of the visibility wrapper.
pub const ENABLE_IF_CLASS: &str = "enable-if";

/// Hides the wrapped node unless `member` equals one of `values`.
pub struct EnableIfDecorator {
    member: String,
    values: Vec<Value>,
    wrapper: Option<UiNodeId>,
    tracker: Tracker,
}

impl EnableIfDecorator {
    /// Creates the decorator.
    #[must_use]
    pub fn new(member: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            member: member.into(),
            values,
            wrapper: None,
            tracker: Tracker::default(),
        }
    }
}

/// Applies the condition to the wrapper. A missing member leaves it shown.
fn apply(composer: &NodeComposer, wrapper: UiNodeId, node: &DataNode, member: &str, values: &[Value]) {
    let shown = member_matches(composer.graph(), node, member, values).unwrap_or(true);
    composer.ui().set_class(wrapper, HIDE_CLASS, !shown);
}

impl Decorator for EnableIfDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::ENABLE_IF
    }

    fn wrap(&mut self, composer: &NodeComposer, node: &DataNode, inner: UiNodeId) -> DecoratorResult<UiNodeId> {
        let ui = composer.ui();
        let wrapper = ui.create(UiKind::Container);
        ui.add_class(wrapper, ENABLE_IF_CLASS);
        ui.append(wrapper, inner);
        if composer.graph().resolve_member(node, &self.member).is_none() {
            tracing::warn!(node = %node, member = %self.member, "enable_if member not found");
        }
        apply(composer, wrapper, node, &self.member, &self.values);
        self.wrapper = Some(wrapper);
        Ok(wrapper)
    }

    fn on_bound(&mut self, composer: &NodeComposer, node: &DataNode, _editor: UiNodeId) -> DecoratorResult<()> {
        let Some(wrapper) = self.wrapper else {
            return Ok(());
        };
        let weak = composer.downgrade();
        let scope = node.clone();
        let member = self.member.clone();
        let values = self.values.clone();
        self.tracker.watch_member(composer, node, &self.member, move || {
            if let Some(composer) = weak.upgrade().filter(|c| !c.is_disposed()) {
                apply(&composer, wrapper, &scope, &member, &values);
            }
        });
        Ok(())
    }

    fn release(&mut self) {
        self.tracker.release();
    }

    fn gate(&self, graph: &GraphHandle, node: &DataNode) -> Option<bool> {
        Some(member_matches(graph, node, &self.member, &self.values).unwrap_or(false))
    }
}

#[cfg(test)]
mod tests {
    use marquetry_core::{FieldSchema, FieldType, MemoryGraph, TypeCatalog, TypeSchema};
    use marquetry_ui::UiHandle;

    use super::*;

    fn fixture() -> (NodeComposer, DataNode, DataNode) {
        let catalog = TypeCatalog::new().with(
            TypeSchema::new("Settings")
                .field(FieldSchema::new("mode", FieldType::Text))
                .field(FieldSchema::new("depth", FieldType::Int)),
        );
        let mut graph = MemoryGraph::new(catalog);
        let id = graph.spawn("settings", "Settings").unwrap();
        let graph = GraphHandle::new(graph);
        let mut fields = graph.children(&graph.root(id).unwrap()).unwrap();
        let depth = fields.pop().unwrap();
        let mode = fields.pop().unwrap();
        (NodeComposer::builder(graph, UiHandle::new()).build(), mode, depth)
    }

    #[test]
    fn test_visibility_follows_member() {
        let (composer, mode, depth) = fixture();
        let mut decorator = EnableIfDecorator::new("mode", vec![Value::from("advanced")]);
        let inner = composer.ui().create(UiKind::Label);
        let wrapper = decorator.wrap(&composer, &depth, inner).unwrap();
        assert!(composer.ui().has_class(wrapper, HIDE_CLASS));
        assert_eq!(decorator.gate(composer.graph(), &depth), Some(false));

        decorator.on_bound(&composer, &depth, inner).unwrap();
        composer.graph().write(&mode, Value::from("advanced")).unwrap();
        assert!(!composer.ui().has_class(wrapper, HIDE_CLASS));
        assert_eq!(decorator.gate(composer.graph(), &depth), Some(true));
    }

    #[test]
    fn test_missing_member_stays_visible_but_gates() {
        let (composer, _, depth) = fixture();
        let mut decorator = EnableIfDecorator::new("nope", vec![Value::Bool(true)]);
        let inner = composer.ui().create(UiKind::Label);
        let wrapper = decorator.wrap(&composer, &depth, inner).unwrap();
        assert!(!composer.ui().has_class(wrapper, HIDE_CLASS));
        assert_eq!(decorator.gate(composer.graph(), &depth), Some(false));
    }
}
