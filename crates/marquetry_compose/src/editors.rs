//! Field editors.
//!
//! The default editor of a leaf is a field bound two ways to the node's
//! value: user edits are written to the graph, and graph changes (undo,
//! other editors, methods) flow back into the field. With native bindings
//! the flow back is driven by a value watcher; the immediate-mode fallback
//! re-reads the value on every scheduler tick instead.

use std::collections::HashMap;
use std::sync::Arc;

use marquetry_core::{DataNode, Value};
use marquetry_ui::{Binding, EditorKind, UiEvent, UiKind, UiNodeId};

use crate::composer::NodeComposer;
use crate::error::ComposeResult;
use crate::list;

/// Builds a specialized editor for a type.
pub type EditorFactory = Arc<dyn Fn(&NodeComposer, &DataNode) -> ComposeResult<UiNodeId> + Send + Sync>;

/// Type name → specialized editor.
#[derive(Clone, Default)]
pub struct EditorRegistry {
    factories: HashMap<String, EditorFactory>,
}

impl EditorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the editor of a type.
    pub fn register(
        &mut self,
        type_name: impl Into<String>,
        factory: impl Fn(&NodeComposer, &DataNode) -> ComposeResult<UiNodeId> + Send + Sync + 'static,
    ) {
        self.factories.insert(type_name.into(), Arc::new(factory));
    }

    /// Returns true if the type has an editor.
    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.contains_key(type_name)
    }

    /// Builds the editor of the node's declared type, if one is registered.
    pub fn create(&self, composer: &NodeComposer, node: &DataNode) -> Option<ComposeResult<UiNodeId>> {
        let factory = self.factories.get(&node.type_name())?;
        Some(factory(composer, node))
    }

    /// Number of registered editors.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

/// Host-default editor of a node, without decorators below it.
///
/// Sequences become an undecorated list with its controls, structured nodes
/// a foldout of their children's default editors; leaves and opaque math
/// types become a single bound field.
pub fn default_editor(composer: &NodeComposer, node: &DataNode) -> UiNodeId {
    if node.is_sequence() {
        return list::compose_sequence(composer, node, &[], false);
    }
    let opaque = composer.config().opaque_math_types.contains(&node.type_name());
    if !node.has_visible_children() || opaque {
        return bound_field(composer, node);
    }
    let ui = composer.ui();
    let foldout = ui.create(UiKind::Foldout {
        title: node.display_name().to_string(),
    });
    ui.edit_element(foldout, |e| e.name = node.path().to_string());
    match composer.graph().children(node) {
        Ok(children) => {
            for child in children.iter().filter(|c| composer.accepts(c)) {
                let editor = default_editor(composer, child);
                ui.append(foldout, editor);
            }
        }
        Err(err) => {
            let indicator = composer.error_indicator(node, &err);
            ui.append(foldout, indicator);
        }
    }
    foldout
}

/// Field editor bound to the node's live value.
pub fn bound_field(composer: &NodeComposer, node: &DataNode) -> UiNodeId {
    let ui = composer.ui();
    let editor = if composer.config().native_bindings {
        EditorKind::Native
    } else {
        EditorKind::Immediate
    };
    let binding = Binding {
        owner: node.owner(),
        path: node.path().clone(),
    };
    let field = ui.create_labeled(UiKind::Field { editor, binding }, node.display_name());
    let current = composer.graph().value(node).unwrap_or(Value::Null);
    ui.edit_element(field, |e| {
        e.name = node.path().to_string();
        e.value = current;
    });

    let weak = composer.downgrade();
    let target = node.clone();
    ui.on_event(field, move |event| {
        let UiEvent::Edited(value) = event else {
            return;
        };
        let Some(composer) = weak.upgrade().filter(|c| !c.is_disposed()) else {
            return;
        };
        if let Err(err) = composer.graph().write(&target, value.clone()) {
            tracing::warn!(node = %target, error = %err, "edit rejected");
            if let Ok(value) = composer.graph().value(&target) {
                composer.ui().set_value_silently(field, value);
            }
        }
    });

    let graph = composer.graph().downgrade();
    let sink = ui.clone();
    let source = node.clone();
    let refresh = move || {
        let Some(graph) = graph.upgrade() else {
            return;
        };
        if let Ok(value) = graph.value(&source) {
            let stale = sink.element(field).is_some_and(|e| e.value != value);
            if stale {
                sink.set_value_silently(field, value);
            }
        }
    };
    match editor {
        EditorKind::Native => composer.retain_subscription(composer.graph().watch(node, refresh)),
        EditorKind::Immediate => composer.retain_timer(composer.scheduler().every(1, refresh)),
    }
    field
}

#[cfg(test)]
mod tests {
    use marquetry_core::{
        FieldSchema, FieldType, GraphHandle, MarquetryConfig, MemoryGraph, TypeCatalog, TypeSchema,
    };
    use marquetry_ui::UiHandle;

    use super::*;
    use crate::error::ComposeError;

    fn fixture(native: bool) -> (NodeComposer, DataNode) {
        let catalog = TypeCatalog::new().with(
            TypeSchema::new("Gauge")
                .field(FieldSchema::new("level", FieldType::Float))
                .field(FieldSchema::new("label", FieldType::Text)),
        );
        let mut graph = MemoryGraph::new(catalog);
        let id = graph.spawn("gauge", "Gauge").unwrap();
        let graph = GraphHandle::new(graph);
        let level = graph.children(&graph.root(id).unwrap()).unwrap().remove(0);
        let mut config = MarquetryConfig::default();
        config.composer.native_bindings = native;
        let composer = NodeComposer::builder(graph, UiHandle::new()).config(&config).build();
        (composer, level)
    }

    #[test]
    fn test_two_way_native_binding() {
        let (composer, level) = fixture(true);
        let field = bound_field(&composer, &level);
        composer.ui().edit(field, Value::Int(3));
        assert_eq!(composer.graph().value(&level).unwrap(), Value::Float(3.0));

        composer.graph().write(&level, Value::Float(7.5)).unwrap();
        assert_eq!(composer.ui().element(field).unwrap().value, Value::Float(7.5));

        composer.ui().edit(field, Value::from("seven"));
        assert_eq!(composer.ui().element(field).unwrap().value, Value::Float(7.5));
    }

    #[test]
    fn test_immediate_mode_refreshes_on_tick() {
        let (composer, level) = fixture(false);
        let field = bound_field(&composer, &level);
        assert!(matches!(
            composer.ui().element(field).unwrap().kind,
            UiKind::Field { editor: EditorKind::Immediate, .. }
        ));
        composer.graph().write(&level, Value::Float(2.0)).unwrap();
        assert_eq!(composer.ui().element(field).unwrap().value, Value::Float(0.0));
        composer.scheduler().tick();
        assert_eq!(composer.ui().element(field).unwrap().value, Value::Float(2.0));
    }

    #[test]
    fn test_registry_lookup() {
        let (composer, level) = fixture(true);
        let mut editors = EditorRegistry::new();
        editors.register("float", |_, node| {
            Err(ComposeError::Editor {
                type_name: node.type_name(),
                reason: "no slider".into(),
            })
        });
        assert!(editors.contains("float"));
        assert!(matches!(editors.create(&composer, &level), Some(Err(_))));
    }
}
