//! Methods block: one button per method annotated `button`.

use marquetry_core::{Annotation, DataNode, FieldType};
use marquetry_ui::{UiEvent, UiKind, UiNodeId};

use crate::composer::{foldout_key, NodeComposer};
use crate::pipeline;

/// Class of the methods block.
pub const METHODS_CLASS: &str = "methods-block";

/// Class of the collapsible actions panel.
pub const METHOD_GROUP_CLASS: &str = "method-group-container";

/// Buttons for the node's annotated methods. `None` when there are none or
/// decoration is off.
pub fn compose_methods(composer: &NodeComposer, node: &DataNode) -> Option<UiNodeId> {
    if !composer.decoration_enabled() {
        return None;
    }
    let buttons: Vec<(String, bool, Vec<Annotation>)> = composer
        .graph()
        .methods(node)
        .into_iter()
        .filter_map(|method| {
            let sliding = method.annotations.iter().find_map(|a| match a {
                Annotation::Button { sliding_panel } => Some(*sliding_panel),
                _ => None,
            })?;
            let extras = method
                .annotations
                .into_iter()
                .filter(|a| !a.is_marker() && !a.is_validator())
                .collect();
            Some((method.name, sliding, extras))
        })
        .collect();
    if buttons.is_empty() {
        return None;
    }

    let ui = composer.ui();
    let block = ui.create(UiKind::Container);
    ui.edit_element(block, |e| e.name = format!("{} methods", node.path()));
    ui.add_class(block, METHODS_CLASS);
    let mut panel = None;

    for (name, sliding, extras) in buttons {
        let button = method_button(composer, node, &name);
        let target = DataNode::new(
            node.owner(),
            node.path().field(&name),
            name.clone(),
            FieldType::Any,
            extras.clone(),
            false,
        );
        let decorated = pipeline::apply_decorators(composer, &target, button, &extras);
        let parent = if sliding {
            *panel.get_or_insert_with(|| {
                let title = format!("{}: Actions", node.display_name());
                let foldout = composer.persistent_foldout(&title, &format!("{}#actions", foldout_key(node)));
                ui.add_class(foldout, METHOD_GROUP_CLASS);
                ui.append(block, foldout);
                foldout
            })
        } else {
            block
        };
        ui.append(parent, decorated);
    }
    Some(block)
}

fn method_button(composer: &NodeComposer, node: &DataNode, method: &str) -> UiNodeId {
    let button = composer.ui().create_labeled(UiKind::Button, method);
    composer
        .ui()
        .edit_element(button, |e| e.name = format!("{}.{method}()", node.path()));
    let weak = composer.downgrade();
    let node = node.clone();
    let method = method.to_string();
    composer.ui().on_event(button, move |event| {
        if !matches!(event, UiEvent::Clicked) {
            return;
        }
        let Some(composer) = weak.upgrade().filter(|c| !c.is_disposed()) else {
            return;
        };
        match composer.graph().invoke(&node, &method) {
            Ok(()) => tracing::debug!(node = %node, method = %method, "method invoked"),
            Err(err) => tracing::warn!(node = %node, method = %method, error = %err, "method failed"),
        }
    });
    button
}

#[cfg(test)]
mod tests {
    use marquetry_core::{FieldSchema, GraphHandle, MemoryGraph, TypeCatalog, TypeSchema, Value};
    use marquetry_ui::UiHandle;

    use super::*;

    fn fixture() -> (NodeComposer, DataNode) {
        let catalog = TypeCatalog::new().with(
            TypeSchema::new("Door")
                .field(FieldSchema::new("open", FieldType::Bool))
                .method("toggle", vec![Annotation::Button { sliding_panel: false }])
                .method(
                    "slam",
                    vec![
                        Annotation::Button { sliding_panel: true },
                        Annotation::Tooltip { text: "Loud".into() },
                    ],
                )
                .method("secret", Vec::new()),
        );
        let mut graph = MemoryGraph::new(catalog);
        let id = graph.spawn("door", "Door").unwrap();
        graph.register_method("Door", "toggle", |door| {
            let open = door.get("open").and_then(Value::as_bool).unwrap_or(false);
            door.set("open", Value::Bool(!open));
            Ok(())
        });
        let graph = GraphHandle::new(graph);
        let root = graph.root(id).unwrap();
        (NodeComposer::builder(graph, UiHandle::new()).build(), root)
    }

    fn button(composer: &NodeComposer, root: UiNodeId, label: &str) -> Option<UiNodeId> {
        composer.ui().read(|t| {
            t.query_kind(root, |k| matches!(k, UiKind::Button))
                .into_iter()
                .find(|id| t.get(*id).is_some_and(|e| e.label == label))
        })
    }

    #[test]
    fn test_buttons_invoke_methods() {
        let (composer, root) = fixture();
        let block = compose_methods(&composer, &root).unwrap();
        assert!(button(&composer, block, "secret").is_none());
        let toggle = button(&composer, block, "toggle").unwrap();
        composer.ui().click(toggle);
        let open = composer.graph().children(&root).unwrap().remove(0);
        assert_eq!(composer.graph().value(&open).unwrap(), Value::Bool(true));

        // No body registered: logged, nothing changes.
        composer.ui().click(button(&composer, block, "slam").unwrap());
        assert_eq!(composer.graph().value(&open).unwrap(), Value::Bool(true));
    }

    #[test]
    fn test_sliding_panel_collects_buttons() {
        let (composer, root) = fixture();
        let block = compose_methods(&composer, &root).unwrap();
        let panel = composer.ui().read(|t| t.query_class(block, METHOD_GROUP_CLASS));
        assert_eq!(panel.len(), 1);
        assert!(button(&composer, panel[0], "slam").is_some());
        assert!(button(&composer, panel[0], "toggle").is_none());
    }

    #[test]
    fn test_no_block_without_buttons_or_decoration() {
        let (composer, root) = fixture();
        composer.toggles().set_decoration_enabled(false);
        assert!(compose_methods(&composer, &root).is_none());
    }
}
