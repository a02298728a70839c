//! # Decorator Pipeline
//!
//! Wraps a node's field editor with the decorators of its annotations:
//!
//! ```text
//! ┌ root (named by path) ─────────────┐
//! │  pre outputs, declaration order   │
//! │  field editor (or replacement)    │   wrapped by decorators in
//! │  post outputs, declaration order  │   reverse order: the first
//! └───────────────────────────────────┘   declared ends up outermost
//! ```
//!
//! Failing constructors and hooks are logged and leave an error indicator
//! where their contribution would have gone.

use std::rc::Rc;

use marquetry_core::{Annotation, DataNode};
use marquetry_ui::{UiKind, UiNodeId};

use crate::composer::NodeComposer;
use crate::decorator::DecoratorCell;

/// Class of the pipeline's root container.
pub const PIPELINE_ROOT_CLASS: &str = "decorated-property";

/// Runs the decorators of `annotations` around `editor`. Returns the
/// outermost node.
pub fn apply_decorators(
    composer: &NodeComposer,
    node: &DataNode,
    editor: UiNodeId,
    annotations: &[Annotation],
) -> UiNodeId {
    let ui = composer.ui();
    let annotations: &[Annotation] = if composer.decoration_enabled() { annotations } else { &[] };

    let mut cells = Vec::with_capacity(annotations.len());
    let mut failures = Vec::new();
    for annotation in annotations {
        match composer.registry().create(annotation) {
            Some(Ok(decorator)) => {
                let cell = Rc::new(DecoratorCell::new(decorator));
                composer.register_decorator(Rc::clone(&cell));
                cells.push(cell);
            }
            Some(Err(err)) => failures.push(composer.error_indicator(node, &err)),
            None => {}
        }
    }

    let root = ui.create(UiKind::Container);
    ui.edit_element(root, |e| e.name = node.path().to_string());
    ui.add_class(root, PIPELINE_ROOT_CLASS);
    for failure in failures {
        ui.append(root, failure);
    }
    if cells.is_empty() {
        ui.append(root, editor);
        return root;
    }

    for cell in &cells {
        let contribution = match cell.with(|d| d.pre(composer, node)) {
            Some(Ok(Some(id))) => Some(id),
            Some(Err(err)) => Some(composer.error_indicator(node, &err)),
            _ => None,
        };
        if let Some(id) = contribution {
            ui.append(root, id);
        }
    }

    let mut field = editor;
    if let Some(cell) = cells.iter().find(|c| c.with(|d| d.replaces_editor()).unwrap_or(false)) {
        match cell.with(|d| d.replace(composer, node)) {
            Some(Ok(Some(replacement))) => {
                ui.remove(editor);
                field = replacement;
            }
            Some(Err(err)) => {
                ui.remove(editor);
                field = composer.error_indicator(node, &err);
            }
            _ => {}
        }
    }
    ui.append(root, field);

    for cell in &cells {
        let contribution = match cell.with(|d| d.post(composer, node)) {
            Some(Ok(Some(id))) => Some(id),
            Some(Err(err)) => Some(composer.error_indicator(node, &err)),
            _ => None,
        };
        if let Some(id) = contribution {
            ui.append(root, id);
        }
    }

    let mut outer = root;
    for cell in cells.iter().rev() {
        match cell.with(|d| d.wrap(composer, node, outer)) {
            Some(Ok(wrapped)) => outer = wrapped,
            Some(Err(err)) => {
                let indicator = composer.error_indicator(node, &err);
                ui.append(root, indicator);
            }
            None => {}
        }
    }

    schedule_bound(composer, node, root, field, cells);
    outer
}

/// Fires every decorator's bound hook once `field` is live.
fn schedule_bound(
    composer: &NodeComposer,
    node: &DataNode,
    root: UiNodeId,
    field: UiNodeId,
    cells: Vec<Rc<DecoratorCell>>,
) {
    let weak = composer.downgrade();
    let node = node.clone();
    composer.ui().on_attach(field, move || {
        let Some(composer) = weak.upgrade() else {
            return;
        };
        if composer.is_disposed() {
            return;
        }
        for cell in cells.iter().filter(|c| !c.is_released()) {
            if let Some(Err(err)) = cell.with(|d| d.on_bound(&composer, &node, field)) {
                let indicator = composer.error_indicator(&node, &err);
                composer.ui().append(root, indicator);
            }
        }
        tracing::trace!(node = %node, decorators = cells.len(), "decorators bound");
    });
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use marquetry_core::{
        AnnotationKind, FieldSchema, FieldType, GraphHandle, MemoryGraph, TypeCatalog, TypeSchema,
    };
    use marquetry_ui::UiHandle;

    use super::*;
    use crate::decorator::Decorator;
    use crate::error::{DecoratorError, DecoratorResult};
    use crate::registry::DecoratorRegistry;

    type Journal = Arc<Mutex<Vec<String>>>;

    fn entries(journal: &Journal) -> Vec<String> {
        journal.lock().unwrap().clone()
    }

    struct Recorder {
        name: String,
        replaces: bool,
        journal: Journal,
    }

    impl Decorator for Recorder {
        fn kind(&self) -> AnnotationKind {
            AnnotationKind::new(self.name.clone())
        }

        fn pre(&mut self, composer: &NodeComposer, _node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
            self.journal.lock().unwrap().push(format!("pre {}", self.name));
            Ok(Some(composer.ui().create_labeled(UiKind::Label, format!("pre {}", self.name))))
        }

        fn replaces_editor(&self) -> bool {
            self.replaces
        }

        fn replace(&mut self, composer: &NodeComposer, _node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
            self.journal.lock().unwrap().push(format!("replace {}", self.name));
            Ok(Some(composer.ui().create_labeled(UiKind::Label, format!("editor {}", self.name))))
        }

        fn wrap(&mut self, composer: &NodeComposer, _node: &DataNode, inner: UiNodeId) -> DecoratorResult<UiNodeId> {
            let outer = composer.ui().create_labeled(UiKind::Container, format!("wrap {}", self.name));
            composer.ui().append(outer, inner);
            Ok(outer)
        }

        fn on_bound(&mut self, _composer: &NodeComposer, _node: &DataNode, _editor: UiNodeId) -> DecoratorResult<()> {
            self.journal.lock().unwrap().push(format!("bound {}", self.name));
            Ok(())
        }
    }

    struct Broken;

    impl Decorator for Broken {
        fn kind(&self) -> AnnotationKind {
            AnnotationKind::new("broken")
        }

        fn pre(&mut self, _composer: &NodeComposer, node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
            Err(DecoratorError::Failed {
                kind: self.kind(),
                reason: format!("cannot decorate {}", node.path()),
            })
        }
    }

    fn setup(journal: &Journal) -> (NodeComposer, DataNode) {
        let catalog = TypeCatalog::new().with(TypeSchema::new("Box").field(FieldSchema::new("x", FieldType::Int)));
        let mut graph = MemoryGraph::new(catalog);
        let id = graph.spawn("box", "Box").unwrap();
        let graph = GraphHandle::new(graph);
        let x = graph.children(&graph.root(id).unwrap()).unwrap().remove(0);

        let mut registry = DecoratorRegistry::new();
        for (name, replaces) in [("a", true), ("b", true), ("c", false)] {
            let journal = Arc::clone(journal);
            registry.register(AnnotationKind::new(name), move |_| {
                Ok(Box::new(Recorder {
                    name: name.to_string(),
                    replaces,
                    journal: Arc::clone(&journal),
                }) as Box<dyn Decorator>)
            });
        }
        registry.register(AnnotationKind::new("broken"), |_| Ok(Box::new(Broken) as Box<dyn Decorator>));
        let composer = NodeComposer::builder(graph, UiHandle::new())
            .registry(Arc::new(registry))
            .build();
        (composer, x)
    }

    fn label(composer: &NodeComposer, id: UiNodeId) -> String {
        composer.ui().element(id).map(|e| e.label).unwrap_or_default()
    }

    #[test]
    fn test_wrap_order_first_declared_outermost() {
        let journal = Journal::default();
        let (composer, x) = setup(&journal);
        let editor = composer.ui().create_labeled(UiKind::Label, "default");
        let annotations = [Annotation::custom("c"), Annotation::custom("a")];
        let outer = apply_decorators(&composer, &x, editor, &annotations);
        assert_eq!(label(&composer, outer), "wrap c");
        let inner = composer.ui().children(outer)[0];
        assert_eq!(label(&composer, inner), "wrap a");
    }

    #[test]
    fn test_first_replacement_wins() {
        let journal = Journal::default();
        let (composer, x) = setup(&journal);
        let editor = composer.ui().create_labeled(UiKind::Label, "default");
        let annotations = [Annotation::custom("a"), Annotation::custom("b")];
        let outer = apply_decorators(&composer, &x, editor, &annotations);
        let labels: Vec<String> = composer
            .ui()
            .read(|t| t.iter_dfs(outer).map(|id| t.get(id).map(|e| e.label.clone()).unwrap_or_default()).collect());
        assert!(labels.contains(&"editor a".to_string()));
        assert!(!labels.contains(&"editor b".to_string()));
        assert!(!labels.contains(&"default".to_string()));
        assert!(!entries(&journal).contains(&"replace b".to_string()));
    }

    #[test]
    fn test_bound_after_attach_and_silent_after_dispose() {
        let journal = Journal::default();
        let (composer, x) = setup(&journal);
        let editor = composer.ui().create_labeled(UiKind::Label, "default");
        let outer = apply_decorators(&composer, &x, editor, &[Annotation::custom("c")]);
        assert!(!entries(&journal).iter().any(|e| e.starts_with("bound")));
        composer.ui().attach_root(outer);
        assert_eq!(entries(&journal).last().map(String::as_str), Some("bound c"));

        let editor = composer.ui().create_labeled(UiKind::Label, "late");
        let late = apply_decorators(&composer, &x, editor, &[Annotation::custom("a")]);
        composer.dispose();
        composer.ui().attach_root(late);
        assert!(!entries(&journal).contains(&"bound a".to_string()));
    }

    #[test]
    fn test_failing_hook_leaves_indicator() {
        let journal = Journal::default();
        let (composer, x) = setup(&journal);
        let editor = composer.ui().create_labeled(UiKind::Label, "default");
        let outer = apply_decorators(&composer, &x, editor, &[Annotation::custom("broken"), Annotation::custom("c")]);
        let errors = composer
            .ui()
            .read(|t| t.query_kind(outer, |k| matches!(k, UiKind::ErrorIndicator)));
        assert_eq!(errors.len(), 1);
        assert!(entries(&journal).contains(&"pre c".to_string()));
    }

    #[test]
    fn test_unregistered_annotations_are_skipped() {
        let journal = Journal::default();
        let (composer, x) = setup(&journal);
        let editor = composer.ui().create_labeled(UiKind::Label, "default");
        let outer = apply_decorators(&composer, &x, editor, &[Annotation::custom("nobody")]);
        assert_eq!(composer.ui().children(outer), vec![editor]);
    }
}
