//! End-to-end composition of loaded documents.

use marquetry::compose::composer::VALIDATION_ERROR_CLASS;
use marquetry::compose::polymorphic::NULL_CHOICE;
use marquetry::core::MemoryStore;
use marquetry::ui::{UiKind, UiNodeId};
use marquetry::{load_str, GraphHandle, InspectorSession, MarquetryConfig, NodeComposer, UiHandle, Value};

const TREE_DOCUMENT: &str = r#"
[[types]]
name = "NodeType"
fields = [
    { name = "x", type = "int" },
    { name = "y", type = "int", annotations = [{ kind = "required" }] },
    { name = "children", type = "[NodeType]" },
]

[[objects]]
name = "tree"
type = "NodeType"
values = { x = 3 }
"#;

const SHAPES_DOCUMENT: &str = r#"
[[types]]
name = "Shape"
abstract = true

[[types]]
name = "Foo"
implements = ["Shape"]
fields = [{ name = "size", type = "int" }]

[[types]]
name = "Bar"
implements = ["Shape"]
fields = [{ name = "label", type = "text" }]

[[types]]
name = "Holder"
fields = [{ name = "slot", type = "dyn Shape" }]

[[objects]]
name = "holder"
type = "Holder"
values = { slot = { "$type" = "Foo", size = 4 } }
"#;

fn shown_validation_errors(composer: &NodeComposer, root: UiNodeId) -> Vec<String> {
    composer.ui().read(|t| {
        t.query_class(root, VALIDATION_ERROR_CLASS)
            .into_iter()
            .filter(|id| t.is_displayed(*id))
            .filter_map(|id| t.get(id).map(|e| e.name.clone()))
            .collect()
    })
}

fn field_labeled(composer: &NodeComposer, root: UiNodeId, label: &str) -> UiNodeId {
    composer.ui().read(|t| {
        t.query_kind(root, |k| matches!(k, UiKind::Field { .. }))
            .into_iter()
            .find(|id| t.get(*id).is_some_and(|e| e.label == label))
            .unwrap()
    })
}

#[test]
fn test_required_field_shows_exactly_one_indicator() {
    let loaded = load_str(TREE_DOCUMENT).unwrap();
    let owner = loaded.roots[0];
    let composer = NodeComposer::builder(GraphHandle::new(loaded.graph), UiHandle::new()).build();
    let root = composer.compose_object(owner).unwrap();
    composer.ui().attach_root(root);

    let errors = shown_validation_errors(&composer, root);
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert!(errors[0].starts_with('y'));

    composer.ui().edit(field_labeled(&composer, root, "Y"), Value::Int(7));
    assert!(shown_validation_errors(&composer, root).is_empty());

    let graph = composer.graph();
    let y = graph.children(&graph.root(owner).unwrap()).unwrap().remove(1);
    assert_eq!(graph.value(&y).unwrap(), Value::Int(7));

    assert!(graph.undo());
    assert_eq!(shown_validation_errors(&composer, root).len(), 1);
}

#[test]
fn test_required_field_in_list_elements() {
    let loaded = load_str(TREE_DOCUMENT).unwrap();
    let owner = loaded.roots[0];
    let composer = NodeComposer::builder(GraphHandle::new(loaded.graph), UiHandle::new()).build();
    let root = composer.compose_object(owner).unwrap();
    composer.ui().attach_root(root);

    let graph = composer.graph();
    let children = graph.children(&graph.root(owner).unwrap()).unwrap().remove(2);
    graph.insert_element(&children, 0, None).unwrap();
    graph.insert_element(&children, 1, None).unwrap();

    // The root's y plus one per element.
    assert_eq!(shown_validation_errors(&composer, root).len(), 3);
}

#[test]
fn test_polymorphic_selection_and_reselection() {
    let loaded = load_str(SHAPES_DOCUMENT).unwrap();
    let owner = loaded.roots[0];
    let composer = NodeComposer::builder(GraphHandle::new(loaded.graph), UiHandle::new()).build();
    let root = composer.compose_object(owner).unwrap();
    composer.ui().attach_root(root);

    let graph = composer.graph();
    let slot = graph.children(&graph.root(owner).unwrap()).unwrap().remove(0);
    let (selector, choices) = composer.ui().read(|t| {
        let id = t.query_kind(root, |k| matches!(k, UiKind::Dropdown { .. }))[0];
        match &t.get(id).unwrap().kind {
            UiKind::Dropdown { choices, .. } => (id, choices.clone()),
            _ => unreachable!(),
        }
    });
    assert_eq!(choices, vec![NULL_CHOICE.to_string(), "Bar".to_string(), "Foo".to_string()]);

    let bar = choices.iter().position(|c| c == "Bar").unwrap();
    composer.ui().select(selector, bar);
    let value = graph.value(&slot).unwrap();
    assert_eq!(value.object_type(), Some("Bar"));
    assert_eq!(value.as_object().unwrap().get("label"), Some(&Value::from("")));

    let label = graph.children(&slot).unwrap().into_iter().find(|c| c.display_name() == "Label").unwrap();
    graph.write(&label, Value::from("kept")).unwrap();
    composer.ui().select(selector, bar);
    let value = graph.value(&slot).unwrap();
    assert_eq!(value.as_object().unwrap().get("label"), Some(&Value::from("kept")));

    composer.ui().select(selector, 0);
    assert_eq!(graph.value(&slot).unwrap(), Value::Null);
}

#[test]
fn test_session_reports_missing_types() {
    let document = format!("{TREE_DOCUMENT}\n[[objects]]\nname = \"orphan\"\ntype = \"Gone\"\n");
    let loaded = load_str(&document).unwrap();
    let mut session = InspectorSession::new(
        GraphHandle::new(loaded.graph),
        loaded.roots,
        &MarquetryConfig::default(),
        MemoryStore::shared(),
    );
    session.compose_all().unwrap();
    assert!(session.render().contains(marquetry::compose::composer::MISSING_TYPE_MESSAGE));

    session.validate(true);
    session.settle();
    let messages: Vec<&str> = session.logs().iter().map(|l| l.message()).collect();
    assert!(messages.contains(&marquetry::compose::composer::MISSING_TYPE_MESSAGE));
    assert_eq!(session.counters().errors, 2);
}
