//! Composer, cache and decorator pipeline behaviour over whole objects.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use marquetry::compose::error::DecoratorResult;
use marquetry::core::{
    AnnotationKind, FieldSchema, FieldType, MemoryGraph, ObjectId, TypeCatalog, TypeSchema,
};
use marquetry::ui::{UiKind, UiNodeId};
use marquetry::{
    Annotation, DataNode, Decorator, DecoratorRegistry, GraphHandle, NodeComposer, UiHandle, Value,
};

struct Labelled {
    name: &'static str,
    replaces: bool,
    replaced: Arc<AtomicUsize>,
}

impl Decorator for Labelled {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::new(self.name)
    }

    fn replaces_editor(&self) -> bool {
        self.replaces
    }

    fn replace(&mut self, composer: &NodeComposer, _node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        self.replaced.fetch_add(1, Ordering::SeqCst);
        Ok(Some(composer.ui().create_labeled(UiKind::Label, format!("editor {}", self.name))))
    }

    fn wrap(&mut self, composer: &NodeComposer, _node: &DataNode, inner: UiNodeId) -> DecoratorResult<UiNodeId> {
        let outer = composer.ui().create_labeled(UiKind::Container, format!("wrap {}", self.name));
        composer.ui().append(outer, inner);
        Ok(outer)
    }
}

#[derive(Default)]
struct Counters {
    watched: Arc<AtomicUsize>,
    timed: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

struct Listening {
    watched: Arc<AtomicUsize>,
    timed: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl Decorator for Listening {
    fn kind(&self) -> AnnotationKind {
        AnnotationKind::new("listening")
    }

    fn on_bound(&mut self, composer: &NodeComposer, node: &DataNode, _editor: UiNodeId) -> DecoratorResult<()> {
        let watched = Arc::clone(&self.watched);
        composer.retain_subscription(composer.graph().watch(node, move || {
            watched.fetch_add(1, Ordering::SeqCst);
        }));
        let timed = Arc::clone(&self.timed);
        composer.retain_timer(composer.scheduler().every(1, move || {
            timed.fetch_add(1, Ordering::SeqCst);
        }));
        Ok(())
    }

    fn release(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

fn registry(replaced: &Arc<AtomicUsize>, counters: &Counters) -> DecoratorRegistry {
    let mut registry = DecoratorRegistry::with_builtins();
    for (name, replaces) in [("outer", false), ("inner", false), ("first", true), ("second", true)] {
        let replaced = Arc::clone(replaced);
        registry.register(AnnotationKind::new(name), move |_| {
            Ok(Box::new(Labelled {
                name,
                replaces,
                replaced: Arc::clone(&replaced),
            }) as Box<dyn Decorator>)
        });
    }
    let (watched, timed, released) = (
        Arc::clone(&counters.watched),
        Arc::clone(&counters.timed),
        Arc::clone(&counters.released),
    );
    registry.register(AnnotationKind::new("listening"), move |_| {
        Ok(Box::new(Listening {
            watched: Arc::clone(&watched),
            timed: Arc::clone(&timed),
            released: Arc::clone(&released),
        }) as Box<dyn Decorator>)
    });
    registry
}

fn catalog() -> TypeCatalog {
    TypeCatalog::new()
        .with(
            TypeSchema::new("Leaf")
                .field(FieldSchema::new("a", FieldType::Int))
                .field(FieldSchema::new("b", FieldType::Float)),
        )
        .with(
            TypeSchema::new("Tagged")
                .field(FieldSchema::new("tag", FieldType::Text).annotated(Annotation::Required { message: None })),
        )
        .with(TypeSchema::new("Middle").field(FieldSchema::new("tagged", FieldType::Object("Tagged".into()))))
        .with(
            TypeSchema::new("Widget")
                .field(FieldSchema::new("plain", FieldType::Object("Leaf".into())))
                .field(FieldSchema::new("deep", FieldType::Object("Middle".into())))
                .field(
                    FieldSchema::new("wrapped", FieldType::Int)
                        .annotated(Annotation::custom("outer"))
                        .annotated(Annotation::custom("inner")),
                )
                .field(
                    FieldSchema::new("replaced", FieldType::Int)
                        .annotated(Annotation::custom("first"))
                        .annotated(Annotation::custom("second")),
                )
                .field(FieldSchema::new("watched", FieldType::Int).annotated(Annotation::custom("listening")))
                .field(
                    FieldSchema::new("tags", FieldType::parse("[text]").unwrap())
                        .annotated(Annotation::Space {
                            top: 8,
                            bottom: 0,
                            left: 0,
                            right: 0,
                        })
                        .annotated(Annotation::Tooltip { text: "one tag".into() }),
                ),
        )
}

struct Fixture {
    composer: NodeComposer,
    owner: ObjectId,
    replaced: Arc<AtomicUsize>,
    counters: Counters,
}

fn fixture() -> Fixture {
    let mut graph = MemoryGraph::new(catalog());
    let owner = graph.spawn("widget", "Widget").unwrap();
    let replaced = Arc::new(AtomicUsize::new(0));
    let counters = Counters::default();
    let composer = NodeComposer::builder(GraphHandle::new(graph), UiHandle::new())
        .registry(Arc::new(registry(&replaced, &counters)))
        .build();
    Fixture {
        composer,
        owner,
        replaced,
        counters,
    }
}

fn field(composer: &NodeComposer, owner: ObjectId, name: &str) -> DataNode {
    let graph = composer.graph();
    graph
        .children(&graph.root(owner).unwrap())
        .unwrap()
        .into_iter()
        .find(|c| c.path().to_string() == name)
        .unwrap()
}

fn labelled(composer: &NodeComposer, root: UiNodeId, label: &str) -> Vec<UiNodeId> {
    composer.ui().read(|t| {
        t.iter_dfs(root)
            .filter(|id| t.get(*id).is_some_and(|e| e.label == label))
            .collect()
    })
}

fn all_nodes(graph: &GraphHandle, root: &DataNode) -> Vec<(Option<DataNode>, DataNode)> {
    let mut out = vec![(None, root.clone())];
    let mut i = 0;
    while i < out.len() {
        let node = out[i].1.clone();
        for child in graph.children(&node).unwrap_or_default() {
            out.push((Some(node.clone()), child));
        }
        i += 1;
    }
    out
}

#[test]
fn test_requires_decoration_is_monotonic() {
    let f = fixture();
    let graph = f.composer.graph().clone();
    let root = graph.root(f.owner).unwrap();
    assert!(f.composer.requires_decoration(&root));
    let root_view = f.composer.compose_object(f.owner).unwrap();
    f.composer.ui().attach_root(root_view);

    let cache = f.composer.cache();
    for (parent, node) in all_nodes(&graph, &root) {
        let Some(parent) = parent else {
            continue;
        };
        if cache.get(&node) == Some(true) {
            assert_eq!(cache.get(&parent), Some(true), "{parent} must follow {node}");
        }
    }
    assert_eq!(cache.get(&field(&f.composer, f.owner, "plain")), Some(false));
    assert_eq!(cache.get(&field(&f.composer, f.owner, "deep")), Some(true));
}

#[test]
fn test_second_compose_hits_the_cache() {
    let f = fixture();
    let deep = field(&f.composer, f.owner, "deep");
    f.composer.compose(&deep, false, true).unwrap();
    let walks = f.composer.cache().walks();
    assert!(walks > 0);
    f.composer.compose(&deep, false, true).unwrap();
    assert_eq!(f.composer.cache().walks(), walks);
}

#[test]
fn test_first_declared_wrapper_is_outermost() {
    let f = fixture();
    let root = f.composer.compose_object(f.owner).unwrap();
    let outer = labelled(&f.composer, root, "wrap outer");
    assert_eq!(outer.len(), 1);
    let inner = f.composer.ui().children(outer[0]);
    assert_eq!(inner.len(), 1);
    assert_eq!(f.composer.ui().element(inner[0]).unwrap().label, "wrap inner");
}

#[test]
fn test_only_first_replacement_is_used() {
    let f = fixture();
    let root = f.composer.compose_object(f.owner).unwrap();
    assert_eq!(labelled(&f.composer, root, "editor first").len(), 1);
    assert!(labelled(&f.composer, root, "editor second").is_empty());
    assert_eq!(f.replaced.load(Ordering::SeqCst), 1);
}

#[test]
fn test_dispose_silences_callbacks_and_timers() {
    let f = fixture();
    let root = f.composer.compose_object(f.owner).unwrap();
    f.composer.ui().attach_root(root);

    let watched = field(&f.composer, f.owner, "watched");
    f.composer.graph().write(&watched, Value::Int(1)).unwrap();
    f.composer.scheduler().tick();
    assert_eq!(f.counters.watched.load(Ordering::SeqCst), 1);
    assert_eq!(f.counters.timed.load(Ordering::SeqCst), 1);

    f.composer.dispose();
    assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);
    f.composer.graph().write(&watched, Value::Int(2)).unwrap();
    f.composer.scheduler().tick();
    f.composer.scheduler().tick();
    assert_eq!(f.counters.watched.load(Ordering::SeqCst), 1);
    assert_eq!(f.counters.timed.load(Ordering::SeqCst), 1);

    f.composer.dispose();
    assert_eq!(f.counters.released.load(Ordering::SeqCst), 1);
}

#[test]
fn test_sequence_annotations_are_split() {
    let f = fixture();
    let tags = field(&f.composer, f.owner, "tags");
    for i in 0..3 {
        f.composer.graph().insert_element(&tags, i, Some(Value::from("t"))).unwrap();
    }
    let root = f.composer.compose_object(f.owner).unwrap();
    f.composer.ui().attach_root(root);

    let ui = f.composer.ui();
    let spacers = ui.read(|t| t.query_class(root, "space"));
    assert_eq!(spacers.len(), 1);
    let lists = ui.read(|t| t.query_kind(spacers[0], |k| matches!(k, UiKind::List)));
    assert_eq!(lists.len(), 1);

    let tooltips: Vec<Option<String>> = ui.read(|t| {
        t.query_kind(lists[0], |k| matches!(k, UiKind::Field { .. }))
            .into_iter()
            .map(|id| t.get(id).and_then(|e| e.tooltip.clone()))
            .collect()
    });
    assert_eq!(tooltips, vec![Some("one tag".to_string()); 3]);
    let list_tooltip = ui.element(lists[0]).unwrap().tooltip;
    assert_eq!(list_tooltip, None);
}
