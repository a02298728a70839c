//! Incremental validation over large and gated graphs.

use std::collections::HashSet;

use marquetry::core::{
    FieldSchema, FieldType, MemoryGraph, MemoryStore, ObjectValue, Toggles, TypeCatalog, TypeSchema, ValidatorConfig,
};
use marquetry::validator::{RunState, ValidationContext};
use marquetry::{load_str, Annotation, GraphHandle, ObjectId, Validator, Value};

const ELEMENTS: usize = 10_000;
const QUOTA: usize = 64;

fn large_graph() -> (GraphHandle, ObjectId) {
    let catalog = TypeCatalog::new().with(
        TypeSchema::new("Samples").field(
            FieldSchema::new("values", FieldType::Sequence(Box::new(FieldType::Int)))
                .annotated(Annotation::Required { message: None }),
        ),
    );
    let mut graph = MemoryGraph::new(catalog);
    let samples = ObjectValue::new("Samples").with("values", Value::List(vec![Value::Int(0); ELEMENTS]));
    let owner = graph.add_root("samples", samples);
    (GraphHandle::new(graph), owner)
}

fn validator(graph: GraphHandle) -> Validator {
    let toggles = Toggles::new(MemoryStore::shared(), true);
    Validator::with_builtins(ValidationContext::new(graph, toggles, ValidatorConfig::default()))
}

#[test]
fn test_batches_respect_quota_without_gaps_or_repeats() {
    let (graph, owner) = large_graph();
    let mut validator = validator(graph);
    validator.start(&[owner], true);

    let mut ticks = 0;
    let mut processed = 0;
    loop {
        let state = validator.tick(QUOTA);
        ticks += 1;
        assert!(validator.last_tick_processed() <= QUOTA);
        processed += validator.last_tick_processed();
        if state == RunState::Idle {
            break;
        }
    }
    assert!(ticks >= ELEMENTS / QUOTA);

    let paths: Vec<String> = validator
        .logs()
        .iter()
        .filter_map(|log| log.path().map(ToString::to_string))
        .collect();
    assert_eq!(paths.len(), ELEMENTS);
    let unique: HashSet<&String> = paths.iter().collect();
    assert_eq!(unique.len(), ELEMENTS);
    assert!(unique.contains(&"values[0]".to_string()));
    assert!(unique.contains(&format!("values[{}]", ELEMENTS - 1)));
    // Root, the sequence and every element, plus one unit per other module.
    assert!(processed >= ELEMENTS + 2);
}

#[test]
fn test_enable_if_gates_validation() {
    let document = r#"
[[types]]
name = "Settings"
fields = [
    { name = "advanced", type = "bool" },
    { name = "endpoint", type = "text", annotations = [
        { kind = "enable_if", member = "advanced", values = [true] },
        { kind = "required", message = "Endpoint needed" },
    ] },
]

[[objects]]
name = "settings"
type = "Settings"
"#;
    let loaded = load_str(document).unwrap();
    let owner = loaded.roots[0];
    let graph = GraphHandle::new(loaded.graph);
    let mut validator = validator(graph.clone());

    validator.start(&[owner], false);
    validator.run_to_completion(QUOTA);
    assert_eq!(validator.counters().total(), 0);

    let advanced = graph.children(&graph.root(owner).unwrap()).unwrap().remove(0);
    graph.write(&advanced, Value::Bool(true)).unwrap();
    validator.start(&[owner], false);
    validator.run_to_completion(QUOTA);
    assert_eq!(validator.counters().errors, 1);
    let log = &validator.logs()[0];
    assert_eq!(log.message(), "Endpoint needed");
    assert_eq!(log.location(), "settings");
    assert!(log.is_target_alive(&graph));

    assert!(graph.destroy(owner));
    assert!(!log.is_target_alive(&graph));
}
