//! Configuration and persisted state across composers.

use std::sync::Arc;

use marquetry::compose::composer::{NESTED_FIELD_CLASS, VALIDATION_ERROR_CLASS};
use marquetry::core::{MemoryStore, SharedStore, TomlFileStore};
use marquetry::ui::{UiNodeId, UiRenderer};
use marquetry::{load_str, GraphHandle, MarquetryConfig, NodeComposer, ObjectId, UiHandle};

const DOCUMENT: &str = r#"
[[types]]
name = "Stats"
fields = [{ name = "hp", type = "int", annotations = [{ kind = "required" }] }]

[[types]]
name = "Unit"
fields = [
    { name = "name", type = "text" },
    { name = "stats", type = "Stats" },
]

[[objects]]
name = "hero"
type = "Unit"
"#;

fn temp_state_path(tag: &str) -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("marquetry_{tag}_{id}.toml"))
}

fn compose(config: &MarquetryConfig, store: SharedStore) -> (NodeComposer, UiNodeId) {
    let loaded = load_str(DOCUMENT).unwrap();
    let owner: ObjectId = loaded.roots[0];
    let composer = NodeComposer::builder(GraphHandle::new(loaded.graph), UiHandle::new())
        .store(store)
        .config(config)
        .build();
    let root = composer.compose_object(owner).unwrap();
    composer.ui().attach_root(root);
    (composer, root)
}

fn count_class(composer: &NodeComposer, root: UiNodeId, class: &str) -> usize {
    composer.ui().read(|t| t.query_class(root, class).len())
}

#[test]
fn test_config_sections_parse() {
    let config = MarquetryConfig::from_toml_str(
        r#"
[composer]
decoration_enabled = false
ignored_type_names = ["Stats"]

[validator]
batch_quota = 16
location_name = "Level"
"#,
    )
    .unwrap();
    assert!(!config.composer.decoration_enabled);
    assert_eq!(config.composer.ignored_type_names, vec!["Stats".to_string()]);
    assert_eq!(config.validator.batch_quota, 16);
    assert_eq!(config.validator.location_name, "Level");
    assert_eq!(config.styles, MarquetryConfig::default().styles);

    assert!(MarquetryConfig::from_toml_str("[validator]\nbatch_quota = 0\n").is_err());
}

#[test]
fn test_ignored_types_are_not_decorated() {
    let config = MarquetryConfig::from_toml_str("[composer]\nignored_type_names = [\"Stats\"]\n").unwrap();
    let (composer, root) = compose(&config, MemoryStore::shared());
    assert_eq!(count_class(&composer, root, VALIDATION_ERROR_CLASS), 0);

    let (composer, root) = compose(&MarquetryConfig::default(), MemoryStore::shared());
    assert_eq!(count_class(&composer, root, VALIDATION_ERROR_CLASS), 1);
}

#[test]
fn test_decoration_toggle_persists() {
    let path = temp_state_path("toggle");
    let config = MarquetryConfig::from_toml_str("[composer]\ndecoration_enabled = false\n").unwrap();
    {
        let store: SharedStore = Arc::new(TomlFileStore::open(&path).unwrap());
        let (composer, root) = compose(&config, store);
        assert_eq!(count_class(&composer, root, VALIDATION_ERROR_CLASS), 0);
        let indicator = composer.ui().read(|t| t.query_class(root, "decoration-indicator"))[0];
        assert!(composer.ui().has_class(indicator, "indicator-disabled"));
        composer.ui().click(indicator);
        assert!(composer.ui().has_class(indicator, "indicator-enabled"));
        assert!(composer.decoration_enabled());
    }

    let store: SharedStore = Arc::new(TomlFileStore::open(&path).unwrap());
    let (composer, root) = compose(&config, store);
    assert!(composer.decoration_enabled());
    assert_eq!(count_class(&composer, root, VALIDATION_ERROR_CLASS), 1);
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_foldout_state_persists() {
    let path = temp_state_path("foldout");
    {
        let store: SharedStore = Arc::new(TomlFileStore::open(&path).unwrap());
        let (composer, root) = compose(&MarquetryConfig::default(), store);
        let foldouts = composer.ui().read(|t| t.query_class(root, NESTED_FIELD_CLASS));
        assert_eq!(foldouts.len(), 1);
        assert!(composer.ui().element(foldouts[0]).unwrap().is_expanded());
        composer.ui().toggle(foldouts[0]);
    }

    let store: SharedStore = Arc::new(TomlFileStore::open(&path).unwrap());
    let (composer, root) = compose(&MarquetryConfig::default(), store);
    let foldouts = composer.ui().read(|t| t.query_class(root, NESTED_FIELD_CLASS));
    assert!(!composer.ui().element(foldouts[0]).unwrap().is_expanded());
    let mut renderer = UiRenderer::default();
    composer.ui().read(|t| renderer.render(t, composer.styles(), root));
    let outline = renderer.to_text();
    assert!(outline.contains("Stats"));
    assert!(!outline.contains("Hp"));
    let _ = std::fs::remove_file(&path);
}
