//! # Document Loader
//!
//! Builds a [`MemoryGraph`] from a TOML document declaring types and root
//! objects:
//!
//! ```toml
//! [[enums]]
//! name = "Class"
//! variants = ["Warrior", "Mage"]
//!
//! [[types]]
//! name = "Player"
//! fields = [
//!     { name = "name", type = "text", annotations = [{ kind = "required" }] },
//!     { name = "speed", type = "float" },
//!     { name = "class", type = "enum Class" },
//! ]
//!
//! [[objects]]
//! name = "hero"
//! type = "Player"
//! values = { name = "Ada", speed = 4.5 }
//! ```
//!
//! Object values are merged onto a default instance of their type. Nested
//! tables without `$type` take the declared type of their field. Objects
//! whose type is not declared are kept as-is so hosts can report them.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use marquetry_core::{EnumSchema, FieldType, MemoryGraph, ObjectId, ObjectValue, TypeCatalog, TypeSchema, Value};

use crate::error::{LoadError, LoadResult};

#[derive(Debug, Deserialize)]
struct Document {
    #[serde(default)]
    enums: Vec<EnumSchema>,
    #[serde(default)]
    types: Vec<TypeSchema>,
    #[serde(default)]
    objects: Vec<ObjectDocument>,
}

#[derive(Debug, Deserialize)]
struct ObjectDocument {
    name: String,
    #[serde(rename = "type")]
    type_name: String,
    #[serde(default)]
    values: BTreeMap<String, Value>,
}

/// A loaded document.
pub struct LoadedDocument {
    /// Graph holding every root object.
    pub graph: MemoryGraph,
    /// Root objects in document order.
    pub roots: Vec<ObjectId>,
}

/// Parses a document.
///
/// # Errors
///
/// Returns an error if the TOML is malformed or a value does not fit the
/// declared types.
pub fn load_str(text: &str) -> LoadResult<LoadedDocument> {
    let document: Document = toml::from_str(text)?;
    let mut catalog = TypeCatalog::new();
    for schema in document.enums {
        catalog.insert_enum(schema);
    }
    for schema in document.types {
        catalog.insert(schema);
    }

    let mut objects = Vec::with_capacity(document.objects.len());
    for object in document.objects {
        let value = if catalog.contains(&object.type_name) {
            let mut instance = catalog.instantiate(&object.type_name)?;
            merge(&catalog, &mut instance, object.values, &object.name)?;
            instance
        } else {
            tracing::warn!(object = %object.name, type_name = %object.type_name, "object of unknown type");
            ObjectValue {
                type_name: object.type_name,
                fields: object.values.into_iter().collect(),
            }
        };
        objects.push((object.name, value));
    }

    let mut graph = MemoryGraph::new(catalog);
    let roots = objects
        .into_iter()
        .map(|(name, value)| graph.add_root(name, value))
        .collect::<Vec<_>>();
    tracing::debug!(roots = roots.len(), types = graph.catalog().len(), "document loaded");
    Ok(LoadedDocument { graph, roots })
}

/// Reads and parses a document file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed.
pub fn load_file(path: impl AsRef<Path>) -> LoadResult<LoadedDocument> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_str(&text)
}

fn merge(
    catalog: &TypeCatalog,
    target: &mut ObjectValue,
    values: impl IntoIterator<Item = (String, Value)>,
    at: &str,
) -> LoadResult<()> {
    for (name, value) in values {
        let declared = catalog
            .get(&target.type_name)
            .and_then(|schema| schema.find_field(&name))
            .map(|field| field.ty.clone())
            .ok_or_else(|| LoadError::UnknownField {
                type_name: target.type_name.clone(),
                field: name.clone(),
            })?;
        let path = format!("{at}.{name}");
        let value = conform(catalog, &declared, value, &path)?;
        target.set(&name, value);
    }
    Ok(())
}

fn conform(catalog: &TypeCatalog, declared: &FieldType, value: Value, path: &str) -> LoadResult<Value> {
    match (declared, value) {
        (FieldType::Object(_) | FieldType::Polymorphic(_) | FieldType::Any, Value::Null) => Ok(Value::Null),
        (FieldType::Object(name), Value::Object(object)) => {
            if object.type_name.is_empty() {
                return build_object(catalog, name, object, path);
            }
            if !catalog.is_assignable(&object.type_name, name) {
                return Err(LoadError::NotAssignable {
                    path: path.to_string(),
                    type_name: object.type_name,
                    base: name.clone(),
                });
            }
            let concrete = object.type_name.clone();
            build_object(catalog, &concrete, object, path)
        }
        (FieldType::Polymorphic(base), Value::Object(object)) => {
            if !catalog.is_assignable(&object.type_name, base) {
                return Err(LoadError::NotAssignable {
                    path: path.to_string(),
                    type_name: object.type_name,
                    base: base.clone(),
                });
            }
            let concrete = object.type_name.clone();
            build_object(catalog, &concrete, object, path)
        }
        (FieldType::Sequence(element), Value::List(items)) => items
            .into_iter()
            .enumerate()
            .map(|(i, item)| conform(catalog, element, item, &format!("{path}[{i}]")))
            .collect::<LoadResult<Vec<_>>>()
            .map(Value::List),
        (FieldType::Enum(name), value) => match catalog.enum_schema(name) {
            Some(schema) if !schema.conforms(&value) => Err(LoadError::Mismatch {
                path: path.to_string(),
                expected: declared.to_string(),
                found: value.kind_name(),
            }),
            _ => Ok(value),
        },
        #[allow(clippy::cast_precision_loss)]
        (FieldType::Float, Value::Int(i)) => Ok(Value::Float(i as f64)),
        (declared, value) if declared.accepts(&value) => Ok(value),
        (declared, value) => Err(LoadError::Mismatch {
            path: path.to_string(),
            expected: declared.to_string(),
            found: value.kind_name(),
        }),
    }
}

fn build_object(catalog: &TypeCatalog, concrete: &str, object: ObjectValue, path: &str) -> LoadResult<Value> {
    let mut instance = catalog.instantiate(concrete)?;
    merge(catalog, &mut instance, object.fields, path)?;
    Ok(Value::Object(instance))
}

#[cfg(test)]
mod tests {
    use marquetry_core::{GraphHandle, ObjectGraph};

    use super::*;

    const DOCUMENT: &str = r#"
[[enums]]
name = "Role"
variants = ["Scout", "Guard"]

[[types]]
name = "Shape"
abstract = true

[[types]]
name = "Circle"
implements = ["Shape"]
fields = [{ name = "radius", type = "float" }]

[[types]]
name = "Stats"
fields = [{ name = "hp", type = "int" }]

[[types]]
name = "Unit"
fields = [
    { name = "name", type = "text", annotations = [{ kind = "required" }] },
    { name = "stats", type = "Stats" },
    { name = "shape", type = "dyn Shape" },
    { name = "tags", type = "[text]" },
    { name = "role", type = "enum Role" },
]

[[objects]]
name = "scout"
type = "Unit"
values = { name = "Scout", stats = { hp = 12 }, shape = { "$type" = "Circle", radius = 2 }, tags = ["fast"], role = "Guard" }

[[objects]]
name = "ghost"
type = "Removed"
"#;

    #[test]
    fn test_document_builds_graph() {
        let loaded = load_str(DOCUMENT).unwrap();
        assert_eq!(loaded.roots.len(), 2);
        assert!(loaded.graph.type_known(loaded.roots[0]));
        assert!(!loaded.graph.type_known(loaded.roots[1]));

        let graph = GraphHandle::new(loaded.graph);
        let root = graph.root(loaded.roots[0]).unwrap();
        let fields = graph.children(&root).unwrap();
        assert_eq!(graph.value(&fields[0]).unwrap(), Value::from("Scout"));
        let shape = graph.value(&fields[2]).unwrap();
        assert_eq!(shape.object_type(), Some("Circle"));
        assert_eq!(shape.as_object().unwrap().get("radius"), Some(&Value::Float(2.0)));
        let stats = graph.children(&fields[1]).unwrap();
        assert_eq!(graph.value(&stats[0]).unwrap(), Value::Int(12));
        assert_eq!(graph.value(&fields[4]).unwrap(), Value::from("Guard"));
        assert_eq!(graph.enum_schema("Role").map(|e| e.variants.len()), Some(2));
    }

    #[test]
    fn test_mismatches_are_reported() {
        let bad = DOCUMENT.replace("hp = 12", "hp = \"lots\"");
        assert!(matches!(load_str(&bad), Err(LoadError::Mismatch { .. })));
        let bad = DOCUMENT.replace("\"$type\" = \"Circle\"", "\"$type\" = \"Stats\"");
        assert!(matches!(load_str(&bad), Err(LoadError::NotAssignable { .. })));
        let bad = DOCUMENT.replace("tags = [\"fast\"]", "wings = 2");
        assert!(matches!(load_str(&bad), Err(LoadError::UnknownField { .. })));
        let bad = DOCUMENT.replace("role = \"Guard\"", "role = \"Pilot\"");
        assert!(matches!(load_str(&bad), Err(LoadError::Mismatch { .. })));
    }
}
