//! # Type Schemas
//!
//! Runtime-discovered shapes of the objects in a graph. A [`TypeCatalog`]
//! plays the part of reflection: it knows every type's fields, methods,
//! abstractness and implemented capabilities.

use std::collections::{BTreeMap, HashSet, VecDeque};
use std::fmt;

use serde::Deserialize;

use crate::annotation::Annotation;
use crate::error::{CoreError, CoreResult};
use crate::value::{ObjectValue, Value};

/// Declared type of a field.
///
/// Written in documents as `int`, `float`, `bool`, `text`, `any`, a type
/// name, `[T]` for sequences, `dyn Base` for polymorphic slots, `&Type`
/// for references to other root objects and `enum Name` for declared
/// enumerations.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum FieldType {
    /// Integer scalar.
    Int,
    /// Floating point scalar.
    Float,
    /// Boolean scalar.
    Bool,
    /// Text scalar.
    Text,
    /// Untyped scalar.
    Any,
    /// Nested object of a concrete type.
    Object(String),
    /// Ordered sequence.
    Sequence(Box<FieldType>),
    /// Slot holding any concrete implementor of an abstract type.
    Polymorphic(String),
    /// Reference to another root object.
    Reference(String),
    /// One variant (or, for flag enums, a set of variants) of a declared
    /// enumeration.
    Enum(String),
}

impl FieldType {
    /// Parses the document notation.
    pub fn parse(text: &str) -> CoreResult<Self> {
        let text = text.trim();
        if let Some(inner) = text.strip_prefix('[').and_then(|t| t.strip_suffix(']')) {
            return Ok(Self::Sequence(Box::new(Self::parse(inner)?)));
        }
        if let Some(base) = text.strip_prefix("dyn ") {
            return Ok(Self::Polymorphic(base.trim().to_string()));
        }
        if let Some(name) = text.strip_prefix("enum ") {
            return Ok(Self::Enum(name.trim().to_string()));
        }
        if let Some(target) = text.strip_prefix('&') {
            return Ok(Self::Reference(target.trim().to_string()));
        }
        Ok(match text {
            "int" => Self::Int,
            "float" => Self::Float,
            "bool" => Self::Bool,
            "text" | "string" => Self::Text,
            "any" => Self::Any,
            "" => return Err(CoreError::UnknownType(String::new())),
            name => Self::Object(name.to_string()),
        })
    }

    /// Infers a type from a value when no schema is known.
    #[must_use]
    pub fn infer(value: &Value) -> Self {
        match value {
            Value::Bool(_) => Self::Bool,
            Value::Int(_) => Self::Int,
            Value::Float(_) => Self::Float,
            Value::Text(_) => Self::Text,
            Value::List(_) => Self::Sequence(Box::new(Self::Any)),
            Value::Object(o) => Self::Object(o.type_name.clone()),
            Value::Reference(_) => Self::Reference(String::new()),
            Value::Null => Self::Any,
        }
    }

    /// Name used for ignore-list matching and display.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::Object(name) | Self::Polymorphic(name) | Self::Reference(name) | Self::Enum(name) => {
                name.clone()
            }
            other => other.to_string(),
        }
    }

    /// Element type of a sequence.
    #[must_use]
    pub fn element(&self) -> Option<&Self> {
        match self {
            Self::Sequence(inner) => Some(inner),
            _ => None,
        }
    }

    /// Returns true if a value of this shape may be stored here.
    #[must_use]
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _)
            | (Self::Int, Value::Int(_))
            | (Self::Float, Value::Float(_) | Value::Int(_))
            | (Self::Bool, Value::Bool(_))
            | (Self::Text, Value::Text(_))
            | (Self::Sequence(_), Value::List(_))
            | (Self::Polymorphic(_) | Self::Reference(_), Value::Null)
            | (Self::Reference(_), Value::Reference(_))
            | (Self::Enum(_), Value::Text(_) | Value::List(_)) => true,
            (Self::Object(name), Value::Object(o)) => &o.type_name == name,
            (Self::Polymorphic(_), Value::Object(_)) => true,
            _ => false,
        }
    }

    /// Default value of a fresh field of this type.
    #[must_use]
    pub fn default_value(&self, catalog: &TypeCatalog) -> Value {
        let mut visiting = HashSet::new();
        self.default_in(catalog, &mut visiting)
    }

    fn default_in(&self, catalog: &TypeCatalog, visiting: &mut HashSet<String>) -> Value {
        match self {
            Self::Int => Value::Int(0),
            Self::Float => Value::Float(0.0),
            Self::Bool => Value::Bool(false),
            Self::Text => Value::Text(String::new()),
            Self::Any | Self::Polymorphic(_) => Value::Null,
            Self::Reference(_) => Value::Reference(None),
            Self::Sequence(_) => Value::List(Vec::new()),
            Self::Object(name) => catalog
                .instantiate_in(name, visiting)
                .map_or(Value::Null, Value::Object),
            Self::Enum(name) => catalog
                .enum_schema(name)
                .map_or_else(|| Value::Text(String::new()), EnumSchema::default_value),
        }
    }
}

impl TryFrom<String> for FieldType {
    type Error = CoreError;

    fn try_from(text: String) -> CoreResult<Self> {
        Self::parse(&text)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int => f.write_str("int"),
            Self::Float => f.write_str("float"),
            Self::Bool => f.write_str("bool"),
            Self::Text => f.write_str("text"),
            Self::Any => f.write_str("any"),
            Self::Object(name) => f.write_str(name),
            Self::Sequence(inner) => write!(f, "[{inner}]"),
            Self::Polymorphic(base) => write!(f, "dyn {base}"),
            Self::Reference(target) => write!(f, "&{target}"),
            Self::Enum(name) => write!(f, "enum {name}"),
        }
    }
}

/// One declared field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldSchema {
    /// Field name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: FieldType,
    /// Declared annotations in declaration order.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
    /// Serialized but never shown.
    #[serde(default)]
    pub hidden: bool,
    /// Initial value of new instances.
    #[serde(default)]
    pub default: Option<Value>,
}

impl FieldSchema {
    /// Creates a plain field.
    #[must_use]
    pub fn new(name: impl Into<String>, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            ty,
            annotations: Vec::new(),
            hidden: false,
            default: None,
        }
    }

    /// Builder-style annotation.
    #[must_use]
    pub fn annotated(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }

    /// Builder-style hiding.
    #[must_use]
    pub const fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }
}

/// One declared method.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MethodSchema {
    /// Method name.
    pub name: String,
    /// Declared annotations.
    #[serde(default)]
    pub annotations: Vec<Annotation>,
}

/// Shape of one type.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct TypeSchema {
    /// Type name.
    pub name: String,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    /// Methods in declaration order.
    #[serde(default)]
    pub methods: Vec<MethodSchema>,
    /// Abstract types cannot be instantiated.
    #[serde(default, rename = "abstract")]
    pub is_abstract: bool,
    /// Base types and capabilities this type is assignable to.
    #[serde(default)]
    pub implements: Vec<String>,
    /// Internal to the host; never offered as a polymorphic candidate.
    #[serde(default)]
    pub host_reserved: bool,
}

impl TypeSchema {
    /// Creates an empty concrete type.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            methods: Vec::new(),
            is_abstract: false,
            implements: Vec::new(),
            host_reserved: false,
        }
    }

    /// Creates an abstract type.
    #[must_use]
    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self {
            is_abstract: true,
            ..Self::new(name)
        }
    }

    /// Builder-style field.
    #[must_use]
    pub fn field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Builder-style method.
    #[must_use]
    pub fn method(mut self, name: impl Into<String>, annotations: Vec<Annotation>) -> Self {
        self.methods.push(MethodSchema {
            name: name.into(),
            annotations,
        });
        self
    }

    /// Builder-style base type.
    #[must_use]
    pub fn implementing(mut self, base: impl Into<String>) -> Self {
        self.implements.push(base.into());
        self
    }

    /// Looks up a field by name.
    #[must_use]
    pub fn find_field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// A declared enumeration.
///
/// Plain enums store the active variant as text. Flag enums store the set of
/// active variants as a list of texts, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnumSchema {
    /// Enum name.
    pub name: String,
    /// Variants in declaration order.
    pub variants: Vec<String>,
    /// Any combination of variants may be active.
    #[serde(default)]
    pub flags: bool,
}

impl EnumSchema {
    /// Creates a plain enum.
    #[must_use]
    pub fn new(name: impl Into<String>, variants: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            variants: variants.into_iter().map(Into::into).collect(),
            flags: false,
        }
    }

    /// Builder-style flag marking.
    #[must_use]
    pub const fn flagged(mut self) -> Self {
        self.flags = true;
        self
    }

    /// First variant, or no flag set.
    #[must_use]
    pub fn default_value(&self) -> Value {
        if self.flags {
            Value::List(Vec::new())
        } else {
            Value::Text(self.variants.first().cloned().unwrap_or_default())
        }
    }

    /// Returns true if `variant` is active in `value`.
    #[must_use]
    pub fn is_active(&self, value: &Value, variant: &str) -> bool {
        match value {
            Value::Text(current) => current == variant,
            Value::List(items) => items.iter().any(|item| matches!(item, Value::Text(t) if t == variant)),
            _ => false,
        }
    }

    /// Value after the user picks `variant`: plain enums switch to it, flag
    /// enums toggle its membership.
    #[must_use]
    pub fn toggle(&self, value: &Value, variant: &str) -> Value {
        if !self.flags {
            return Value::Text(variant.to_string());
        }
        let flip = !self.is_active(value, variant);
        Value::List(
            self.variants
                .iter()
                .filter(|v| if v.as_str() == variant { flip } else { self.is_active(value, v) })
                .map(|v| Value::Text(v.clone()))
                .collect(),
        )
    }

    /// Returns true if every variant named by `value` is declared.
    #[must_use]
    pub fn conforms(&self, value: &Value) -> bool {
        let declared = |v: &Value| matches!(v, Value::Text(t) if self.variants.contains(t));
        match value {
            Value::Text(_) if !self.flags => declared(value),
            Value::List(items) if self.flags => items.iter().all(declared),
            _ => false,
        }
    }
}

/// All known types.
#[derive(Debug, Clone, Default)]
pub struct TypeCatalog {
    types: BTreeMap<String, TypeSchema>,
    enums: BTreeMap<String, EnumSchema>,
}

impl TypeCatalog {
    /// Creates an empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a type.
    pub fn insert(&mut self, schema: TypeSchema) {
        self.types.insert(schema.name.clone(), schema);
    }

    /// Builder-style insertion.
    #[must_use]
    pub fn with(mut self, schema: TypeSchema) -> Self {
        self.insert(schema);
        self
    }

    /// Adds or replaces an enumeration.
    pub fn insert_enum(&mut self, schema: EnumSchema) {
        self.enums.insert(schema.name.clone(), schema);
    }

    /// Builder-style enumeration.
    #[must_use]
    pub fn with_enum(mut self, schema: EnumSchema) -> Self {
        self.insert_enum(schema);
        self
    }

    /// Looks up an enumeration.
    #[must_use]
    pub fn enum_schema(&self, name: &str) -> Option<&EnumSchema> {
        self.enums.get(name)
    }

    /// Looks up a type.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeSchema> {
        self.types.get(name)
    }

    /// Returns true if the type is known.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    /// Number of types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns true if no type is known.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Returns true if `name` is `base` or transitively implements it.
    #[must_use]
    pub fn is_assignable(&self, name: &str, base: &str) -> bool {
        let mut seen = HashSet::new();
        let mut queue = VecDeque::from([name]);
        while let Some(current) = queue.pop_front() {
            if current == base {
                return true;
            }
            if !seen.insert(current) {
                continue;
            }
            if let Some(schema) = self.types.get(current) {
                queue.extend(schema.implements.iter().map(String::as_str));
            }
        }
        false
    }

    /// Concrete, non-reserved types assignable to `base`, sorted by name.
    #[must_use]
    pub fn candidates(&self, base: &str) -> Vec<String> {
        self.types
            .values()
            .filter(|t| !t.is_abstract && !t.host_reserved && self.is_assignable(&t.name, base))
            .map(|t| t.name.clone())
            .collect()
    }

    /// Builds a default instance of a concrete type.
    pub fn instantiate(&self, name: &str) -> CoreResult<ObjectValue> {
        self.instantiate_in(name, &mut HashSet::new())
    }

    fn instantiate_in(&self, name: &str, visiting: &mut HashSet<String>) -> CoreResult<ObjectValue> {
        let schema = self
            .types
            .get(name)
            .filter(|t| !t.is_abstract)
            .ok_or_else(|| CoreError::UnknownType(name.to_string()))?;
        // Self-referential object fields default to null.
        if !visiting.insert(name.to_string()) {
            return Err(CoreError::UnknownType(name.to_string()));
        }
        let mut object = ObjectValue::new(name);
        for field in &schema.fields {
            let value = match &field.default {
                Some(value) => value.clone(),
                None => field.ty.default_in(self, visiting),
            };
            object.fields.push((field.name.clone(), value));
        }
        visiting.remove(name);
        Ok(object)
    }

    /// Returns true if the type, or any type reachable through its fields,
    /// declares annotations on a field or method.
    #[must_use]
    pub fn type_uses_annotations(&self, name: &str) -> bool {
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([name.to_string()]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current.clone()) {
                continue;
            }
            let Some(schema) = self.types.get(&current) else {
                continue;
            };
            if schema.methods.iter().any(|m| !m.annotations.is_empty()) {
                return true;
            }
            for field in schema.fields.iter().filter(|f| !f.hidden) {
                if !field.annotations.is_empty() {
                    return true;
                }
                let mut ty = &field.ty;
                while let Some(inner) = ty.element() {
                    ty = inner;
                }
                match ty {
                    FieldType::Object(next) => queue.push_back(next.clone()),
                    FieldType::Polymorphic(base) => {
                        queue.push_back(base.clone());
                        queue.extend(self.candidates(base));
                    }
                    _ => {}
                }
            }
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> TypeCatalog {
        TypeCatalog::new()
            .with(TypeSchema::abstract_type("Shape"))
            .with(
                TypeSchema::new("Circle")
                    .implementing("Shape")
                    .field(FieldSchema::new("radius", FieldType::Float)),
            )
            .with(TypeSchema::new("Square").implementing("Shape"))
            .with(TypeSchema {
                host_reserved: true,
                ..TypeSchema::new("Internal").implementing("Shape")
            })
            .with(
                TypeSchema::new("Tree")
                    .field(FieldSchema::new("label", FieldType::Text))
                    .field(FieldSchema::new("next", FieldType::Object("Tree".into()))),
            )
    }

    #[test]
    fn test_parse_field_types() {
        assert_eq!(FieldType::parse("int").unwrap(), FieldType::Int);
        assert_eq!(
            FieldType::parse("[dyn Shape]").unwrap(),
            FieldType::Sequence(Box::new(FieldType::Polymorphic("Shape".into())))
        );
        assert_eq!(FieldType::parse("&Tree").unwrap().to_string(), "&Tree");
        assert!(FieldType::parse("").is_err());
    }

    #[test]
    fn test_enum_values() {
        let mode = EnumSchema::new("Mode", ["Walk", "Run"]);
        let catalog = TypeCatalog::new().with_enum(mode.clone());
        let ty = FieldType::parse("enum Mode").unwrap();
        assert_eq!(ty, FieldType::Enum("Mode".into()));
        assert_eq!(ty.to_string(), "enum Mode");
        assert_eq!(ty.default_value(&catalog), Value::from("Walk"));
        assert_eq!(mode.toggle(&Value::from("Walk"), "Run"), Value::from("Run"));
        assert!(mode.conforms(&Value::from("Run")));
        assert!(!mode.conforms(&Value::from("Fly")));

        let layers = EnumSchema::new("Layers", ["Ground", "Water", "Air"]).flagged();
        let both = layers.toggle(&layers.toggle(&layers.default_value(), "Air"), "Ground");
        assert_eq!(both, Value::List(vec![Value::from("Ground"), Value::from("Air")]));
        assert!(layers.is_active(&both, "Air"));
        assert_eq!(layers.toggle(&both, "Ground"), Value::List(vec![Value::from("Air")]));
        assert!(layers.conforms(&both));
    }

    #[test]
    fn test_candidates_skip_abstract_and_reserved() {
        assert_eq!(catalog().candidates("Shape"), vec!["Circle", "Square"]);
    }

    #[test]
    fn test_self_referential_instantiation_terminates() {
        let tree = catalog().instantiate("Tree").unwrap();
        assert_eq!(tree.get("label"), Some(&Value::Text(String::new())));
        assert_eq!(tree.get("next"), Some(&Value::Null));
    }

    #[test]
    fn test_annotation_reachability_with_cycles() {
        let mut catalog = catalog();
        assert!(!catalog.type_uses_annotations("Tree"));
        catalog.insert(TypeSchema::new("Square").implementing("Shape").field(
            FieldSchema::new("side", FieldType::Float).annotated(Annotation::ReadOnly),
        ));
        catalog.insert(
            TypeSchema::new("Holder").field(FieldSchema::new(
                "shapes",
                FieldType::Sequence(Box::new(FieldType::Polymorphic("Shape".into()))),
            )),
        );
        assert!(catalog.type_uses_annotations("Holder"));
    }
}
