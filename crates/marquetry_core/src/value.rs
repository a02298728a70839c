//! Runtime values stored in an object graph.

use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::node::ObjectId;

/// Key carrying the concrete type of an object value in documents.
pub const TYPE_KEY: &str = "$type";

/// Key carrying an object reference in documents.
pub const REF_KEY: &str = "$ref";

/// A runtime value.
///
/// Values deserialize from TOML/JSON literals: tables become objects
/// (`$type` names the concrete type) and `{ "$ref" = n }` becomes a reference.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(from = "Literal")]
pub enum Value {
    /// Unset.
    #[default]
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Int(i64),
    /// Floating point.
    Float(f64),
    /// Text.
    Text(String),
    /// Ordered sequence.
    List(Vec<Value>),
    /// Nested object with a concrete type.
    Object(ObjectValue),
    /// Reference to another root object.
    Reference(Option<ObjectId>),
}

/// A nested object value.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ObjectValue {
    /// Concrete type name.
    pub type_name: String,
    /// Field values in declaration order.
    pub fields: Vec<(String, Value)>,
}

impl ObjectValue {
    /// Creates an empty object of the given type.
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            fields: Vec::new(),
        }
    }

    /// Builder-style field insertion.
    #[must_use]
    pub fn with(mut self, name: &str, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Returns a field value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Returns a mutable field value.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut Value> {
        self.fields.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Sets or appends a field value.
    pub fn set(&mut self, name: &str, value: Value) {
        if let Some(slot) = self.get_mut(name) {
            *slot = value;
        } else {
            self.fields.push((name.to_string(), value));
        }
    }
}

impl Value {
    /// Returns true for `Null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns true if the value equals its type's default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        match self {
            Self::Null | Self::Reference(None) | Self::Bool(false) | Self::Int(0) => true,
            Self::Float(f) => *f == 0.0,
            Self::Text(s) => s.is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Bool(true) | Self::Int(_) | Self::Object(_) | Self::Reference(Some(_)) => false,
        }
    }

    /// Short name of the value's variant.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
            Self::List(_) => "list",
            Self::Object(_) => "object",
            Self::Reference(_) => "reference",
        }
    }

    /// Returns the boolean, if this is one.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the value as a float, converting integers.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the text, if this is text.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the object, if this is one.
    #[must_use]
    pub const fn as_object(&self) -> Option<&ObjectValue> {
        match self {
            Self::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Concrete type name of an object value.
    #[must_use]
    pub fn object_type(&self) -> Option<&str> {
        self.as_object().map(|o| o.type_name.as_str())
    }

    /// Equality used for condition matching.
    ///
    /// Same variants compare structurally, different variants compare their
    /// display strings, and null only equals null.
    #[must_use]
    pub fn loosely_equals(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Null, _) | (_, Self::Null) => false,
            _ if std::mem::discriminant(self) == std::mem::discriminant(other) => self == other,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::Text(s) => f.write_str(s),
            Self::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Self::Object(o) => f.write_str(&o.type_name),
            Self::Reference(Some(id)) => write!(f, "{id}"),
            Self::Reference(None) => f.write_str("None"),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Self::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<ObjectValue> for Value {
    fn from(o: ObjectValue) -> Self {
        Self::Object(o)
    }
}

/// Document literal shape used for deserialization.
#[derive(Deserialize)]
#[serde(untagged)]
enum Literal {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    List(Vec<Literal>),
    Table(BTreeMap<String, Literal>),
}

impl From<Literal> for Value {
    fn from(literal: Literal) -> Self {
        match literal {
            Literal::Bool(b) => Self::Bool(b),
            Literal::Int(i) => Self::Int(i),
            Literal::Float(x) => Self::Float(x),
            Literal::Text(s) => Self::Text(s),
            Literal::List(items) => Self::List(items.into_iter().map(Self::from).collect()),
            Literal::Table(mut table) => {
                if let Some(Literal::Int(id)) = table.remove(REF_KEY) {
                    return Self::Reference(u64::try_from(id).ok().map(ObjectId));
                }
                let type_name = match table.remove(TYPE_KEY) {
                    Some(Literal::Text(name)) => name,
                    _ => String::new(),
                };
                Self::Object(ObjectValue {
                    type_name,
                    fields: table
                        .into_iter()
                        .map(|(name, literal)| (name, Self::from(literal)))
                        .collect(),
                })
            }
        }
    }
}
