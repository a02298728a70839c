//! # Data Nodes
//!
//! Transient handles to one addressable location inside an object graph.
//! Nodes are cheap to clone; identity is the owning object plus the path.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use crate::annotation::{Annotation, AnnotationKind};
use crate::path::PropertyPath;
use crate::schema::FieldType;

/// Identifier of a root object in a graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u64);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Structural category of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Scalar value.
    Leaf,
    /// Nested object with a concrete type.
    Object,
    /// Ordered sequence.
    Sequence,
    /// Slot of an abstract type.
    Polymorphic,
    /// Reference to another root object.
    Reference,
}

/// One addressable location in an object graph.
#[derive(Clone)]
pub struct DataNode {
    owner: ObjectId,
    path: PropertyPath,
    display_name: String,
    field_type: FieldType,
    annotations: Arc<[Annotation]>,
    has_visible_children: bool,
}

impl DataNode {
    /// Creates a node.
    #[must_use]
    pub fn new(
        owner: ObjectId,
        path: PropertyPath,
        display_name: impl Into<String>,
        field_type: FieldType,
        annotations: impl Into<Arc<[Annotation]>>,
        has_visible_children: bool,
    ) -> Self {
        Self {
            owner,
            path,
            display_name: display_name.into(),
            field_type,
            annotations: annotations.into(),
            has_visible_children,
        }
    }

    /// Owning root object.
    #[must_use]
    pub const fn owner(&self) -> ObjectId {
        self.owner
    }

    /// Path from the owner.
    #[must_use]
    pub const fn path(&self) -> &PropertyPath {
        &self.path
    }

    /// Label shown next to the editor.
    #[must_use]
    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    /// Declared static type.
    #[must_use]
    pub const fn field_type(&self) -> &FieldType {
        &self.field_type
    }

    /// Declared type name used for ignore-list matching.
    #[must_use]
    pub fn type_name(&self) -> String {
        self.field_type.type_name()
    }

    /// Structural category derived from the declared type.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        match self.field_type {
            FieldType::Object(_) => NodeKind::Object,
            FieldType::Sequence(_) => NodeKind::Sequence,
            FieldType::Polymorphic(_) => NodeKind::Polymorphic,
            FieldType::Reference(_) => NodeKind::Reference,
            FieldType::Int
            | FieldType::Float
            | FieldType::Bool
            | FieldType::Text
            | FieldType::Any
            | FieldType::Enum(_) => NodeKind::Leaf,
        }
    }

    /// Returns true for sequences.
    #[must_use]
    pub const fn is_sequence(&self) -> bool {
        matches!(self.kind(), NodeKind::Sequence)
    }

    /// Returns true for polymorphic slots.
    #[must_use]
    pub const fn is_polymorphic(&self) -> bool {
        matches!(self.kind(), NodeKind::Polymorphic)
    }

    /// Declared annotations.
    #[must_use]
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }

    /// Returns true if an annotation of `kind` is declared.
    #[must_use]
    pub fn has_annotation(&self, kind: &AnnotationKind) -> bool {
        self.annotations.iter().any(|a| &a.kind() == kind)
    }

    /// Returns true if the node has children worth showing.
    #[must_use]
    pub const fn has_visible_children(&self) -> bool {
        self.has_visible_children
    }

    /// Same location carrying a different annotation set.
    #[must_use]
    pub fn with_annotations(&self, annotations: impl Into<Arc<[Annotation]>>) -> Self {
        Self {
            annotations: annotations.into(),
            ..self.clone()
        }
    }
}

impl PartialEq for DataNode {
    fn eq(&self, other: &Self) -> bool {
        self.owner == other.owner && self.path == other.path
    }
}

impl Eq for DataNode {}

impl Hash for DataNode {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.owner.hash(state);
        self.path.hash(state);
    }
}

impl fmt::Debug for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataNode")
            .field("owner", &self.owner)
            .field("path", &self.path.to_string())
            .field("type", &self.field_type.to_string())
            .field("annotations", &self.annotations.len())
            .finish()
    }
}

impl fmt::Display for DataNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.owner, self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_ignores_annotations() {
        let path = PropertyPath::parse("stats.speed");
        let plain = DataNode::new(ObjectId(1), path.clone(), "Speed", FieldType::Int, Vec::<Annotation>::new(), false);
        let annotated = plain.with_annotations(vec![Annotation::ReadOnly]);
        assert_eq!(plain, annotated);
        assert!(annotated.has_annotation(&crate::annotation::kinds::READ_ONLY));
        let other = DataNode::new(ObjectId(2), path, "Speed", FieldType::Int, Vec::<Annotation>::new(), false);
        assert_ne!(plain, other);
    }

    #[test]
    fn test_kind_from_declared_type() {
        let node = DataNode::new(
            ObjectId(1),
            PropertyPath::parse("slot"),
            "Slot",
            FieldType::Polymorphic("Shape".into()),
            Vec::<Annotation>::new(),
            true,
        );
        assert!(node.is_polymorphic());
        assert_eq!(node.type_name(), "Shape");
    }
}
