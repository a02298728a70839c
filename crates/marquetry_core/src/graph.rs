//! # Object Graph Accessor
//!
//! The narrow interface through which composition and validation read and
//! mutate a host's data. Hosts implement [`ObjectGraph`]; [`crate::MemoryGraph`]
//! is the in-process reference implementation.

use crate::annotation::Annotation;
use crate::error::CoreResult;
use crate::node::{DataNode, ObjectId};
use crate::schema::EnumSchema;
use crate::value::Value;

/// A method declared on a node's runtime type.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodInfo {
    /// Method name.
    pub name: String,
    /// Declared annotations.
    pub annotations: Vec<Annotation>,
}

/// A member resolved by name from a node's scope.
#[derive(Debug, Clone)]
pub struct MemberValue {
    /// Current value.
    pub value: Value,
    /// True for stored fields whose changes can be watched.
    pub observable: bool,
    /// Node of the member when it is a stored field.
    pub node: Option<DataNode>,
}

/// Host object graph accessor.
///
/// All calls happen on the host's main thread. Writes made between
/// [`ObjectGraph::begin_transaction`] and [`ObjectGraph::commit`] form one
/// undo step; writes outside a transaction form a step each.
pub trait ObjectGraph {
    /// Root objects in creation order.
    fn roots(&self) -> Vec<ObjectId>;

    /// Returns true while the object exists.
    fn is_alive(&self, owner: ObjectId) -> bool;

    /// Node for the root object itself.
    fn root(&self, owner: ObjectId) -> CoreResult<DataNode>;

    /// Children of a node that are shown to users.
    fn visible_children(&self, node: &DataNode) -> CoreResult<Vec<DataNode>>;

    /// Current value at the node.
    fn value(&self, node: &DataNode) -> CoreResult<Value>;

    /// Replaces the value at the node.
    fn set_value(&mut self, node: &DataNode, value: Value) -> CoreResult<()>;

    /// Opens a mutation transaction. Nested calls join the open one.
    fn begin_transaction(&mut self);

    /// Commits the open transaction as one undo step.
    fn commit(&mut self) -> CoreResult<()>;

    /// Reverts the last undo step, returning the owners it touched.
    fn undo(&mut self) -> Vec<ObjectId>;

    /// Resolves a member by name in the object scope enclosing `scope`.
    ///
    /// Stored fields are observable; computed members are not.
    fn resolve_member(&self, scope: &DataNode, name: &str) -> Option<MemberValue>;

    /// Calls a named predicate of the scope enclosing `scope`.
    fn call_predicate(&self, scope: &DataNode, name: &str, argument: &Value) -> Option<bool>;

    /// Methods of the node's runtime type.
    fn methods(&self, node: &DataNode) -> Vec<MethodInfo>;

    /// Invokes a method on the object at the node.
    fn invoke(&mut self, node: &DataNode, method: &str) -> CoreResult<()>;

    /// Invokes a method of the object scope enclosing `scope`.
    fn invoke_in_scope(&mut self, scope: &DataNode, method: &str) -> CoreResult<()>;

    /// Declared enumeration by name.
    fn enum_schema(&self, _name: &str) -> Option<EnumSchema> {
        None
    }

    /// Concrete types assignable to `base`, sorted by name.
    fn polymorphic_candidates(&self, base: &str) -> Vec<String>;

    /// Default instance of a concrete type.
    fn instantiate(&self, type_name: &str) -> CoreResult<Value>;

    /// Returns true if the type or anything reachable from it is annotated.
    fn type_uses_annotations(&self, type_name: &str) -> bool;

    /// Inserts an element; `None` inserts the element type's default.
    fn insert_element(&mut self, sequence: &DataNode, index: usize, value: Option<Value>) -> CoreResult<()>;

    /// Removes an element.
    fn remove_element(&mut self, sequence: &DataNode, index: usize) -> CoreResult<()>;

    /// Moves an element to a new position.
    fn move_element(&mut self, sequence: &DataNode, from: usize, to: usize) -> CoreResult<()>;

    /// Label used in diagnostics for the owner.
    fn location_name(&self, owner: ObjectId) -> String;

    /// Returns false when the owner's type has no known schema.
    fn type_known(&self, owner: ObjectId) -> bool;

    /// Destroys a root object. Hosts without removal return false.
    fn destroy(&mut self, _owner: ObjectId) -> bool {
        false
    }
}
