//! # In-Memory Object Graph
//!
//! Reference [`ObjectGraph`] over [`TypeCatalog`] schemas and [`Value`] trees.
//! Used by the inspector binary, the document loader and the test suites.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use crate::annotation::Annotation;
use crate::error::{CoreError, CoreResult};
use crate::graph::{MemberValue, MethodInfo, ObjectGraph};
use crate::node::{DataNode, ObjectId};
use crate::path::{PathSegment, PropertyPath};
use crate::schema::{EnumSchema, FieldType, TypeCatalog};
use crate::value::{ObjectValue, Value, TYPE_KEY};

/// Computed member: derives a value from its object.
pub type ComputedFn = Arc<dyn Fn(&ObjectValue) -> Value>;

/// Named predicate called with a field value.
pub type PredicateFn = Arc<dyn Fn(&Value) -> bool>;

/// Method body mutating its object.
pub type MethodFn = Arc<dyn Fn(&mut ObjectValue) -> Result<(), String>>;

struct RootObject {
    name: String,
    value: Value,
}

type UndoStep = Vec<(ObjectId, Value)>;

/// In-memory object graph.
pub struct MemoryGraph {
    catalog: Arc<TypeCatalog>,
    objects: BTreeMap<ObjectId, RootObject>,
    next_id: u64,
    computed: HashMap<(String, String), ComputedFn>,
    predicates: HashMap<(String, String), PredicateFn>,
    method_bodies: HashMap<(String, String), MethodFn>,
    transaction: Option<UndoStep>,
    undo_stack: Vec<UndoStep>,
}

impl MemoryGraph {
    /// Creates an empty graph over a catalog.
    #[must_use]
    pub fn new(catalog: TypeCatalog) -> Self {
        Self {
            catalog: Arc::new(catalog),
            objects: BTreeMap::new(),
            next_id: 1,
            computed: HashMap::new(),
            predicates: HashMap::new(),
            method_bodies: HashMap::new(),
            transaction: None,
            undo_stack: Vec::new(),
        }
    }

    /// Type catalog.
    #[must_use]
    pub fn catalog(&self) -> &TypeCatalog {
        &self.catalog
    }

    /// Adds a root object.
    pub fn add_root(&mut self, name: impl Into<String>, object: ObjectValue) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(
            id,
            RootObject {
                name: name.into(),
                value: Value::Object(object),
            },
        );
        id
    }

    /// Adds a default instance of a type as a root object.
    pub fn spawn(&mut self, name: impl Into<String>, type_name: &str) -> CoreResult<ObjectId> {
        let object = self.catalog.instantiate(type_name)?;
        Ok(self.add_root(name, object))
    }

    /// Registers a computed member on a type.
    pub fn register_computed(
        &mut self,
        type_name: &str,
        member: &str,
        compute: impl Fn(&ObjectValue) -> Value + 'static,
    ) {
        self.computed
            .insert((type_name.to_string(), member.to_string()), Arc::new(compute));
    }

    /// Registers a named predicate on a type.
    pub fn register_predicate(
        &mut self,
        type_name: &str,
        name: &str,
        predicate: impl Fn(&Value) -> bool + 'static,
    ) {
        self.predicates
            .insert((type_name.to_string(), name.to_string()), Arc::new(predicate));
    }

    /// Registers the body of a declared method.
    pub fn register_method(
        &mut self,
        type_name: &str,
        name: &str,
        body: impl Fn(&mut ObjectValue) -> Result<(), String> + 'static,
    ) {
        self.method_bodies
            .insert((type_name.to_string(), name.to_string()), Arc::new(body));
    }

    fn root_value(&self, owner: ObjectId) -> CoreResult<&Value> {
        self.objects
            .get(&owner)
            .map(|root| &root.value)
            .ok_or(CoreError::DeadObject(owner))
    }

    fn lookup<'a>(value: &'a Value, segments: &[PathSegment]) -> Option<&'a Value> {
        segments
            .iter()
            .try_fold(value, |current, segment| match (current, segment) {
                (Value::Object(object), PathSegment::Field(name)) => object.get(name),
                (Value::List(items), PathSegment::Index(index)) => items.get(*index),
                _ => None,
            })
    }

    fn lookup_mut<'a>(mut value: &'a mut Value, segments: &[PathSegment]) -> Option<&'a mut Value> {
        for segment in segments {
            value = match (value, segment) {
                (Value::Object(object), PathSegment::Field(name)) => object.get_mut(name)?,
                (Value::List(items), PathSegment::Index(index)) => items.get_mut(*index)?,
                _ => return None,
            };
        }
        Some(value)
    }

    fn is_discriminator(path: &PropertyPath) -> bool {
        matches!(path.last(), Some(PathSegment::Field(name)) if name == TYPE_KEY)
    }

    fn read(&self, owner: ObjectId, path: &PropertyPath) -> CoreResult<Value> {
        let root = self.root_value(owner)?;
        let not_found = || CoreError::PathNotFound {
            owner,
            path: path.clone(),
        };
        if Self::is_discriminator(path) {
            let parent = path.parent().ok_or_else(not_found)?;
            let slot = Self::lookup(root, parent.segments()).ok_or_else(not_found)?;
            return Ok(slot.object_type().map_or(Value::Null, Value::from));
        }
        Self::lookup(root, path.segments()).cloned().ok_or_else(not_found)
    }

    /// Records the owner's pre-image once per transaction.
    fn record(&mut self, owner: ObjectId) -> CoreResult<()> {
        let before = self.root_value(owner)?.clone();
        if let Some(step) = self.transaction.as_mut() {
            if !step.iter().any(|(id, _)| *id == owner) {
                step.push((owner, before));
            }
        }
        Ok(())
    }

    /// Runs a mutation inside the open transaction or a fresh one.
    fn mutate<R>(
        &mut self,
        owner: ObjectId,
        apply: impl FnOnce(&mut Self) -> CoreResult<R>,
    ) -> CoreResult<R> {
        let implicit = self.transaction.is_none();
        if implicit {
            self.begin_transaction();
        }
        let result = self.record(owner).and_then(|()| apply(self));
        if implicit {
            if result.is_ok() {
                self.commit()?;
            } else {
                self.transaction = None;
            }
        }
        result
    }

    fn slot_mut(&mut self, owner: ObjectId, path: &PropertyPath) -> CoreResult<&mut Value> {
        let root = &mut self
            .objects
            .get_mut(&owner)
            .ok_or(CoreError::DeadObject(owner))?
            .value;
        Self::lookup_mut(root, path.segments()).ok_or_else(|| CoreError::PathNotFound {
            owner,
            path: path.clone(),
        })
    }

    fn sequence_mut(&mut self, sequence: &DataNode) -> CoreResult<&mut Vec<Value>> {
        match self.slot_mut(sequence.owner(), sequence.path())? {
            Value::List(items) => Ok(items),
            _ => Err(CoreError::NotASequence(sequence.path().clone())),
        }
    }

    fn has_fields(&self, ty: &FieldType, value: Option<&Value>) -> bool {
        match ty {
            FieldType::Sequence(_) | FieldType::Polymorphic(_) => true,
            FieldType::Object(name) => match self.catalog.get(name) {
                Some(schema) => schema.fields.iter().any(|f| !f.hidden),
                None => value
                    .and_then(Value::as_object)
                    .is_some_and(|o| !o.fields.is_empty()),
            },
            _ => false,
        }
    }

    /// Builds the node of one field of `object` at `parent`.
    fn field_node(
        &self,
        owner: ObjectId,
        parent: &PropertyPath,
        object: &ObjectValue,
        name: &str,
    ) -> Option<DataNode> {
        let schema = self.catalog.get(&object.type_name);
        let (ty, annotations): (FieldType, Vec<Annotation>) =
            match schema.and_then(|s| s.find_field(name)) {
                Some(field) => (field.ty.clone(), field.annotations.clone()),
                None => (FieldType::infer(object.get(name)?), Vec::new()),
            };
        let has_children = self.has_fields(&ty, object.get(name));
        Some(DataNode::new(
            owner,
            parent.field(name),
            display_name(name),
            ty,
            annotations,
            has_children,
        ))
    }

    fn object_children(
        &self,
        owner: ObjectId,
        path: &PropertyPath,
        object: &ObjectValue,
    ) -> Vec<DataNode> {
        match self.catalog.get(&object.type_name) {
            Some(schema) => schema
                .fields
                .iter()
                .filter(|f| !f.hidden)
                .filter_map(|f| self.field_node(owner, path, object, &f.name))
                .collect(),
            None => object
                .fields
                .iter()
                .filter_map(|(name, _)| self.field_node(owner, path, object, name))
                .collect(),
        }
    }

    /// Nearest enclosing object of `path`, excluding `path` itself.
    fn enclosing_object(&self, owner: ObjectId, path: &PropertyPath) -> Option<ObjectValue> {
        let root = self.root_value(owner).ok()?;
        let mut scope = path.parent()?;
        loop {
            if let Some(Value::Object(object)) = Self::lookup(root, scope.segments()) {
                return Some(object.clone());
            }
            scope = scope.parent()?;
        }
    }

    fn enclosing_path(&self, owner: ObjectId, path: &PropertyPath) -> Option<PropertyPath> {
        let root = self.root_value(owner).ok()?;
        let mut scope = path.parent()?;
        loop {
            if matches!(Self::lookup(root, scope.segments()), Some(Value::Object(_))) {
                return Some(scope);
            }
            scope = scope.parent()?;
        }
    }

    fn invoke_at(&mut self, owner: ObjectId, path: PropertyPath, method: &str) -> CoreResult<()> {
        let type_name = self
            .read(owner, &path)?
            .object_type()
            .unwrap_or_default()
            .to_string();
        let body = self
            .method_bodies
            .get(&(type_name.clone(), method.to_string()))
            .cloned()
            .ok_or_else(|| CoreError::MethodNotFound {
                type_name,
                method: method.to_string(),
            })?;
        self.mutate(owner, move |graph| match graph.slot_mut(owner, &path)? {
            Value::Object(object) => body(object).map_err(|reason| CoreError::MethodFailed {
                method: method.to_string(),
                reason,
            }),
            _ => Err(CoreError::PathNotFound { owner, path }),
        })
    }
}

/// `max_speed` becomes `Max Speed`.
fn display_name(field: &str) -> String {
    field
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect::<String>()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}

impl ObjectGraph for MemoryGraph {
    fn roots(&self) -> Vec<ObjectId> {
        self.objects.keys().copied().collect()
    }

    fn is_alive(&self, owner: ObjectId) -> bool {
        self.objects.contains_key(&owner)
    }

    fn root(&self, owner: ObjectId) -> CoreResult<DataNode> {
        let root = self.objects.get(&owner).ok_or(CoreError::DeadObject(owner))?;
        let type_name = root.value.object_type().unwrap_or_default().to_string();
        let ty = FieldType::Object(type_name);
        let has_children = self.has_fields(&ty, Some(&root.value));
        Ok(DataNode::new(
            owner,
            PropertyPath::root(),
            root.name.clone(),
            ty,
            Vec::<Annotation>::new(),
            has_children,
        ))
    }

    fn visible_children(&self, node: &DataNode) -> CoreResult<Vec<DataNode>> {
        if Self::is_discriminator(node.path()) {
            return Ok(Vec::new());
        }
        let owner = node.owner();
        let value = self.read(owner, node.path())?;
        let path = node.path();
        Ok(match (node.field_type(), &value) {
            (FieldType::Sequence(element), Value::List(items)) => items
                .iter()
                .enumerate()
                .map(|(index, item)| {
                    DataNode::new(
                        owner,
                        path.index(index),
                        format!("Element {index}"),
                        (**element).clone(),
                        Vec::<Annotation>::new(),
                        self.has_fields(element, Some(item)),
                    )
                })
                .collect(),
            (FieldType::Polymorphic(_), _) => {
                let mut children = vec![DataNode::new(
                    owner,
                    path.field(TYPE_KEY),
                    TYPE_KEY,
                    FieldType::Text,
                    Vec::<Annotation>::new(),
                    false,
                )];
                if let Value::Object(object) = &value {
                    children.extend(self.object_children(owner, path, object));
                }
                children
            }
            (FieldType::Object(_), Value::Object(object)) => self.object_children(owner, path, object),
            _ => Vec::new(),
        })
    }

    fn value(&self, node: &DataNode) -> CoreResult<Value> {
        self.read(node.owner(), node.path())
    }

    #[allow(clippy::cast_precision_loss)]
    fn set_value(&mut self, node: &DataNode, value: Value) -> CoreResult<()> {
        let ty = node.field_type();
        let type_mismatch = || CoreError::TypeMismatch {
            path: node.path().clone(),
            expected: ty.to_string(),
            found: value.kind_name().to_string(),
        };
        if Self::is_discriminator(node.path()) || !ty.accepts(&value) {
            return Err(type_mismatch());
        }
        if let (FieldType::Polymorphic(base), Some(concrete)) = (ty, value.object_type()) {
            if !self.catalog.is_assignable(concrete, base) {
                return Err(type_mismatch());
            }
        }
        let value = match (ty, value) {
            (FieldType::Float, Value::Int(i)) => Value::Float(i as f64),
            (_, value) => value,
        };
        let (owner, path) = (node.owner(), node.path().clone());
        self.mutate(owner, move |graph| {
            *graph.slot_mut(owner, &path)? = value;
            Ok(())
        })
    }

    fn begin_transaction(&mut self) {
        if self.transaction.is_none() {
            self.transaction = Some(Vec::new());
        }
    }

    fn commit(&mut self) -> CoreResult<()> {
        let step = self.transaction.take().ok_or(CoreError::NoTransaction)?;
        if !step.is_empty() {
            self.undo_stack.push(step);
        }
        Ok(())
    }

    fn undo(&mut self) -> Vec<ObjectId> {
        let Some(step) = self.undo_stack.pop() else {
            return Vec::new();
        };
        let mut touched = Vec::with_capacity(step.len());
        for (owner, before) in step {
            if let Some(root) = self.objects.get_mut(&owner) {
                root.value = before;
                touched.push(owner);
            }
        }
        tracing::debug!(?touched, "undo");
        touched
    }

    fn resolve_member(&self, scope: &DataNode, name: &str) -> Option<MemberValue> {
        let owner = scope.owner();
        let object_path = self.enclosing_path(owner, scope.path())?;
        let object = self.enclosing_object(owner, scope.path())?;
        if let Some(value) = object.get(name) {
            return Some(MemberValue {
                value: value.clone(),
                observable: true,
                node: self.field_node(owner, &object_path, &object, name),
            });
        }
        let compute = self
            .computed
            .get(&(object.type_name.clone(), name.to_string()))?;
        Some(MemberValue {
            value: compute(&object),
            observable: false,
            node: None,
        })
    }

    fn call_predicate(&self, scope: &DataNode, name: &str, argument: &Value) -> Option<bool> {
        let object = self.enclosing_object(scope.owner(), scope.path())?;
        let predicate = self.predicates.get(&(object.type_name, name.to_string()))?;
        Some(predicate(argument))
    }

    fn methods(&self, node: &DataNode) -> Vec<MethodInfo> {
        let Ok(Value::Object(object)) = self.read(node.owner(), node.path()) else {
            return Vec::new();
        };
        self.catalog
            .get(&object.type_name)
            .map(|schema| {
                schema
                    .methods
                    .iter()
                    .map(|m| MethodInfo {
                        name: m.name.clone(),
                        annotations: m.annotations.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn invoke(&mut self, node: &DataNode, method: &str) -> CoreResult<()> {
        self.invoke_at(node.owner(), node.path().clone(), method)
    }

    fn invoke_in_scope(&mut self, scope: &DataNode, method: &str) -> CoreResult<()> {
        let owner = scope.owner();
        let path = self
            .enclosing_path(owner, scope.path())
            .ok_or_else(|| CoreError::PathNotFound {
                owner,
                path: scope.path().clone(),
            })?;
        self.invoke_at(owner, path, method)
    }

    fn enum_schema(&self, name: &str) -> Option<EnumSchema> {
        self.catalog.enum_schema(name).cloned()
    }

    fn polymorphic_candidates(&self, base: &str) -> Vec<String> {
        self.catalog.candidates(base)
    }

    fn instantiate(&self, type_name: &str) -> CoreResult<Value> {
        self.catalog.instantiate(type_name).map(Value::Object)
    }

    fn type_uses_annotations(&self, type_name: &str) -> bool {
        self.catalog.type_uses_annotations(type_name)
    }

    fn insert_element(&mut self, sequence: &DataNode, index: usize, value: Option<Value>) -> CoreResult<()> {
        let element = sequence
            .field_type()
            .element()
            .ok_or_else(|| CoreError::NotASequence(sequence.path().clone()))?;
        let value = value.unwrap_or_else(|| element.default_value(&self.catalog));
        self.mutate(sequence.owner(), |graph| {
            let items = graph.sequence_mut(sequence)?;
            if index > items.len() {
                return Err(CoreError::IndexOutOfRange {
                    path: sequence.path().clone(),
                    index,
                    len: items.len(),
                });
            }
            items.insert(index, value);
            Ok(())
        })
    }

    fn remove_element(&mut self, sequence: &DataNode, index: usize) -> CoreResult<()> {
        self.mutate(sequence.owner(), |graph| {
            let items = graph.sequence_mut(sequence)?;
            if index >= items.len() {
                return Err(CoreError::IndexOutOfRange {
                    path: sequence.path().clone(),
                    index,
                    len: items.len(),
                });
            }
            items.remove(index);
            Ok(())
        })
    }

    fn move_element(&mut self, sequence: &DataNode, from: usize, to: usize) -> CoreResult<()> {
        self.mutate(sequence.owner(), |graph| {
            let items = graph.sequence_mut(sequence)?;
            let len = items.len();
            if let Some(index) = [from, to].into_iter().find(|i| *i >= len) {
                return Err(CoreError::IndexOutOfRange {
                    path: sequence.path().clone(),
                    index,
                    len,
                });
            }
            let item = items.remove(from);
            items.insert(to, item);
            Ok(())
        })
    }

    fn location_name(&self, owner: ObjectId) -> String {
        self.objects
            .get(&owner)
            .map_or_else(|| owner.to_string(), |root| root.name.clone())
    }

    fn type_known(&self, owner: ObjectId) -> bool {
        self.objects
            .get(&owner)
            .and_then(|root| root.value.object_type())
            .is_some_and(|name| self.catalog.contains(name))
    }

    fn destroy(&mut self, owner: ObjectId) -> bool {
        self.objects.remove(&owner).is_some()
    }
}
