//! `min_value` and `max_value`: keep a numeric field inside a bound.

use marquetry_core::annotation::kinds;
use marquetry_core::{AnnotationKind, DataNode, FieldType, GraphHandle, Value};
use marquetry_ui::UiNodeId;

use crate::composer::NodeComposer;
use crate::decorator::Decorator;
use crate::decorators::{not_applicable, Tracker};
use crate::error::DecoratorResult;

/// One side of a numeric range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Bound {
    /// Inclusive lower bound.
    Min(f64),
    /// Inclusive upper bound.
    Max(f64),
}

impl Bound {
    /// Clamps a value. `None` if it already satisfies the bound or is not
    /// numeric.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
    pub fn clamp(self, value: &Value) -> Option<Value> {
        match (self, value) {
            (Self::Min(min), Value::Int(v)) if (*v as f64) < min => Some(Value::Int(min.ceil() as i64)),
            (Self::Max(max), Value::Int(v)) if (*v as f64) > max => Some(Value::Int(max.floor() as i64)),
            (Self::Min(min), Value::Float(v)) if *v < min => Some(Value::Float(min)),
            (Self::Max(max), Value::Float(v)) if *v > max => Some(Value::Float(max)),
            _ => None,
        }
    }
}

/// Writes the bound back whenever the field leaves it.
pub struct ClampDecorator {
    bound: Bound,
    tracker: Tracker,
}

impl ClampDecorator {
    /// Creates the decorator.
    #[must_use]
    pub fn new(bound: Bound) -> Self {
        Self {
            bound,
            tracker: Tracker::default(),
        }
    }
}

fn enforce(graph: &GraphHandle, node: &DataNode, bound: Bound) {
    let Ok(value) = graph.value(node) else {
        return;
    };
    if let Some(clamped) = bound.clamp(&value) {
        tracing::debug!(node = %node, from = ?value, to = ?clamped, "value clamped");
        if let Err(err) = graph.write(node, clamped) {
            tracing::warn!(node = %node, error = %err, "clamp write failed");
        }
    }
}

impl Decorator for ClampDecorator {
    fn kind(&self) -> AnnotationKind {
        match self.bound {
            Bound::Min(_) => kinds::MIN_VALUE,
            Bound::Max(_) => kinds::MAX_VALUE,
        }
    }

    fn on_bound(&mut self, composer: &NodeComposer, node: &DataNode, _editor: UiNodeId) -> DecoratorResult<()> {
        if !matches!(node.field_type(), FieldType::Int | FieldType::Float) {
            return Err(not_applicable(self.kind(), node));
        }
        enforce(composer.graph(), node, self.bound);
        let graph = composer.graph().downgrade();
        let target = node.clone();
        let bound = self.bound;
        self.tracker.watch(composer, node, move || {
            if let Some(graph) = graph.upgrade() {
                enforce(&graph, &target, bound);
            }
        });
        Ok(())
    }

    fn release(&mut self) {
        self.tracker.release();
    }
}
