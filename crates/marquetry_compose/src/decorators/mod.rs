//! # Built-in Decorators
//!
//! | Kind | Stages |
//! |------|--------|
//! | `required`, `validate_input`, `validate_json` | pre, bound, check |
//! | `enable_if` | wrap, bound, gate |
//! | `space` | wrap |
//! | `title`, `info_box` | pre |
//! | `conditional_info_box` | pre, bound |
//! | `read_only`, `tooltip`, `label_width` | bound |
//! | `inline_property` | replace |
//! | `box_group`, `foldout_group` | wrap |
//! | `min_value`, `max_value` | bound |
//! | `on_value_changed` | bound |
//! | `value_dropdown`, `enum_toggle` | replace, bound |

pub mod callbacks;
pub mod choices;
pub mod clamp;
pub mod enable_if;
pub mod group;
pub mod inline;
pub mod layout;
pub mod validators;

use marquetry_core::annotation::kinds;
use marquetry_core::{Annotation, AnnotationKind, DataNode, GraphHandle, Subscription, TimerGuard, Value};

use crate::composer::NodeComposer;
use crate::decorator::Decorator;
use crate::error::DecoratorError;
use crate::registry::DecoratorRegistry;

pub use callbacks::OnValueChangedDecorator;
pub use choices::{EnumToggleDecorator, ValueDropdownDecorator};
pub use clamp::{Bound, ClampDecorator};
pub use enable_if::EnableIfDecorator;
pub use group::{GroupDecorator, GroupStyle};
pub use inline::InlinePropertyDecorator;
pub use layout::{
    ConditionalInfoBoxDecorator, InfoBoxDecorator, LabelWidthDecorator, ReadOnlyDecorator, SpaceDecorator,
    TitleDecorator, TooltipDecorator,
};
pub use validators::{ValidationRule, ValidatorDecorator};

/// Ticks between re-evaluations of a member that cannot be watched.
pub const MEMBER_POLL_TICKS: u32 = 10;

/// Registers every built-in decorator.
pub fn register_builtins(registry: &mut DecoratorRegistry) {
    for kind in [kinds::REQUIRED, kinds::VALIDATE_INPUT, kinds::VALIDATE_JSON] {
        let expected = kind.clone();
        registry.register(kind, move |a| {
            ValidationRule::from_annotation(a)
                .map(|rule| boxed(ValidatorDecorator::new(rule)))
                .ok_or_else(|| wrong(&expected, a))
        });
    }
    registry.register(kinds::ENABLE_IF, |a| match a {
        Annotation::EnableIf { member, values } => Ok(boxed(EnableIfDecorator::new(member, values.clone()))),
        other => Err(wrong(&kinds::ENABLE_IF, other)),
    });
    registry.register(kinds::SPACE, |a| match a {
        Annotation::Space { top, bottom, left, right } => {
            Ok(boxed(SpaceDecorator::new(*top, *bottom, *left, *right)))
        }
        other => Err(wrong(&kinds::SPACE, other)),
    });
    registry.register(kinds::TITLE, |a| match a {
        Annotation::Title { text } => Ok(boxed(TitleDecorator::new(text))),
        other => Err(wrong(&kinds::TITLE, other)),
    });
    registry.register(kinds::INFO_BOX, |a| match a {
        Annotation::InfoBox { message, severity } => Ok(boxed(InfoBoxDecorator::new(message, *severity))),
        other => Err(wrong(&kinds::INFO_BOX, other)),
    });
    registry.register(kinds::CONDITIONAL_INFO_BOX, |a| match a {
        Annotation::ConditionalInfoBox {
            message,
            severity,
            member,
            values,
        } => Ok(boxed(ConditionalInfoBoxDecorator::new(
            message,
            *severity,
            member,
            values.clone(),
        ))),
        other => Err(wrong(&kinds::CONDITIONAL_INFO_BOX, other)),
    });
    registry.register(kinds::READ_ONLY, |_| Ok(boxed(ReadOnlyDecorator)));
    registry.register(kinds::TOOLTIP, |a| match a {
        Annotation::Tooltip { text } => Ok(boxed(TooltipDecorator::new(text))),
        other => Err(wrong(&kinds::TOOLTIP, other)),
    });
    registry.register(kinds::LABEL_WIDTH, |a| match a {
        Annotation::LabelWidth { width } => Ok(boxed(LabelWidthDecorator::new(*width))),
        other => Err(wrong(&kinds::LABEL_WIDTH, other)),
    });
    registry.register(kinds::INLINE_PROPERTY, |a| match a {
        Annotation::InlineProperty { style } => Ok(boxed(InlinePropertyDecorator::new(*style))),
        other => Err(wrong(&kinds::INLINE_PROPERTY, other)),
    });
    registry.register(kinds::BOX_GROUP, |a| match a {
        Annotation::BoxGroup { name, color } => Ok(boxed(GroupDecorator::new(GroupStyle::Box, name, *color))),
        other => Err(wrong(&kinds::BOX_GROUP, other)),
    });
    registry.register(kinds::FOLDOUT_GROUP, |a| match a {
        Annotation::FoldoutGroup { name, color } => {
            Ok(boxed(GroupDecorator::new(GroupStyle::Foldout, name, *color)))
        }
        other => Err(wrong(&kinds::FOLDOUT_GROUP, other)),
    });
    registry.register(kinds::MIN_VALUE, |a| match a {
        Annotation::MinValue { value } => Ok(boxed(ClampDecorator::new(Bound::Min(*value)))),
        other => Err(wrong(&kinds::MIN_VALUE, other)),
    });
    registry.register(kinds::MAX_VALUE, |a| match a {
        Annotation::MaxValue { value } => Ok(boxed(ClampDecorator::new(Bound::Max(*value)))),
        other => Err(wrong(&kinds::MAX_VALUE, other)),
    });
    registry.register(kinds::ON_VALUE_CHANGED, |a| match a {
        Annotation::OnValueChanged { method } => Ok(boxed(OnValueChangedDecorator::new(method))),
        other => Err(wrong(&kinds::ON_VALUE_CHANGED, other)),
    });
    registry.register(kinds::VALUE_DROPDOWN, |a| match a {
        Annotation::ValueDropdown { member } => Ok(boxed(ValueDropdownDecorator::new(member))),
        other => Err(wrong(&kinds::VALUE_DROPDOWN, other)),
    });
    registry.register(kinds::ENUM_TOGGLE, |a| match a {
        Annotation::EnumToggle { hide_label } => Ok(boxed(EnumToggleDecorator::new(*hide_label))),
        other => Err(wrong(&kinds::ENUM_TOGGLE, other)),
    });
}

fn boxed(decorator: impl Decorator + 'static) -> Box<dyn Decorator> {
    Box::new(decorator)
}

fn wrong(expected: &AnnotationKind, found: &Annotation) -> DecoratorError {
    DecoratorError::WrongAnnotation {
        expected: expected.clone(),
        found: found.kind(),
    }
}

/// Returns whether the member named in `scope` equals one of `values`.
/// `None` when the member cannot be resolved.
pub(crate) fn member_matches(graph: &GraphHandle, scope: &DataNode, member: &str, values: &[Value]) -> Option<bool> {
    let resolved = graph.resolve_member(scope, member)?;
    Some(values.iter().any(|v| v.loosely_equals(&resolved.value)))
}

/// Change subscriptions and timers owned by one decorator.
#[derive(Default)]
pub(crate) struct Tracker {
    subscriptions: Vec<Subscription>,
    timers: Vec<TimerGuard>,
}

impl Tracker {
    /// Calls `on_change` after every write touching the node.
    pub(crate) fn watch(&mut self, composer: &NodeComposer, node: &DataNode, on_change: impl Fn() + 'static) {
        self.subscriptions.push(composer.graph().watch(node, on_change));
    }

    /// Calls `on_change` when a member of the node's scope may have changed.
    ///
    /// Stored fields are watched; computed members are polled on a timer.
    /// Returns false if the member cannot be resolved.
    pub(crate) fn watch_member(
        &mut self,
        composer: &NodeComposer,
        scope: &DataNode,
        member: &str,
        on_change: impl Fn() + 'static,
    ) -> bool {
        match composer.graph().resolve_member(scope, member) {
            Some(resolved) => {
                match resolved.node.filter(|_| resolved.observable) {
                    Some(node) => self.watch(composer, &node, on_change),
                    None => self.timers.push(composer.scheduler().every(MEMBER_POLL_TICKS, on_change)),
                }
                true
            }
            None => false,
        }
    }

    /// Number of live registrations.
    pub(crate) fn len(&self) -> usize {
        self.subscriptions.len() + self.timers.len()
    }

    /// Cancels everything.
    pub(crate) fn release(&mut self) {
        for subscription in self.subscriptions.drain(..) {
            subscription.cancel();
        }
        for timer in self.timers.drain(..) {
            timer.cancel();
        }
    }
}

/// Returns a not-applicable error for the node.
pub(crate) fn not_applicable(kind: AnnotationKind, node: &DataNode) -> DecoratorError {
    DecoratorError::NotApplicable {
        kind,
        path: node.path().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use marquetry_core::{FieldSchema, FieldType, MemoryGraph, TypeCatalog, TypeSchema};
    use marquetry_ui::UiHandle;

    use super::*;

    #[test]
    fn test_factories_reject_foreign_annotations() {
        let mut registry = DecoratorRegistry::new();
        register_builtins(&mut registry);
        let factory_result = registry.create(&Annotation::ReadOnly).unwrap();
        assert!(factory_result.is_ok());
        assert_eq!(registry.len(), 19);
    }

    #[test]
    fn test_tracker_polls_computed_members() {
        let catalog = TypeCatalog::new().with(TypeSchema::new("Lamp").field(FieldSchema::new("on", FieldType::Bool)));
        let mut graph = MemoryGraph::new(catalog);
        let id = graph.spawn("lamp", "Lamp").unwrap();
        graph.register_computed("Lamp", "bright", |lamp| lamp.get("on").cloned().unwrap_or_default());
        let graph = GraphHandle::new(graph);
        let on = graph.children(&graph.root(id).unwrap()).unwrap().remove(0);
        let composer = NodeComposer::builder(graph, UiHandle::new()).build();

        let hits = Rc::new(Cell::new(0));
        let mut tracker = Tracker::default();
        let counter = Rc::clone(&hits);
        assert!(tracker.watch_member(&composer, &on, "bright", move || counter.set(counter.get() + 1)));
        let counter = Rc::clone(&hits);
        assert!(tracker.watch_member(&composer, &on, "on", move || counter.set(counter.get() + 10)));
        assert!(!tracker.watch_member(&composer, &on, "missing", || {}));
        assert_eq!(tracker.len(), 2);

        for _ in 0..MEMBER_POLL_TICKS {
            composer.scheduler().tick();
        }
        assert_eq!(hits.get(), 1);
        composer.graph().write(&on, Value::Bool(true)).unwrap();
        assert_eq!(hits.get(), 11);

        tracker.release();
        composer.graph().write(&on, Value::Bool(false)).unwrap();
        for _ in 0..MEMBER_POLL_TICKS {
            composer.scheduler().tick();
        }
        assert_eq!(hits.get(), 11);
    }
}
