//! Validator decorators: `required`, `validate_input` and `validate_json`.
//!
//! Each one shows a message box above the field while the value fails, and
//! answers [`Decorator::check`] for the validator subsystem.

use marquetry_core::annotation::kinds;
use marquetry_core::{Annotation, AnnotationKind, DataNode, FieldType, GraphHandle, Severity, Value};
use marquetry_ui::{UiKind, UiNodeId, HIDE_CLASS};

use crate::composer::{NodeComposer, VALIDATION_ERROR_CLASS};
use crate::decorator::{Decorator, Verdict};
use crate::decorators::Tracker;
use crate::error::DecoratorResult;

/// Default message of `required`.
pub const REQUIRED_MESSAGE: &str = "Property is required.";

/// Class of the box shown when a validator does not fit its field.
pub const NOT_APPLICABLE_CLASS: &str = "not-applicable";

/// What a validator decorator checks.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationRule {
    /// Value must differ from its type default.
    Required {
        /// Custom message.
        message: Option<String>,
    },
    /// Named condition must hold.
    Input {
        /// `true`, `false`, a bool member or a predicate.
        condition: String,
        /// Failure message.
        message: String,
    },
    /// Text must parse as JSON.
    Json,
}

impl ValidationRule {
    /// Rule of a validator annotation.
    #[must_use]
    pub fn from_annotation(annotation: &Annotation) -> Option<Self> {
        match annotation {
            Annotation::Required { message } => Some(Self::Required {
                message: message.clone(),
            }),
            Annotation::ValidateInput { condition, message } => Some(Self::Input {
                condition: condition.clone(),
                message: message.clone(),
            }),
            Annotation::ValidateJson => Some(Self::Json),
            _ => None,
        }
    }

    /// Annotation kind of the rule.
    #[must_use]
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Self::Required { .. } => kinds::REQUIRED,
            Self::Input { .. } => kinds::VALIDATE_INPUT,
            Self::Json => kinds::VALIDATE_JSON,
        }
    }

    /// Returns true if the rule can check values of the node's type.
    #[must_use]
    pub fn applies_to(&self, node: &DataNode) -> bool {
        match self {
            Self::Json => matches!(node.field_type(), FieldType::Text | FieldType::Any),
            Self::Required { .. } | Self::Input { .. } => true,
        }
    }

    /// Member the condition reads, for tracking.
    fn condition_member(&self) -> Option<&str> {
        match self {
            Self::Input { condition, .. } if !matches!(condition.as_str(), "true" | "false") => Some(condition),
            _ => None,
        }
    }

    /// Evaluates the rule against the node's current value.
    #[must_use]
    pub fn evaluate(&self, graph: &GraphHandle, node: &DataNode) -> Verdict {
        if !self.applies_to(node) {
            return Verdict::invalid(not_applicable_message(node), Severity::Error);
        }
        let value = match graph.value(node) {
            Ok(value) => value,
            Err(err) => return Verdict::invalid(err.to_string(), Severity::Error),
        };
        match self {
            Self::Required { message } => {
                if value.is_default() {
                    Verdict::invalid(message.as_deref().unwrap_or(REQUIRED_MESSAGE), Severity::Error)
                } else {
                    Verdict::Valid
                }
            }
            Self::Input { condition, message } => evaluate_condition(graph, node, condition, &value, message),
            Self::Json => match value.as_text() {
                Some(text) if !text.trim().is_empty() => match serde_json::from_str::<serde_json::Value>(text) {
                    Ok(_) => Verdict::Valid,
                    Err(err) => Verdict::invalid(format!("Invalid JSON: {err}"), Severity::Error),
                },
                _ => Verdict::Valid,
            },
        }
    }
}

fn not_applicable_message(node: &DataNode) -> String {
    format!("Attribute is not applicable for this property [{}]", node.display_name())
}

fn evaluate_condition(graph: &GraphHandle, node: &DataNode, condition: &str, value: &Value, message: &str) -> Verdict {
    let holds = match condition {
        "true" => Some(true),
        "false" => Some(false),
        member => match graph.resolve_member(node, member) {
            Some(resolved) => match resolved.value.as_bool() {
                Some(holds) => Some(holds),
                None => {
                    tracing::warn!(node = %node, member, "validation condition is not a bool");
                    return Verdict::invalid(format!("Condition {member} is not a bool"), Severity::Warning);
                }
            },
            None => graph.read(|g| g.call_predicate(node, member, value)),
        },
    };
    match holds {
        Some(true) => Verdict::Valid,
        Some(false) => Verdict::invalid(message, Severity::Error),
        None => {
            tracing::warn!(node = %node, condition, "cannot resolve validation condition");
            Verdict::invalid(format!("Cannot resolve condition {condition}"), Severity::Warning)
        }
    }
}

/// Shows a rule's verdict next to the field.
pub struct ValidatorDecorator {
    rule: ValidationRule,
    message_box: Option<UiNodeId>,
    tracker: Tracker,
}

impl ValidatorDecorator {
    /// Creates the decorator of a rule.
    #[must_use]
    pub fn new(rule: ValidationRule) -> Self {
        Self {
            rule,
            message_box: None,
            tracker: Tracker::default(),
        }
    }
}

/// Updates a message box from a verdict.
fn show_verdict(composer: &NodeComposer, message_box: UiNodeId, verdict: &Verdict) {
    composer.ui().edit_element(message_box, |e| {
        if let Verdict::Invalid { message, severity } = verdict {
            e.label.clone_from(message);
            e.kind = UiKind::InfoBox { severity: *severity };
        }
    });
    composer.ui().set_class(message_box, HIDE_CLASS, verdict.is_valid());
}

impl Decorator for ValidatorDecorator {
    fn kind(&self) -> AnnotationKind {
        self.rule.kind()
    }

    fn pre(&mut self, composer: &NodeComposer, node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        let ui = composer.ui();
        let message_box = ui.create(UiKind::InfoBox {
            severity: Severity::Error,
        });
        ui.edit_element(message_box, |e| e.name = format!("{} {}", node.path(), self.rule.kind()));
        if self.rule.applies_to(node) {
            ui.add_class(message_box, VALIDATION_ERROR_CLASS);
        } else {
            ui.add_class(message_box, NOT_APPLICABLE_CLASS);
        }
        show_verdict(composer, message_box, &self.rule.evaluate(composer.graph(), node));
        self.message_box = Some(message_box);
        Ok(Some(message_box))
    }

    fn on_bound(&mut self, composer: &NodeComposer, node: &DataNode, _editor: UiNodeId) -> DecoratorResult<()> {
        let Some(message_box) = self.message_box else {
            return Ok(());
        };
        if !self.rule.applies_to(node) {
            return Ok(());
        }
        let refresh = {
            let weak = composer.downgrade();
            let rule = self.rule.clone();
            let node = node.clone();
            move || {
                if let Some(composer) = weak.upgrade().filter(|c| !c.is_disposed()) {
                    show_verdict(&composer, message_box, &rule.evaluate(composer.graph(), &node));
                }
            }
        };
        if let Some(member) = self.rule.condition_member() {
            self.tracker.watch_member(composer, node, member, refresh.clone());
        }
        self.tracker.watch(composer, node, refresh);
        tracing::trace!(node = %node, kind = %self.rule.kind(), tracking = self.tracker.len(), "validator bound");
        Ok(())
    }

    fn release(&mut self) {
        self.tracker.release();
    }

    fn check(&self, graph: &GraphHandle, node: &DataNode) -> Option<Verdict> {
        Some(self.rule.evaluate(graph, node))
    }
}

#[cfg(test)]
mod tests {
    use marquetry_core::{FieldSchema, MemoryGraph, TypeCatalog, TypeSchema};
    use marquetry_ui::UiHandle;

    use super::*;

    fn fixture() -> (NodeComposer, Vec<DataNode>) {
        let catalog = TypeCatalog::new().with(
            TypeSchema::new("Form")
                .field(FieldSchema::new("name", FieldType::Text))
                .field(FieldSchema::new("payload", FieldType::Text))
                .field(FieldSchema::new("age", FieldType::Int))
                .field(FieldSchema::new("accepted", FieldType::Bool)),
        );
        let mut graph = MemoryGraph::new(catalog);
        let id = graph.spawn("form", "Form").unwrap();
        graph.register_predicate("Form", "is_adult", |v| v.as_f64().is_some_and(|age| age >= 18.0));
        let graph = GraphHandle::new(graph);
        let fields = graph.children(&graph.root(id).unwrap()).unwrap();
        (NodeComposer::builder(graph, UiHandle::new()).build(), fields)
    }

    fn input(condition: &str) -> ValidationRule {
        ValidationRule::Input {
            condition: condition.into(),
            message: "Invalid Input".into(),
        }
    }

    #[test]
    fn test_required_treats_defaults_as_unset() {
        let (composer, fields) = fixture();
        let graph = composer.graph();
        let rule = ValidationRule::Required { message: None };
        assert_eq!(rule.evaluate(graph, &fields[0]), Verdict::invalid(REQUIRED_MESSAGE, Severity::Error));
        graph.write(&fields[0], Value::from("Ada")).unwrap();
        assert!(rule.evaluate(graph, &fields[0]).is_valid());
    }

    #[test]
    fn test_input_conditions() {
        let (composer, fields) = fixture();
        let graph = composer.graph();
        assert!(input("true").evaluate(graph, &fields[2]).is_valid());
        assert!(!input("false").evaluate(graph, &fields[2]).is_valid());

        assert!(!input("accepted").evaluate(graph, &fields[2]).is_valid());
        graph.write(&fields[3], Value::Bool(true)).unwrap();
        assert!(input("accepted").evaluate(graph, &fields[2]).is_valid());

        assert!(!input("is_adult").evaluate(graph, &fields[2]).is_valid());
        graph.write(&fields[2], Value::Int(30)).unwrap();
        assert!(input("is_adult").evaluate(graph, &fields[2]).is_valid());

        assert!(matches!(
            input("name").evaluate(graph, &fields[2]),
            Verdict::Invalid { severity: Severity::Warning, .. }
        ));
        assert!(matches!(
            input("nowhere").evaluate(graph, &fields[2]),
            Verdict::Invalid { severity: Severity::Warning, .. }
        ));
    }

    #[test]
    fn test_json_rule() {
        let (composer, fields) = fixture();
        let graph = composer.graph();
        graph.write(&fields[1], Value::from("{\"a\": 1}")).unwrap();
        assert!(ValidationRule::Json.evaluate(graph, &fields[1]).is_valid());
        graph.write(&fields[1], Value::from("{a: 1")).unwrap();
        assert!(!ValidationRule::Json.evaluate(graph, &fields[1]).is_valid());
        assert!(!ValidationRule::Json.applies_to(&fields[2]));
    }

    #[test]
    fn test_message_box_tracks_value_once_bound() {
        let (composer, fields) = fixture();
        let mut decorator = ValidatorDecorator::new(ValidationRule::Required { message: None });
        let message_box = decorator.pre(&composer, &fields[0]).unwrap().unwrap();
        assert!(!composer.ui().has_class(message_box, HIDE_CLASS));
        assert_eq!(composer.ui().element(message_box).unwrap().label, REQUIRED_MESSAGE);

        decorator.on_bound(&composer, &fields[0], message_box).unwrap();
        composer.graph().write(&fields[0], Value::from("Ada")).unwrap();
        assert!(composer.ui().has_class(message_box, HIDE_CLASS));

        decorator.release();
        composer.graph().write(&fields[0], Value::from("")).unwrap();
        assert!(composer.ui().has_class(message_box, HIDE_CLASS));
    }
}
