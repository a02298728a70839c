//! Choice editors: `value_dropdown` picks among the values of a scope
//! member, `enum_toggle` draws one button per enum variant.

use std::cell::RefCell;
use std::rc::Rc;

use marquetry_core::annotation::kinds;
use marquetry_core::{AnnotationKind, DataNode, EnumSchema, FieldType, GraphHandle, Severity, Value};
use marquetry_ui::{UiEvent, UiHandle, UiKind, UiNodeId, HIDE_CLASS};

use crate::composer::NodeComposer;
use crate::decorator::Decorator;
use crate::decorators::{not_applicable, Tracker};
use crate::error::DecoratorResult;

/// Class of the dropdown container.
pub const VALUE_DROPDOWN_CLASS: &str = "value-dropdown";

/// Class of the toggle strip.
pub const ENUM_TOGGLE_CLASS: &str = "enum-toggle";

/// Class of an active variant button.
pub const TOGGLE_SELECTED_CLASS: &str = "toggle-selected";

/// Options offered by `member`: a list's items, or a single value.
fn options_of(graph: &GraphHandle, scope: &DataNode, member: &str) -> Vec<Value> {
    match graph.resolve_member(scope, member).map(|m| m.value) {
        Some(Value::List(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(single) => vec![single],
    }
}

struct DropdownState {
    ui: UiHandle,
    node: DataNode,
    member: String,
    dropdown: UiNodeId,
    warning: UiNodeId,
    options: RefCell<Vec<Value>>,
}

impl DropdownState {
    fn refresh(&self, graph: &GraphHandle) {
        let options = options_of(graph, &self.node, &self.member);
        let current = graph.value(&self.node).unwrap_or(Value::Null);
        let selected = options.iter().position(|o| o.loosely_equals(&current));
        let choices: Vec<String> = options.iter().map(ToString::to_string).collect();
        self.ui.set_class(self.warning, HIDE_CLASS, !options.is_empty());
        self.ui.set_class(self.dropdown, HIDE_CLASS, options.is_empty());
        self.ui.edit_element(self.dropdown, |e| {
            e.kind = UiKind::Dropdown { choices, selected };
        });
        self.options.replace(options);
    }
}

/// Replaces the field editor with a dropdown over a member's values.
pub struct ValueDropdownDecorator {
    member: String,
    state: Option<Rc<DropdownState>>,
    tracker: Tracker,
}

impl ValueDropdownDecorator {
    /// Creates the decorator.
    #[must_use]
    pub fn new(member: impl Into<String>) -> Self {
        Self {
            member: member.into(),
            state: None,
            tracker: Tracker::default(),
        }
    }
}

impl Decorator for ValueDropdownDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::VALUE_DROPDOWN
    }

    fn replaces_editor(&self) -> bool {
        true
    }

    fn replace(&mut self, composer: &NodeComposer, node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        let ui = composer.ui();
        let container = ui.create(UiKind::Container);
        ui.edit_element(container, |e| e.name = node.path().to_string());
        ui.add_class(container, VALUE_DROPDOWN_CLASS);
        let warning = ui.create_labeled(
            UiKind::InfoBox {
                severity: Severity::Warning,
            },
            format!("Member '{}' not found or empty.", self.member),
        );
        let dropdown = ui.create_labeled(
            UiKind::Dropdown {
                choices: Vec::new(),
                selected: None,
            },
            node.display_name(),
        );
        ui.append(container, warning);
        ui.append(container, dropdown);

        let state = Rc::new(DropdownState {
            ui: ui.clone(),
            node: node.clone(),
            member: self.member.clone(),
            dropdown,
            warning,
            options: RefCell::new(Vec::new()),
        });
        state.refresh(composer.graph());

        let weak = composer.downgrade();
        let listener = Rc::downgrade(&state);
        ui.on_event(dropdown, move |event| {
            let UiEvent::Selected(index) = event else {
                return;
            };
            let (Some(composer), Some(state)) = (weak.upgrade().filter(|c| !c.is_disposed()), listener.upgrade())
            else {
                return;
            };
            let picked = state.options.borrow().get(*index).cloned();
            if let Some(value) = picked {
                if let Err(err) = composer.graph().write(&state.node, value) {
                    tracing::warn!(node = %state.node, error = %err, "dropdown choice rejected");
                    state.refresh(composer.graph());
                }
            }
        });
        self.state = Some(state);
        Ok(Some(container))
    }

    fn on_bound(&mut self, composer: &NodeComposer, node: &DataNode, _editor: UiNodeId) -> DecoratorResult<()> {
        let Some(state) = self.state.clone() else {
            return Ok(());
        };
        let refresh = {
            let graph = composer.graph().downgrade();
            let state = Rc::downgrade(&state);
            move || {
                if let (Some(graph), Some(state)) = (graph.upgrade(), state.upgrade()) {
                    state.refresh(&graph);
                }
            }
        };
        self.tracker.watch(composer, node, refresh.clone());
        if !self.tracker.watch_member(composer, node, &self.member, refresh) {
            tracing::warn!(node = %node, member = %self.member, "dropdown member not found");
        }
        Ok(())
    }

    fn release(&mut self) {
        self.tracker.release();
        self.state = None;
    }
}

struct ToggleState {
    ui: UiHandle,
    node: DataNode,
    schema: EnumSchema,
    buttons: Vec<UiNodeId>,
}

impl ToggleState {
    fn refresh(&self, graph: &GraphHandle) {
        let current = graph.value(&self.node).unwrap_or(Value::Null);
        for (variant, button) in self.schema.variants.iter().zip(&self.buttons) {
            self.ui
                .set_class(*button, TOGGLE_SELECTED_CLASS, self.schema.is_active(&current, variant));
        }
    }
}

/// Replaces an enum editor with a strip of toggle buttons.
pub struct EnumToggleDecorator {
    hide_label: bool,
    state: Option<Rc<ToggleState>>,
    tracker: Tracker,
}

impl EnumToggleDecorator {
    /// Creates the decorator.
    #[must_use]
    pub fn new(hide_label: bool) -> Self {
        Self {
            hide_label,
            state: None,
            tracker: Tracker::default(),
        }
    }
}

impl Decorator for EnumToggleDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::ENUM_TOGGLE
    }

    fn replaces_editor(&self) -> bool {
        true
    }

    fn replace(&mut self, composer: &NodeComposer, node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        let FieldType::Enum(name) = node.field_type() else {
            return Err(not_applicable(kinds::ENUM_TOGGLE, node));
        };
        let schema = composer
            .graph()
            .enum_schema(name)
            .ok_or_else(|| not_applicable(kinds::ENUM_TOGGLE, node))?;

        let ui = composer.ui();
        let container = ui.create(UiKind::Container);
        ui.edit_element(container, |e| e.name = node.path().to_string());
        ui.add_class(container, ENUM_TOGGLE_CLASS);
        if !self.hide_label {
            let label = ui.create_labeled(UiKind::Label, node.display_name());
            ui.append(container, label);
        }

        let buttons: Vec<UiNodeId> = schema
            .variants
            .iter()
            .map(|variant| {
                let button = ui.create_labeled(UiKind::Button, variant.clone());
                ui.append(container, button);
                button
            })
            .collect();
        let state = Rc::new(ToggleState {
            ui: ui.clone(),
            node: node.clone(),
            schema,
            buttons,
        });
        state.refresh(composer.graph());

        for (variant, button) in state.schema.variants.iter().zip(&state.buttons) {
            let weak = composer.downgrade();
            let listener = Rc::downgrade(&state);
            let variant = variant.clone();
            ui.on_event(*button, move |event| {
                if !matches!(event, UiEvent::Clicked) {
                    return;
                }
                let (Some(composer), Some(state)) = (weak.upgrade().filter(|c| !c.is_disposed()), listener.upgrade())
                else {
                    return;
                };
                let current = composer.graph().value(&state.node).unwrap_or(Value::Null);
                let next = state.schema.toggle(&current, &variant);
                if let Err(err) = composer.graph().write(&state.node, next) {
                    tracing::warn!(node = %state.node, variant = %variant, error = %err, "toggle rejected");
                }
            });
        }
        self.state = Some(state);
        Ok(Some(container))
    }

    fn on_bound(&mut self, composer: &NodeComposer, node: &DataNode, _editor: UiNodeId) -> DecoratorResult<()> {
        let Some(state) = self.state.as_ref().map(Rc::downgrade) else {
            return Ok(());
        };
        let graph = composer.graph().downgrade();
        self.tracker.watch(composer, node, move || {
            if let (Some(graph), Some(state)) = (graph.upgrade(), state.upgrade()) {
                state.refresh(&graph);
            }
        });
        Ok(())
    }

    fn release(&mut self) {
        self.tracker.release();
        self.state = None;
    }
}
