//! `inline_property`: draws a structured field's children in place instead
//! of inside a foldout.

use marquetry_core::annotation::kinds;
use marquetry_core::{AnnotationKind, DataNode, InlineStyle, Severity};
use marquetry_ui::{UiKind, UiNodeId};

use crate::composer::NodeComposer;
use crate::decorator::Decorator;
use crate::editors;
use crate::error::DecoratorResult;

/// Class of the inline container.
pub const INLINE_CLASS: &str = "inline-property";

/// Message shown when the field has nothing to inline.
pub const NOTHING_TO_INLINE: &str = "InlineProperty can only be used on properties with children.";

/// Replaces the field editor with the field's children laid out flat.
pub struct InlinePropertyDecorator {
    style: InlineStyle,
}

impl InlinePropertyDecorator {
    /// Creates the decorator.
    #[must_use]
    pub const fn new(style: InlineStyle) -> Self {
        Self { style }
    }
}

impl Decorator for InlinePropertyDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::INLINE_PROPERTY
    }

    fn replaces_editor(&self) -> bool {
        true
    }

    fn replace(&mut self, composer: &NodeComposer, node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        let ui = composer.ui();
        let container = ui.create(UiKind::Container);
        ui.edit_element(container, |e| e.name = node.path().to_string());
        ui.add_class(container, INLINE_CLASS);

        if !node.has_visible_children() {
            let warning = ui.create_labeled(UiKind::InfoBox { severity: Severity::Warning }, NOTHING_TO_INLINE);
            ui.append(container, warning);
            let field = editors::bound_field(composer, node);
            ui.append(container, field);
            return Ok(Some(container));
        }

        match self.style {
            InlineStyle::WithTitle => {
                let header = ui.create_labeled(UiKind::Label, node.display_name());
                ui.add_class(header, "inline-header");
                ui.append(container, header);
            }
            InlineStyle::WithoutTitle => {}
            InlineStyle::Borderless => ui.add_class(container, "borderless"),
        }
        composer.compose_children_into(node, container, false);
        Ok(Some(container))
    }
}
