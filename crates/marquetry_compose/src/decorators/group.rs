//! `box_group` and `foldout_group`: sibling fields sharing one container.

use marquetry_core::annotation::kinds;
use marquetry_core::{AnnotationKind, DataNode, GroupColor};
use marquetry_ui::{UiKind, UiNodeId};

use crate::composer::NodeComposer;
use crate::decorator::Decorator;
use crate::error::DecoratorResult;

/// Class of a framed group.
pub const BOX_GROUP_CLASS: &str = "box-group";

/// Class of a collapsible group.
pub const FOLDOUT_GROUP_CLASS: &str = "foldout-group";

/// Container flavour of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupStyle {
    /// Framed container with a header.
    Box,
    /// Foldout with persisted expansion state.
    Foldout,
}

/// Moves the field into the named group of its siblings.
///
/// The first member creates the group and returns it in its own place.
/// Later members return an empty placeholder.
pub struct GroupDecorator {
    style: GroupStyle,
    name: String,
    color: GroupColor,
}

impl GroupDecorator {
    /// Creates the decorator.
    #[must_use]
    pub fn new(style: GroupStyle, name: impl Into<String>, color: GroupColor) -> Self {
        Self {
            style,
            name: name.into(),
            color,
        }
    }

    fn build(&self, composer: &NodeComposer, node: &DataNode) -> UiNodeId {
        let ui = composer.ui();
        let group = match self.style {
            GroupStyle::Box => {
                let group = ui.create_labeled(UiKind::Container, self.name.clone());
                ui.add_class(group, BOX_GROUP_CLASS);
                group
            }
            GroupStyle::Foldout => {
                let parent = node.path().parent().unwrap_or_default();
                let key = format!("{}:{}#group:{}", node.owner(), parent, self.name);
                let group = composer.persistent_foldout(&self.name, &key);
                ui.add_class(group, FOLDOUT_GROUP_CLASS);
                group
            }
        };
        ui.add_class(group, &color_class(self.color));
        ui.edit_element(group, |e| e.name = format!("group {}", self.name));
        group
    }
}

/// Style class of a group accent.
fn color_class(color: GroupColor) -> String {
    let name = match color {
        GroupColor::Default => "default",
        GroupColor::Red => "red",
        GroupColor::Blue => "blue",
        GroupColor::Black => "black",
        GroupColor::Green => "green",
        GroupColor::Yellow => "yellow",
        GroupColor::Orange => "orange",
        GroupColor::Pink => "pink",
        GroupColor::Purple => "purple",
    };
    format!("group-color-{name}")
}

impl Decorator for GroupDecorator {
    fn kind(&self) -> AnnotationKind {
        match self.style {
            GroupStyle::Box => kinds::BOX_GROUP,
            GroupStyle::Foldout => kinds::FOLDOUT_GROUP,
        }
    }

    fn wrap(&mut self, composer: &NodeComposer, node: &DataNode, inner: UiNodeId) -> DecoratorResult<UiNodeId> {
        let (group, created) = composer.group_container(node, &self.name, || self.build(composer, node));
        composer.ui().append(group, inner);
        if created {
            return Ok(group);
        }
        let placeholder = composer.ui().create(UiKind::Container);
        composer.ui().add_class(placeholder, "group-placeholder");
        Ok(placeholder)
    }
}
