//! Presentation decorators: spacing, titles, info boxes, read-only state,
//! tooltips and label widths.

use marquetry_core::annotation::kinds;
use marquetry_core::{AnnotationKind, DataNode, Severity, Value};
use marquetry_ui::{Spacing, UiKind, UiNodeId, HIDE_CLASS};

use crate::composer::NodeComposer;
use crate::decorator::Decorator;
use crate::decorators::{member_matches, Tracker};
use crate::error::DecoratorResult;

/// Margin container around the field.
pub struct SpaceDecorator {
    spacing: Spacing,
}

impl SpaceDecorator {
    /// Creates the decorator.
    #[must_use]
    pub const fn new(top: i32, bottom: i32, left: i32, right: i32) -> Self {
        Self {
            spacing: Spacing { top, bottom, left, right },
        }
    }
}

impl Decorator for SpaceDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::SPACE
    }

    fn wrap(&mut self, composer: &NodeComposer, _node: &DataNode, inner: UiNodeId) -> DecoratorResult<UiNodeId> {
        let ui = composer.ui();
        let spacer = ui.create(UiKind::Container);
        ui.add_class(spacer, "space");
        let spacing = self.spacing;
        ui.edit_element(spacer, |e| e.spacing = spacing);
        ui.append(spacer, inner);
        Ok(spacer)
    }
}

/// Title above the field.
pub struct TitleDecorator {
    text: String,
}

impl TitleDecorator {
    /// Creates the decorator.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Decorator for TitleDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::TITLE
    }

    fn pre(&mut self, composer: &NodeComposer, _node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        let title = composer.ui().create_labeled(UiKind::Title, self.text.clone());
        composer.ui().add_class(title, "title");
        Ok(Some(title))
    }
}

/// Static message box above the field.
pub struct InfoBoxDecorator {
    message: String,
    severity: Severity,
}

impl InfoBoxDecorator {
    /// Creates the decorator.
    #[must_use]
    pub fn new(message: impl Into<String>, severity: Severity) -> Self {
        Self {
            message: message.into(),
            severity,
        }
    }
}

impl Decorator for InfoBoxDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::INFO_BOX
    }

    fn pre(&mut self, composer: &NodeComposer, _node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        let info = composer.ui().create_labeled(
            UiKind::InfoBox {
                severity: self.severity,
            },
            self.message.clone(),
        );
        composer.ui().add_class(info, "info-box");
        Ok(Some(info))
    }
}

/// Message box shown while a member matches.
pub struct ConditionalInfoBoxDecorator {
    message: String,
    severity: Severity,
    member: String,
    values: Vec<Value>,
    info: Option<UiNodeId>,
    tracker: Tracker,
}

impl ConditionalInfoBoxDecorator {
    /// Creates the decorator.
    #[must_use]
    pub fn new(message: impl Into<String>, severity: Severity, member: impl Into<String>, values: Vec<Value>) -> Self {
        Self {
            message: message.into(),
            severity,
            member: member.into(),
            values,
            info: None,
            tracker: Tracker::default(),
        }
    }
}

fn show_when_matching(composer: &NodeComposer, info: UiNodeId, node: &DataNode, member: &str, values: &[Value]) {
    let shown = member_matches(composer.graph(), node, member, values).unwrap_or(false);
    composer.ui().set_class(info, HIDE_CLASS, !shown);
}

impl Decorator for ConditionalInfoBoxDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::CONDITIONAL_INFO_BOX
    }

    fn pre(&mut self, composer: &NodeComposer, node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        let info = composer.ui().create_labeled(
            UiKind::InfoBox {
                severity: self.severity,
            },
            self.message.clone(),
        );
        composer.ui().add_class(info, "info-box");
        show_when_matching(composer, info, node, &self.member, &self.values);
        self.info = Some(info);
        Ok(Some(info))
    }

    fn on_bound(&mut self, composer: &NodeComposer, node: &DataNode, _editor: UiNodeId) -> DecoratorResult<()> {
        let Some(info) = self.info else {
            return Ok(());
        };
        let weak = composer.downgrade();
        let scope = node.clone();
        let member = self.member.clone();
        let values = self.values.clone();
        let tracked = self.tracker.watch_member(composer, node, &self.member, move || {
            if let Some(composer) = weak.upgrade().filter(|c| !c.is_disposed()) {
                show_when_matching(&composer, info, &scope, &member, &values);
            }
        });
        if !tracked {
            tracing::warn!(node = %node, member = %self.member, "conditional info box member not found");
        }
        Ok(())
    }

    fn release(&mut self) {
        self.tracker.release();
    }
}

/// Disables the field editor and everything inside it.
pub struct ReadOnlyDecorator;

impl Decorator for ReadOnlyDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::READ_ONLY
    }

    fn on_bound(&mut self, composer: &NodeComposer, _node: &DataNode, editor: UiNodeId) -> DecoratorResult<()> {
        let subtree: Vec<UiNodeId> = composer.ui().read(|t| t.iter_dfs(editor).collect());
        for id in subtree {
            composer.ui().set_enabled(id, false);
        }
        Ok(())
    }
}

/// Hover text on the field editor.
pub struct TooltipDecorator {
    text: String,
}

impl TooltipDecorator {
    /// Creates the decorator.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

impl Decorator for TooltipDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::TOOLTIP
    }

    fn on_bound(&mut self, composer: &NodeComposer, _node: &DataNode, editor: UiNodeId) -> DecoratorResult<()> {
        composer
            .ui()
            .edit_element(editor, |e| e.tooltip = Some(self.text.clone()));
        Ok(())
    }
}

/// Fixed label width on the field and its labelled descendants.
pub struct LabelWidthDecorator {
    width: f32,
}

impl LabelWidthDecorator {
    /// Creates the decorator.
    #[must_use]
    pub const fn new(width: f32) -> Self {
        Self { width }
    }
}

impl Decorator for LabelWidthDecorator {
    fn kind(&self) -> AnnotationKind {
        kinds::LABEL_WIDTH
    }

    fn on_bound(&mut self, composer: &NodeComposer, _node: &DataNode, editor: UiNodeId) -> DecoratorResult<()> {
        let labelled = composer.ui().read(|t| {
            t.iter_dfs(editor)
                .filter(|id| {
                    t.get(*id)
                        .is_some_and(|e| matches!(e.kind, UiKind::Field { .. } | UiKind::Label))
                })
                .collect::<Vec<_>>()
        });
        for id in labelled {
            composer.ui().edit_element(id, |e| e.label_width = Some(self.width));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use marquetry_core::{FieldSchema, FieldType, GraphHandle, MemoryGraph, TypeCatalog, TypeSchema};
    use marquetry_ui::UiHandle;

    use super::*;

    fn fixture() -> (NodeComposer, Vec<DataNode>) {
        let catalog = TypeCatalog::new().with(
            TypeSchema::new("Gauge")
                .field(FieldSchema::new("level", FieldType::Int))
                .field(FieldSchema::new("state", FieldType::Text)),
        );
        let mut graph = MemoryGraph::new(catalog);
        let id = graph.spawn("gauge", "Gauge").unwrap();
        let graph = GraphHandle::new(graph);
        let fields = graph.children(&graph.root(id).unwrap()).unwrap();
        (NodeComposer::builder(graph, UiHandle::new()).build(), fields)
    }

    #[test]
    fn test_conditional_info_box_tracks_member() {
        let (composer, fields) = fixture();
        let mut decorator =
            ConditionalInfoBoxDecorator::new("Overheated", Severity::Warning, "state", vec![Value::from("hot")]);
        let info = decorator.pre(&composer, &fields[0]).unwrap().unwrap();
        assert!(composer.ui().has_class(info, HIDE_CLASS));
        decorator.on_bound(&composer, &fields[0], info).unwrap();
        composer.graph().write(&fields[1], Value::from("hot")).unwrap();
        assert!(!composer.ui().has_class(info, HIDE_CLASS));
    }

    #[test]
    fn test_read_only_disables_subtree() {
        let (composer, fields) = fixture();
        let ui = composer.ui();
        let editor = ui.create(UiKind::Container);
        let child = ui.create(UiKind::Button);
        ui.append(editor, child);
        ReadOnlyDecorator.on_bound(&composer, &fields[0], editor).unwrap();
        assert!(!ui.element(child).unwrap().is_enabled());
    }

    #[test]
    fn test_space_and_label_width() {
        let (composer, fields) = fixture();
        let ui = composer.ui();
        let field = ui.create_labeled(UiKind::Label, "Level");
        let outer = SpaceDecorator::new(4, 0, 2, 0).wrap(&composer, &fields[0], field).unwrap();
        assert_eq!(ui.element(outer).unwrap().spacing.top, 4);
        assert_eq!(ui.children(outer), vec![field]);

        LabelWidthDecorator::new(120.0).on_bound(&composer, &fields[0], outer).unwrap();
        assert_eq!(ui.element(field).unwrap().label_width, Some(120.0));
    }
}
