//! Outline rendering.
//!
//! Hosts with a real widget toolkit walk the [`UiTree`] themselves; the
//! outline renderer produces an indented, colored text view used by the
//! inspector binary and by diagnostics.

use std::fmt::Write as _;

use crate::node::{UiElement, UiKind, UiNodeId};
use crate::style::{Color, StyleBook, Theme};
use crate::tree::UiTree;

/// A render command for the outline.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderCommand {
    /// One line of text.
    Line {
        /// Indentation level.
        depth: usize,
        /// Line content.
        text: String,
        /// Text color.
        color: Color,
    },
    /// Enter a framed region.
    PushFrame {
        /// Frame title.
        title: String,
        /// Border color.
        color: Color,
    },
    /// Leave a framed region.
    PopFrame,
}

/// Collects outline commands for a UI tree.
pub struct UiRenderer {
    theme: Theme,
    commands: Vec<RenderCommand>,
}

impl UiRenderer {
    /// Creates a renderer.
    #[must_use]
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            commands: Vec::with_capacity(256),
        }
    }

    /// Begins a new frame.
    pub fn begin_frame(&mut self) {
        self.commands.clear();
    }

    /// Commands of the current frame.
    #[must_use]
    pub fn commands(&self) -> &[RenderCommand] {
        &self.commands
    }

    /// Renders the displayed part of a subtree.
    pub fn render(&mut self, tree: &UiTree, styles: &StyleBook, root: UiNodeId) {
        self.render_node(tree, styles, root, 0, &[]);
    }

    fn render_node(
        &mut self,
        tree: &UiTree,
        styles: &StyleBook,
        id: UiNodeId,
        depth: usize,
        inherited_sheets: &[String],
    ) {
        let Some(node) = tree.get(id) else {
            return;
        };
        if !tree.is_displayed(id) {
            return;
        }
        let mut sheets = inherited_sheets.to_vec();
        sheets.extend(node.style_sheets.iter().cloned());

        let style = node.classes.iter().find_map(|c| styles.resolve(&sheets, c));
        let color = match node.kind {
            UiKind::InfoBox { severity } => self.theme.severity(severity),
            UiKind::ErrorIndicator => self.theme.error,
            _ => style.and_then(|s| s.text).unwrap_or(self.theme.text),
        };
        let framed = node.has_class("box-group");
        if framed {
            let border = style.and_then(|s| s.border).unwrap_or(self.theme.text_muted);
            self.commands.push(RenderCommand::PushFrame {
                title: node.label.clone(),
                color: border,
            });
        }
        if let Some(text) = describe(node) {
            self.commands.push(RenderCommand::Line { depth, text, color });
        }
        let child_depth = depth + usize::from(style.map_or(0, |s| s.indent)) + 1;
        let collapsed = matches!(node.kind, UiKind::Foldout { .. }) && !node.is_expanded();
        if !collapsed {
            for &child in tree.children(id) {
                self.render_node(tree, styles, child, child_depth, &sheets);
            }
        }
        if framed {
            self.commands.push(RenderCommand::PopFrame);
        }
    }

    /// Plain-text outline of the current frame.
    #[must_use]
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for command in &self.commands {
            if let RenderCommand::Line { depth, text, .. } = command {
                let _ = writeln!(out, "{:indent$}{text}", "", indent = depth * 2);
            }
        }
        out
    }
}

impl Default for UiRenderer {
    fn default() -> Self {
        Self::new(Theme::default())
    }
}

fn describe(node: &UiElement) -> Option<String> {
    let disabled = if node.is_enabled() { "" } else { " (read-only)" };
    Some(match &node.kind {
        UiKind::Container | UiKind::List | UiKind::TableRow { .. } if node.label.is_empty() => {
            return None;
        }
        UiKind::Foldout { title } => {
            let marker = if node.is_expanded() { '▾' } else { '▸' };
            format!("{marker} {title}")
        }
        UiKind::Field { .. } => format!("{}: {}{disabled}", node.label, node.value),
        UiKind::Dropdown { choices, selected } => {
            let current = selected
                .and_then(|i| choices.get(i))
                .map_or("-", String::as_str);
            format!("{}: [{current}]", node.label)
        }
        UiKind::Button => format!("[{}]{disabled}", node.label),
        UiKind::InfoBox { severity } => format!("{severity}: {}", node.label),
        UiKind::ErrorIndicator => format!("! {}", node.label),
        UiKind::Table { columns } => format!("{} | {}", node.label, columns.join(" | ")),
        UiKind::ListRow { index } => format!("[{index}] {}", node.label),
        _ => node.label.clone(),
    })
}
