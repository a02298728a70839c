//! # List / Table Composer
//!
//! Renders a sequence node as one row per element plus insert, remove and
//! reorder controls. The tabular variant (selected by `table_list`) lays each
//! element's visible fields out as cells.
//!
//! Rows are built inside a disposal scope and rebuilt when the sequence's
//! shape (length or element types) changes, or after one of the list's own
//! controls ran.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use marquetry_core::annotation::kinds;
use marquetry_core::{Annotation, DataNode, Value};
use marquetry_ui::{UiEvent, UiKind, UiNodeId};

use crate::composer::{DisposalScope, NodeComposer, WeakComposer};
use crate::pipeline;

/// Class of list and table containers.
pub const LIST_CLASS: &str = "marquetry-list";

/// Class of the per-row control strip.
pub const ROW_CONTROLS_CLASS: &str = "list-row-controls";

/// Class of the cell strip inside a table row.
pub const TABLE_CELLS_CLASS: &str = "table-row-cells";

/// Label of the insert button.
pub const ADD_LABEL: &str = "Add Element";

/// Length plus the concrete type of every element.
type Signature = (usize, Vec<String>);

/// Row-level edit requested by a control.
#[derive(Debug, Clone, Copy)]
enum ListEdit {
    Insert(usize),
    Remove(usize),
    Move { from: usize, to: usize },
}

struct ListState {
    composer: WeakComposer,
    node: DataNode,
    element_annotations: Vec<Annotation>,
    force: bool,
    table: bool,
    container: UiNodeId,
    scope: DisposalScope,
    signature: RefCell<Option<Signature>>,
    editing: Cell<bool>,
}

impl ListState {
    fn read_only(&self) -> bool {
        self.element_annotations
            .iter()
            .any(|a| a.kind() == kinds::READ_ONLY)
    }

    /// Rebuilds the rows unless the shape is unchanged and `force` is false.
    fn refresh(self: &Rc<Self>, force: bool) {
        let Some(composer) = self.composer.upgrade().filter(|c| !c.is_disposed()) else {
            return;
        };
        let current = signature(&composer, &self.node);
        if !force && *self.signature.borrow() == current {
            return;
        }
        *self.signature.borrow_mut() = current;
        self.scope.release();
        composer.ui().clear_children(self.container);
        composer.within_scope(&self.scope, || self.build_rows(&composer));
    }

    fn build_rows(self: &Rc<Self>, composer: &NodeComposer) {
        let ui = composer.ui();
        let elements = match composer.graph().children(&self.node) {
            Ok(elements) => elements,
            Err(err) => {
                let indicator = composer.error_indicator(&self.node, &err);
                ui.append(self.container, indicator);
                return;
            }
        };
        if self.table {
            let columns = table_columns(composer, elements.first());
            ui.edit_element(self.container, |e| e.kind = UiKind::Table { columns });
        }
        if elements.is_empty() {
            let empty = ui.create_labeled(UiKind::Label, "List is empty");
            ui.add_class(empty, "list-empty");
            ui.append(self.container, empty);
        }
        let len = elements.len();
        for (index, element) in elements.iter().enumerate() {
            let element = element.with_annotations(self.element_annotations.clone());
            let row = if self.table {
                self.table_row(composer, &element, index)
            } else {
                self.list_row(composer, &element, index)
            };
            ui.append(row, self.row_controls(composer, index, len));
            ui.append(self.container, row);
        }
        let add = ui.create_labeled(UiKind::Button, ADD_LABEL);
        ui.set_enabled(add, !self.read_only());
        self.on_edit(composer, add, ListEdit::Insert(len));
        ui.append(self.container, add);
        tracing::trace!(node = %self.node, rows = len, "list rows built");
    }

    fn list_row(&self, composer: &NodeComposer, element: &DataNode, index: usize) -> UiNodeId {
        let ui = composer.ui();
        let row = ui.create(UiKind::ListRow { index });
        ui.edit_element(row, |e| e.name = element.path().to_string());
        if let Some(editor) = composer.compose(element, self.force, true) {
            ui.append(row, editor);
        }
        row
    }

    fn table_row(&self, composer: &NodeComposer, element: &DataNode, index: usize) -> UiNodeId {
        let ui = composer.ui();
        let row = ui.create(UiKind::TableRow { index });
        ui.edit_element(row, |e| e.name = element.path().to_string());
        let cells = if element.has_visible_children() {
            composer.graph().children(element).unwrap_or_default()
        } else {
            Vec::new()
        };
        if cells.is_empty() {
            if let Some(editor) = composer.compose(element, self.force, false) {
                ui.append(row, editor);
            }
            return row;
        }
        let content = ui.create(UiKind::Container);
        ui.add_class(content, TABLE_CELLS_CLASS);
        for cell in &cells {
            if let Some(editor) = composer.compose(cell, self.force, false) {
                ui.append(content, editor);
            }
        }
        // Element-level annotations decorate the row's cells as a whole.
        let decorated = pipeline::apply_decorators(composer, element, content, element.annotations());
        ui.append(row, decorated);
        row
    }

    fn row_controls(self: &Rc<Self>, composer: &NodeComposer, index: usize, len: usize) -> UiNodeId {
        let ui = composer.ui();
        let strip = ui.create(UiKind::Container);
        ui.add_class(strip, ROW_CONTROLS_CLASS);
        let editable = !self.read_only();
        let controls = [
            ("Up", index > 0, ListEdit::Move { from: index, to: index.saturating_sub(1) }),
            ("Down", index + 1 < len, ListEdit::Move { from: index, to: index + 1 }),
            ("Remove", true, ListEdit::Remove(index)),
        ];
        for (label, allowed, edit) in controls {
            let button = ui.create_labeled(UiKind::Button, label);
            ui.set_enabled(button, editable && allowed);
            self.on_edit(composer, button, edit);
            ui.append(strip, button);
        }
        strip
    }

    fn on_edit(self: &Rc<Self>, composer: &NodeComposer, button: UiNodeId, edit: ListEdit) {
        let state = Rc::downgrade(self);
        composer.ui().on_event(button, move |event| {
            if !matches!(event, UiEvent::Clicked) {
                return;
            }
            if let Some(state) = state.upgrade() {
                state.apply(edit);
            }
        });
    }

    fn apply(self: &Rc<Self>, edit: ListEdit) {
        let Some(composer) = self.composer.upgrade().filter(|c| !c.is_disposed()) else {
            return;
        };
        let graph = composer.graph();
        // The shape watcher stays quiet while our own edit lands.
        self.editing.set(true);
        let result = match edit {
            ListEdit::Insert(index) => graph.insert_element(&self.node, index, None),
            ListEdit::Remove(index) => graph.remove_element(&self.node, index),
            ListEdit::Move { from, to } => graph.move_element(&self.node, from, to),
        };
        self.editing.set(false);
        match result {
            Ok(()) => self.refresh(true),
            Err(err) => tracing::warn!(node = %self.node, ?edit, error = %err, "list edit rejected"),
        }
    }
}

/// Composes a sequence node. `element_annotations` is the element-level
/// share of the sequence's annotations and decorates every element.
pub fn compose_sequence(
    composer: &NodeComposer,
    node: &DataNode,
    element_annotations: &[Annotation],
    force: bool,
) -> UiNodeId {
    let ui = composer.ui();
    let table = node.has_annotation(&kinds::TABLE_LIST);
    let kind = if table {
        UiKind::Table { columns: Vec::new() }
    } else {
        UiKind::List
    };
    let container = ui.create_labeled(kind, node.display_name());
    ui.edit_element(container, |e| e.name = node.path().to_string());
    ui.add_class(container, LIST_CLASS);

    let state = Rc::new(ListState {
        composer: composer.downgrade(),
        node: node.clone(),
        element_annotations: element_annotations.to_vec(),
        force,
        table,
        container,
        scope: composer.new_scope(),
        signature: RefCell::new(None),
        editing: Cell::new(false),
    });
    state.refresh(true);

    let watcher = Rc::clone(&state);
    composer.retain_subscription(composer.graph().watch(node, move || {
        if !watcher.editing.get() {
            watcher.refresh(false);
        }
    }));
    container
}

fn signature(composer: &NodeComposer, node: &DataNode) -> Option<Signature> {
    match composer.graph().value(node) {
        Ok(Value::List(items)) => Some((
            items.len(),
            items
                .iter()
                .map(|item| item.object_type().unwrap_or(item.kind_name()).to_string())
                .collect(),
        )),
        _ => None,
    }
}

fn table_columns(composer: &NodeComposer, first: Option<&DataNode>) -> Vec<String> {
    let Some(first) = first.filter(|e| e.has_visible_children()) else {
        return Vec::new();
    };
    composer
        .graph()
        .children(first)
        .unwrap_or_default()
        .iter()
        .filter(|c| composer.accepts(c))
        .map(|c| c.display_name().to_string())
        .collect()
}
