//! Core UI node types.

use std::fmt;

use marquetry_core::{ObjectId, PropertyPath, Severity, Value};

/// Unique identifier for a UI node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UiNodeId(pub u64);

impl UiNodeId {
    /// Returns the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for UiNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ui#{}", self.0)
    }
}

/// Node state flags (bitfield).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UiFlags(u32);

impl UiFlags {
    /// Node takes part in layout.
    pub const VISIBLE: u32 = 1 << 0;
    /// Node accepts input.
    pub const ENABLED: u32 = 1 << 1;
    /// Node belongs to a live display surface.
    pub const ATTACHED: u32 = 1 << 2;
    /// Foldout is open.
    pub const EXPANDED: u32 = 1 << 3;

    /// Default flags for a new node.
    pub const DEFAULT: Self = Self(Self::VISIBLE | Self::ENABLED);

    /// Returns true if the flag is set.
    #[inline]
    #[must_use]
    pub const fn has(self, flag: u32) -> bool {
        (self.0 & flag) != 0
    }

    /// Sets a flag.
    #[inline]
    pub fn set(&mut self, flag: u32) {
        self.0 |= flag;
    }

    /// Clears a flag.
    #[inline]
    pub fn clear(&mut self, flag: u32) {
        self.0 &= !flag;
    }

    /// Sets or clears a flag.
    #[inline]
    pub fn assign(&mut self, flag: u32, on: bool) {
        if on {
            self.set(flag);
        } else {
            self.clear(flag);
        }
    }
}

impl Default for UiFlags {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// How a field editor binds to its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorKind {
    /// Host-native two-way binding.
    Native,
    /// Immediate-mode fallback redrawn every frame.
    Immediate,
}

/// Location a field editor is bound to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Binding {
    /// Owning object.
    pub owner: ObjectId,
    /// Bound path.
    pub path: PropertyPath,
}

/// What a node draws.
#[derive(Debug, Clone, PartialEq)]
pub enum UiKind {
    /// Plain vertical container.
    Container,
    /// Collapsible container.
    Foldout {
        /// Header text.
        title: String,
    },
    /// Field editor.
    Field {
        /// Binding flavour.
        editor: EditorKind,
        /// Bound location.
        binding: Binding,
    },
    /// Text label.
    Label,
    /// Section title.
    Title,
    /// Message box.
    InfoBox {
        /// Box severity.
        severity: Severity,
    },
    /// Inline composition failure.
    ErrorIndicator,
    /// Choice selector.
    Dropdown {
        /// Choices in display order.
        choices: Vec<String>,
        /// Selected index.
        selected: Option<usize>,
    },
    /// Push button.
    Button,
    /// Sequence container with insert/remove/reorder controls.
    List,
    /// One element of a list.
    ListRow {
        /// Element index.
        index: usize,
    },
    /// Tabular sequence.
    Table {
        /// Column headers.
        columns: Vec<String>,
    },
    /// One row of a table.
    TableRow {
        /// Element index.
        index: usize,
    },
    /// Status indicator.
    Indicator,
}

impl UiKind {
    /// Short tag used in outlines.
    #[must_use]
    pub const fn tag(&self) -> &'static str {
        match self {
            Self::Container => "container",
            Self::Foldout { .. } => "foldout",
            Self::Field { .. } => "field",
            Self::Label => "label",
            Self::Title => "title",
            Self::InfoBox { .. } => "info-box",
            Self::ErrorIndicator => "error",
            Self::Dropdown { .. } => "dropdown",
            Self::Button => "button",
            Self::List => "list",
            Self::ListRow { .. } => "row",
            Self::Table { .. } => "table",
            Self::TableRow { .. } => "table-row",
            Self::Indicator => "indicator",
        }
    }
}

/// Margins in host units.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Spacing {
    /// Top margin.
    pub top: i32,
    /// Bottom margin.
    pub bottom: i32,
    /// Left margin.
    pub left: i32,
    /// Right margin.
    pub right: i32,
}

/// One node of a UI tree.
#[derive(Debug, Clone)]
pub struct UiElement {
    /// Node identifier.
    pub id: UiNodeId,
    /// What the node draws.
    pub kind: UiKind,
    /// Lookup name.
    pub name: String,
    /// Class tags.
    pub classes: Vec<String>,
    /// Style sheets attached to the node.
    pub style_sheets: Vec<String>,
    /// Label or message text.
    pub label: String,
    /// Hover text.
    pub tooltip: Option<String>,
    /// State flags.
    pub flags: UiFlags,
    /// Margins.
    pub spacing: Spacing,
    /// Fixed label width.
    pub label_width: Option<f32>,
    /// Displayed value of a field editor.
    pub value: Value,
    /// Parent node.
    pub parent: Option<UiNodeId>,
}

impl UiElement {
    /// Creates a node with default flags.
    #[must_use]
    pub fn new(id: UiNodeId, kind: UiKind) -> Self {
        let mut flags = UiFlags::DEFAULT;
        if matches!(kind, UiKind::Foldout { .. }) {
            flags.set(UiFlags::EXPANDED);
        }
        Self {
            id,
            kind,
            name: String::new(),
            classes: Vec::new(),
            style_sheets: Vec::new(),
            label: String::new(),
            tooltip: None,
            flags,
            spacing: Spacing::default(),
            label_width: None,
            value: Value::Null,
            parent: None,
        }
    }

    /// Returns true if the class is present.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|c| c == class)
    }

    /// Returns true if the node accepts input.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.flags.has(UiFlags::ENABLED)
    }

    /// Returns true if the node is on a live surface.
    #[must_use]
    pub const fn is_attached(&self) -> bool {
        self.flags.has(UiFlags::ATTACHED)
    }

    /// Returns true for an open foldout.
    #[must_use]
    pub const fn is_expanded(&self) -> bool {
        self.flags.has(UiFlags::EXPANDED)
    }
}

/// User interaction delivered to node listeners.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Dropdown selection changed.
    Selected(usize),
    /// Foldout opened or closed.
    Toggled(bool),
    /// Button pressed.
    Clicked,
    /// Field edited by the user.
    Edited(Value),
}
