//! # Annotations
//!
//! Declarative metadata attached to fields and methods at definition time.
//! Each annotation has a stable kind identifier; decorator registries map
//! kinds to decorator factories.
//!
//! Annotations deserialize from schema documents as internally tagged tables:
//!
//! ```toml
//! annotations = [
//!     { kind = "required" },
//!     { kind = "enable_if", member = "mode", values = ["advanced"] },
//!     { kind = "space", top = 8 },
//! ]
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt;

use serde::Deserialize;

use crate::value::Value;

/// Severity of diagnostics and info boxes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Informational.
    #[default]
    Log,
    /// Suspicious but usable.
    Warning,
    /// Invalid.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Log => "log",
            Self::Warning => "warning",
            Self::Error => "error",
        })
    }
}

/// Accent of a group container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupColor {
    /// Host default.
    #[default]
    Default,
    /// Red accent.
    Red,
    /// Blue accent.
    Blue,
    /// Black accent.
    Black,
    /// Green accent.
    Green,
    /// Yellow accent.
    Yellow,
    /// Orange accent.
    Orange,
    /// Pink accent.
    Pink,
    /// Purple accent.
    Purple,
}

/// Header style of an inlined property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InlineStyle {
    /// Header with the field name.
    #[default]
    WithTitle,
    /// No header.
    WithoutTitle,
    /// No header and no border.
    Borderless,
}

/// Stable identifier of an annotation kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AnnotationKind(Cow<'static, str>);

impl AnnotationKind {
    /// Creates a kind from a static identifier.
    #[must_use]
    pub const fn from_static(id: &'static str) -> Self {
        Self(Cow::Borrowed(id))
    }

    /// Creates a kind from a runtime identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(Cow::Owned(id.into()))
    }

    /// Returns the identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AnnotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Built-in kind identifiers.
pub mod kinds {
    use super::AnnotationKind;

    /// `required`
    pub const REQUIRED: AnnotationKind = AnnotationKind::from_static("required");
    /// `validate_input`
    pub const VALIDATE_INPUT: AnnotationKind = AnnotationKind::from_static("validate_input");
    /// `validate_json`
    pub const VALIDATE_JSON: AnnotationKind = AnnotationKind::from_static("validate_json");
    /// `enable_if`
    pub const ENABLE_IF: AnnotationKind = AnnotationKind::from_static("enable_if");
    /// `space`
    pub const SPACE: AnnotationKind = AnnotationKind::from_static("space");
    /// `title`
    pub const TITLE: AnnotationKind = AnnotationKind::from_static("title");
    /// `info_box`
    pub const INFO_BOX: AnnotationKind = AnnotationKind::from_static("info_box");
    /// `conditional_info_box`
    pub const CONDITIONAL_INFO_BOX: AnnotationKind =
        AnnotationKind::from_static("conditional_info_box");
    /// `read_only`
    pub const READ_ONLY: AnnotationKind = AnnotationKind::from_static("read_only");
    /// `tooltip`
    pub const TOOLTIP: AnnotationKind = AnnotationKind::from_static("tooltip");
    /// `label_width`
    pub const LABEL_WIDTH: AnnotationKind = AnnotationKind::from_static("label_width");
    /// `inline_property`
    pub const INLINE_PROPERTY: AnnotationKind = AnnotationKind::from_static("inline_property");
    /// `box_group`
    pub const BOX_GROUP: AnnotationKind = AnnotationKind::from_static("box_group");
    /// `foldout_group`
    pub const FOLDOUT_GROUP: AnnotationKind = AnnotationKind::from_static("foldout_group");
    /// `min_value`
    pub const MIN_VALUE: AnnotationKind = AnnotationKind::from_static("min_value");
    /// `max_value`
    pub const MAX_VALUE: AnnotationKind = AnnotationKind::from_static("max_value");
    /// `table_list`
    pub const TABLE_LIST: AnnotationKind = AnnotationKind::from_static("table_list");
    /// `force_decoration`
    pub const FORCE_DECORATION: AnnotationKind = AnnotationKind::from_static("force_decoration");
    /// `button`
    pub const BUTTON: AnnotationKind = AnnotationKind::from_static("button");
    /// `on_value_changed`
    pub const ON_VALUE_CHANGED: AnnotationKind = AnnotationKind::from_static("on_value_changed");
    /// `value_dropdown`
    pub const VALUE_DROPDOWN: AnnotationKind = AnnotationKind::from_static("value_dropdown");
    /// `enum_toggle`
    pub const ENUM_TOGGLE: AnnotationKind = AnnotationKind::from_static("enum_toggle");
}

/// A declarative annotation instance.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Annotation {
    /// Value must be set to something other than its default.
    Required {
        /// Custom message.
        #[serde(default)]
        message: Option<String>,
    },
    /// Value must satisfy a named condition.
    ValidateInput {
        /// `true`, `false`, a bool member, or a predicate name.
        condition: String,
        /// Message shown when invalid.
        #[serde(default = "default_invalid_input")]
        message: String,
    },
    /// Text value must parse as JSON.
    ValidateJson,
    /// Shown only while `member` equals one of `values`.
    EnableIf {
        /// Member in the same scope.
        member: String,
        /// Accepted values.
        values: Vec<Value>,
    },
    /// Margins around the field.
    Space {
        /// Top margin.
        #[serde(default)]
        top: i32,
        /// Bottom margin.
        #[serde(default)]
        bottom: i32,
        /// Left margin.
        #[serde(default)]
        left: i32,
        /// Right margin.
        #[serde(default)]
        right: i32,
    },
    /// Title above the field.
    Title {
        /// Title text.
        text: String,
    },
    /// Static message box.
    InfoBox {
        /// Message text.
        message: String,
        /// Box severity.
        #[serde(default)]
        severity: Severity,
    },
    /// Message box shown while `member` equals one of `values`.
    ConditionalInfoBox {
        /// Message text.
        message: String,
        /// Box severity.
        #[serde(default = "default_warning")]
        severity: Severity,
        /// Member in the same scope.
        member: String,
        /// Matching values.
        values: Vec<Value>,
    },
    /// Editor is not editable.
    ReadOnly,
    /// Tooltip on the editor.
    Tooltip {
        /// Tooltip text.
        text: String,
    },
    /// Fixed label width.
    LabelWidth {
        /// Width in host units.
        width: f32,
    },
    /// Children drawn inline instead of in a foldout.
    InlineProperty {
        /// Header style.
        #[serde(default)]
        style: InlineStyle,
    },
    /// Framed group shared by sibling fields.
    BoxGroup {
        /// Group name.
        name: String,
        /// Accent.
        #[serde(default)]
        color: GroupColor,
    },
    /// Collapsible group shared by sibling fields.
    FoldoutGroup {
        /// Group name.
        name: String,
        /// Accent.
        #[serde(default)]
        color: GroupColor,
    },
    /// Lower bound for numeric values.
    MinValue {
        /// Bound.
        value: f64,
    },
    /// Upper bound for numeric values.
    MaxValue {
        /// Bound.
        value: f64,
    },
    /// Sequence drawn as a table.
    TableList,
    /// Forces decoration of the node and its subtree.
    ForceDecoration,
    /// Method exposed as a button.
    Button {
        /// Place inside the collapsible actions panel.
        #[serde(default)]
        sliding_panel: bool,
    },
    /// Calls a method of the enclosing object after the value changes.
    OnValueChanged {
        /// Method name.
        method: String,
    },
    /// Editor replaced by a dropdown over the values of `member`.
    ValueDropdown {
        /// Member in the same scope holding the options.
        member: String,
    },
    /// Enum editor replaced by one toggle button per variant.
    EnumToggle {
        /// Omit the field label.
        #[serde(default)]
        hide_label: bool,
    },
    /// Host-defined annotation.
    Custom {
        /// Kind identifier.
        name: String,
        /// Arbitrary arguments.
        #[serde(default)]
        args: BTreeMap<String, Value>,
        /// Whether it applies to a sequence itself rather than its elements.
        #[serde(default)]
        array_applied: bool,
    },
}

fn default_invalid_input() -> String {
    "Invalid Input".to_string()
}

const fn default_warning() -> Severity {
    Severity::Warning
}

impl Annotation {
    /// Creates a host-defined annotation with no arguments.
    #[must_use]
    pub fn custom(name: impl Into<String>) -> Self {
        Self::Custom {
            name: name.into(),
            args: BTreeMap::new(),
            array_applied: false,
        }
    }

    /// Returns the stable kind identifier.
    #[must_use]
    pub fn kind(&self) -> AnnotationKind {
        match self {
            Self::Required { .. } => kinds::REQUIRED,
            Self::ValidateInput { .. } => kinds::VALIDATE_INPUT,
            Self::ValidateJson => kinds::VALIDATE_JSON,
            Self::EnableIf { .. } => kinds::ENABLE_IF,
            Self::Space { .. } => kinds::SPACE,
            Self::Title { .. } => kinds::TITLE,
            Self::InfoBox { .. } => kinds::INFO_BOX,
            Self::ConditionalInfoBox { .. } => kinds::CONDITIONAL_INFO_BOX,
            Self::ReadOnly => kinds::READ_ONLY,
            Self::Tooltip { .. } => kinds::TOOLTIP,
            Self::LabelWidth { .. } => kinds::LABEL_WIDTH,
            Self::InlineProperty { .. } => kinds::INLINE_PROPERTY,
            Self::BoxGroup { .. } => kinds::BOX_GROUP,
            Self::FoldoutGroup { .. } => kinds::FOLDOUT_GROUP,
            Self::MinValue { .. } => kinds::MIN_VALUE,
            Self::MaxValue { .. } => kinds::MAX_VALUE,
            Self::TableList => kinds::TABLE_LIST,
            Self::ForceDecoration => kinds::FORCE_DECORATION,
            Self::Button { .. } => kinds::BUTTON,
            Self::OnValueChanged { .. } => kinds::ON_VALUE_CHANGED,
            Self::ValueDropdown { .. } => kinds::VALUE_DROPDOWN,
            Self::EnumToggle { .. } => kinds::ENUM_TOGGLE,
            Self::Custom { name, .. } => AnnotationKind::new(name.clone()),
        }
    }

    /// Returns true if the annotation applies to a sequence itself.
    ///
    /// Other annotations on a sequence are redistributed to every element.
    #[must_use]
    pub const fn applies_to_array(&self) -> bool {
        match self {
            Self::ValidateInput { .. }
            | Self::Space { .. }
            | Self::Title { .. }
            | Self::InfoBox { .. }
            | Self::ConditionalInfoBox { .. }
            | Self::BoxGroup { .. }
            | Self::FoldoutGroup { .. }
            | Self::TableList
            | Self::ForceDecoration
            | Self::OnValueChanged { .. } => true,
            Self::Custom { array_applied, .. } => *array_applied,
            _ => false,
        }
    }

    /// Returns true for validator annotations.
    #[must_use]
    pub const fn is_validator(&self) -> bool {
        matches!(
            self,
            Self::Required { .. } | Self::ValidateInput { .. } | Self::ValidateJson
        )
    }

    /// Returns true for annotations that select behaviour without a decorator.
    #[must_use]
    pub const fn is_marker(&self) -> bool {
        matches!(
            self,
            Self::TableList | Self::ForceDecoration | Self::Button { .. }
        )
    }

    /// Returns the group name for group annotations.
    #[must_use]
    pub fn group_name(&self) -> Option<&str> {
        match self {
            Self::BoxGroup { name, .. } | Self::FoldoutGroup { name, .. } => Some(name),
            _ => None,
        }
    }
}

/// Splits a sequence's annotations into array-level and element-level sets.
#[must_use]
pub fn split_for_sequence(annotations: &[Annotation]) -> (Vec<Annotation>, Vec<Annotation>) {
    annotations
        .iter()
        .cloned()
        .partition(Annotation::applies_to_array)
}
