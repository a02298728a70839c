//! Style assets for composed inspectors.
//!
//! Style sheets are TOML documents mapping class names to styles:
//!
//! ```toml
//! [classes.validation-error]
//! text = "#e53935"
//! ```

use std::collections::{BTreeMap, HashMap};

use serde::Deserialize;
use thiserror::Error;

use marquetry_core::Severity;

/// RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    /// Red component (0-1).
    pub r: f32,
    /// Green component (0-1).
    pub g: f32,
    /// Blue component (0-1).
    pub b: f32,
    /// Alpha component (0-1).
    pub a: f32,
}

impl Color {
    /// Solid white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Info blue.
    pub const INFO: Self = Self::rgb(0.35, 0.6, 0.95);
    /// Warning amber.
    pub const WARNING: Self = Self::rgb(1.0, 0.7, 0.1);
    /// Error red.
    pub const ERROR: Self = Self::rgb(0.9, 0.22, 0.21);

    /// Creates a color from RGBA values (0-1).
    #[must_use]
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Creates a color from RGB values (0-1) with full alpha.
    #[must_use]
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// Parses `#rrggbb` or `#rrggbbaa`.
    pub fn parse_hex(text: &str) -> Result<Self, StyleError> {
        let invalid = || StyleError::InvalidColor(text.to_string());
        let digits = text.strip_prefix('#').ok_or_else(invalid)?;
        if digits.len() != 6 && digits.len() != 8 {
            return Err(invalid());
        }
        let channel = |i: usize| -> Result<f32, StyleError> {
            let byte = digits
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(invalid)?;
            Ok(f32::from(byte) / 255.0)
        };
        let a = if digits.len() == 8 { channel(6)? } else { 1.0 };
        Ok(Self::rgba(channel(0)?, channel(2)?, channel(4)?, a))
    }

    /// Converts to array format.
    #[must_use]
    pub const fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl TryFrom<String> for Color {
    type Error = StyleError;

    fn try_from(text: String) -> Result<Self, StyleError> {
        Self::parse_hex(&text)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Errors raised while loading style assets.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StyleError {
    /// A color literal could not be parsed.
    #[error("invalid color: {0}")]
    InvalidColor(String),

    /// A style sheet document could not be parsed.
    #[error("invalid style sheet {name}: {reason}")]
    InvalidSheet {
        /// Sheet name.
        name: String,
        /// Parser message.
        reason: String,
    },

    /// Sheets required by the composer are not registered.
    #[error("missing style sheets: {}", .0.join(", "))]
    Missing(Vec<String>),
}

/// Style of one class.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Text color.
    pub text: Option<Color>,
    /// Border color.
    pub border: Option<Color>,
    /// Indentation added to the subtree.
    pub indent: u16,
}

/// Named collection of class styles.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StyleSheet {
    /// Sheet name.
    #[serde(skip)]
    pub name: String,
    /// Styles by class.
    #[serde(default)]
    pub classes: BTreeMap<String, Style>,
}

impl StyleSheet {
    /// Creates an empty sheet.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            classes: BTreeMap::new(),
        }
    }

    /// Parses a TOML style sheet.
    pub fn from_toml(name: &str, text: &str) -> Result<Self, StyleError> {
        let mut sheet: Self = toml::from_str(text).map_err(|err| StyleError::InvalidSheet {
            name: name.to_string(),
            reason: err.to_string(),
        })?;
        sheet.name = name.to_string();
        Ok(sheet)
    }

    /// Builder-style class rule.
    #[must_use]
    pub fn rule(mut self, class: &str, style: Style) -> Self {
        self.classes.insert(class.to_string(), style);
        self
    }
}

/// Complete theme for composed inspectors.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Text color.
    pub text: Color,
    /// Muted text color.
    pub text_muted: Color,
    /// Log color.
    pub log: Color,
    /// Warning color.
    pub warning: Color,
    /// Error color.
    pub error: Color,
}

impl Theme {
    /// Dark inspector theme.
    pub const DARK: Self = Self {
        text: Color::rgb(0.85, 0.85, 0.85),
        text_muted: Color::rgb(0.5, 0.5, 0.5),
        log: Color::INFO,
        warning: Color::WARNING,
        error: Color::ERROR,
    };

    /// Color of a severity.
    #[must_use]
    pub const fn severity(&self, severity: Severity) -> Color {
        match severity {
            Severity::Log => self.log,
            Severity::Warning => self.warning,
            Severity::Error => self.error,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::DARK
    }
}

/// Registry of style sheets.
#[derive(Debug, Clone, Default)]
pub struct StyleBook {
    sheets: HashMap<String, StyleSheet>,
}

impl StyleBook {
    /// Creates an empty book.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Book holding the built-in `global` and `composer` sheets.
    #[must_use]
    pub fn builtin() -> Self {
        let mut book = Self::new();
        book.register(StyleSheet::new("global").rule(
            "composition-error",
            Style {
                text: Some(Color::ERROR),
                ..Style::default()
            },
        ));
        book.register(
            StyleSheet::new("composer")
                .rule(
                    "validation-error",
                    Style {
                        text: Some(Color::ERROR),
                        ..Style::default()
                    },
                )
                .rule(
                    "box-group",
                    Style {
                        border: Some(Color::rgb(0.3, 0.3, 0.3)),
                        indent: 1,
                        ..Style::default()
                    },
                ),
        );
        book
    }

    /// Adds or replaces a sheet.
    pub fn register(&mut self, sheet: StyleSheet) {
        self.sheets.insert(sheet.name.clone(), sheet);
    }

    /// Looks up a sheet.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&StyleSheet> {
        self.sheets.get(name)
    }

    /// Returns true if the sheet is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.sheets.contains_key(name)
    }

    /// Checks that every named sheet is registered.
    pub fn require(&self, names: &[String]) -> Result<(), StyleError> {
        let missing: Vec<String> = names.iter().filter(|n| !self.contains(n)).cloned().collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(StyleError::Missing(missing))
        }
    }

    /// Style of a class in any of the named sheets; later sheets win.
    #[must_use]
    pub fn resolve(&self, sheets: &[String], class: &str) -> Option<&Style> {
        sheets
            .iter()
            .rev()
            .filter_map(|name| self.sheets.get(name))
            .find_map(|sheet| sheet.classes.get(class))
    }
}
