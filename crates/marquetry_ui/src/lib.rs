//! # MARQUETRY UI
//!
//! Host UI node abstraction consumed by the composer:
//! - Retained tree with class tagging and attach/detach lifecycle
//! - One-shot attach callbacks and value event listeners
//! - Style sheet assets and an outline renderer
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │                      UI PIPELINE                       │
//! ├────────────────────────────────────────────────────────┤
//! │  Composer → UiHandle → UiTree → UiRenderer (outline)   │
//! │                ↓          ↓                            │
//! │        attach / events  classes, flags                 │
//! └────────────────────────────────────────────────────────┘
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod handle;
pub mod node;
pub mod render;
pub mod style;
pub mod tree;

pub use handle::UiHandle;
pub use node::{Binding, EditorKind, Spacing, UiElement, UiEvent, UiFlags, UiKind, UiNodeId};
pub use render::{RenderCommand, UiRenderer};
pub use style::{Color, Style, StyleBook, StyleError, StyleSheet, Theme};
pub use tree::{UiTree, HIDE_CLASS};
