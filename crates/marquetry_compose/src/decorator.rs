//! # Decorator Contract
//!
//! A decorator is bound to one annotation instance and one data node. The
//! pipeline calls its hooks in a fixed order:
//!
//! ```text
//! pre* → replace? → editor → post* → wrap* (reverse) → on_bound (after attach)
//! ```
//!
//! Every hook defaults to a no-op. Decorators that subscribe to value changes
//! or register timers do so in [`Decorator::on_bound`] and drop them in
//! [`Decorator::release`].

use std::cell::{Cell, RefCell};

use marquetry_core::{AnnotationKind, DataNode, GraphHandle, Severity};
use marquetry_ui::UiNodeId;

use crate::composer::NodeComposer;
use crate::error::DecoratorResult;

/// Outcome of a validator decorator's check.
#[derive(Debug, Clone, PartialEq)]
pub enum Verdict {
    /// The value passes.
    Valid,
    /// The value fails.
    Invalid {
        /// Diagnostic message.
        message: String,
        /// Diagnostic severity.
        severity: Severity,
    },
}

impl Verdict {
    /// Failing verdict.
    #[must_use]
    pub fn invalid(message: impl Into<String>, severity: Severity) -> Self {
        Self::Invalid {
            message: message.into(),
            severity,
        }
    }

    /// Returns true for [`Verdict::Valid`].
    #[must_use]
    pub const fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Pluggable unit contributing UI around one node.
pub trait Decorator {
    /// Kind of the annotation this decorator was built from.
    fn kind(&self) -> AnnotationKind;

    /// Node placed before the field editor.
    fn pre(&mut self, _composer: &NodeComposer, _node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        Ok(None)
    }

    /// Returns true if [`Decorator::replace`] supplies the field editor.
    fn replaces_editor(&self) -> bool {
        false
    }

    /// Replacement for the default field editor.
    fn replace(&mut self, _composer: &NodeComposer, _node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        Ok(None)
    }

    /// Node placed after the field editor.
    fn post(&mut self, _composer: &NodeComposer, _node: &DataNode) -> DecoratorResult<Option<UiNodeId>> {
        Ok(None)
    }

    /// Wraps the accumulated node, returning the new outer node.
    fn wrap(&mut self, _composer: &NodeComposer, _node: &DataNode, inner: UiNodeId) -> DecoratorResult<UiNodeId> {
        Ok(inner)
    }

    /// Runs once the field editor is on a live surface.
    fn on_bound(&mut self, _composer: &NodeComposer, _node: &DataNode, _editor: UiNodeId) -> DecoratorResult<()> {
        Ok(())
    }

    /// Drops subscriptions and timers. Called once by the owning composer.
    fn release(&mut self) {}

    /// Validator check. Non-validators return `None`.
    fn check(&self, _graph: &GraphHandle, _node: &DataNode) -> Option<Verdict> {
        None
    }

    /// Visibility gate. `Some(false)` excludes the node's subtree from
    /// validation.
    fn gate(&self, _graph: &GraphHandle, _node: &DataNode) -> Option<bool> {
        None
    }
}

/// A decorator owned by a composer's disposal stack.
pub(crate) struct DecoratorCell {
    kind: AnnotationKind,
    decorator: RefCell<Box<dyn Decorator>>,
    released: Cell<bool>,
}

impl DecoratorCell {
    pub(crate) fn new(decorator: Box<dyn Decorator>) -> Self {
        Self {
            kind: decorator.kind(),
            decorator: RefCell::new(decorator),
            released: Cell::new(false),
        }
    }

    pub(crate) const fn kind(&self) -> &AnnotationKind {
        &self.kind
    }

    pub(crate) fn is_released(&self) -> bool {
        self.released.get()
    }

    /// Runs a hook unless the decorator is released or already running.
    pub(crate) fn with<R>(&self, hook: impl FnOnce(&mut dyn Decorator) -> R) -> Option<R> {
        if self.released.get() {
            return None;
        }
        let mut decorator = self.decorator.try_borrow_mut().ok()?;
        Some(hook(&mut **decorator))
    }

    /// Releases the decorator. Idempotent.
    pub(crate) fn release(&self) {
        if self.released.replace(true) {
            return;
        }
        match self.decorator.try_borrow_mut() {
            Ok(mut decorator) => decorator.release(),
            // Released from inside its own hook: the flag silences it.
            Err(_) => tracing::debug!(kind = %self.kind, "decorator released while running"),
        }
    }
}
