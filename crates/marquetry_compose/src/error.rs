//! Composition error types.

use thiserror::Error;

use marquetry_core::{AnnotationKind, CoreError};
use marquetry_ui::StyleError;

/// Errors that abort composition of a root inspector.
///
/// Everything below the root is recovered locally and rendered as an inline
/// error indicator instead.
#[derive(Error, Debug)]
pub enum ComposeError {
    /// Required style assets are not registered.
    #[error("cannot open inspector: {0}")]
    MissingStyles(#[from] StyleError),

    /// The graph refused an operation.
    #[error(transparent)]
    Graph(#[from] CoreError),

    /// A specialized editor failed to build.
    #[error("editor for {type_name} failed: {reason}")]
    Editor {
        /// Edited type.
        type_name: String,
        /// Failure description.
        reason: String,
    },

    /// The composer was disposed.
    #[error("composer has been disposed")]
    Disposed,
}

/// Result type for composition.
pub type ComposeResult<T> = Result<T, ComposeError>;

/// Failure of a decorator constructor or hook.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecoratorError {
    /// A factory received an annotation of another kind.
    #[error("decorator for {expected} cannot be built from {found}")]
    WrongAnnotation {
        /// Kind the factory builds.
        expected: AnnotationKind,
        /// Kind it received.
        found: AnnotationKind,
    },

    /// The annotation does not fit the node it is declared on.
    #[error("{kind} is not applicable to {path}")]
    NotApplicable {
        /// Annotation kind.
        kind: AnnotationKind,
        /// Node path.
        path: String,
    },

    /// A hook failed.
    #[error("{kind} failed: {reason}")]
    Failed {
        /// Annotation kind.
        kind: AnnotationKind,
        /// Failure description.
        reason: String,
    },

    /// The graph refused an operation.
    #[error(transparent)]
    Graph(#[from] CoreError),
}

/// Result type for decorator hooks.
pub type DecoratorResult<T> = Result<T, DecoratorError>;
