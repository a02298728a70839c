//! Validator error types.

use thiserror::Error;

use marquetry_compose::DecoratorError;
use marquetry_core::CoreError;

/// Failure of a validator module step.
///
/// Module failures never stop a run: the coordinator logs them and turns
/// them into an error entry naming the module.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidatorError {
    /// The graph refused an operation.
    #[error(transparent)]
    Graph(#[from] CoreError),

    /// A validator decorator could not be built.
    #[error(transparent)]
    Decorator(#[from] DecoratorError),

    /// A module gave up for its own reasons.
    #[error("module {module} failed: {reason}")]
    ModuleFailed {
        /// Module display name.
        module: String,
        /// Failure description.
        reason: String,
    },
}

/// Result type for validator modules.
pub type ValidatorResult<T> = Result<T, ValidatorError>;
