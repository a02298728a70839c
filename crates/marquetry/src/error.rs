//! Document loading errors.

use std::path::PathBuf;

use thiserror::Error;

use marquetry_core::CoreError;

/// Errors raised while turning a document into an object graph.
#[derive(Error, Debug)]
pub enum LoadError {
    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File path.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: std::io::Error,
    },

    /// The TOML could not be parsed.
    #[error("invalid document: {0}")]
    Parse(#[from] toml::de::Error),

    /// The type catalog refused an operation.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// A value names a field its type does not declare.
    #[error("{type_name} has no field {field}")]
    UnknownField {
        /// Object type.
        type_name: String,
        /// Offending field.
        field: String,
    },

    /// A value does not fit its declared type.
    #[error("{path}: expected {expected}, found {found}")]
    Mismatch {
        /// Document location.
        path: String,
        /// Declared type.
        expected: String,
        /// Offered value kind.
        found: &'static str,
    },

    /// A polymorphic value names a type outside the slot's base.
    #[error("{path}: {type_name} is not assignable to {base}")]
    NotAssignable {
        /// Document location.
        path: String,
        /// Offered type.
        type_name: String,
        /// Declared base.
        base: String,
    },
}

/// Result type for document loading.
pub type LoadResult<T> = Result<T, LoadError>;
