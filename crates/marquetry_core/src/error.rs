//! # Core Error Types
//!
//! All errors that can occur while reading or mutating an object graph,
//! and while loading configuration.

use std::path::PathBuf;

use thiserror::Error;

use crate::node::ObjectId;
use crate::path::PropertyPath;

/// Errors raised by object graph access.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// The owning object no longer exists.
    #[error("object {0} was destroyed")]
    DeadObject(ObjectId),

    /// No value lives at the given path.
    #[error("no property at {path} on object {owner}")]
    PathNotFound {
        /// Owning object.
        owner: ObjectId,
        /// Missing path.
        path: PropertyPath,
    },

    /// A type name is not present in the type catalog.
    #[error("unknown type: {0}")]
    UnknownType(String),

    /// The written value does not fit the declared type.
    #[error("type mismatch at {path}: expected {expected}, found {found}")]
    TypeMismatch {
        /// Target path.
        path: PropertyPath,
        /// Declared type.
        expected: String,
        /// Offered value kind.
        found: String,
    },

    /// A sequence operation was attempted on a non-sequence node.
    #[error("{0} is not a sequence")]
    NotASequence(PropertyPath),

    /// A sequence index is out of range.
    #[error("index {index} out of range for {path} (len {len})")]
    IndexOutOfRange {
        /// Sequence path.
        path: PropertyPath,
        /// Requested index.
        index: usize,
        /// Current length.
        len: usize,
    },

    /// A commit was requested without an open transaction.
    #[error("no open transaction")]
    NoTransaction,

    /// A method could not be found on the node's runtime type.
    #[error("method {method} not found on {type_name}")]
    MethodNotFound {
        /// Runtime type searched.
        type_name: String,
        /// Requested method name.
        method: String,
    },

    /// A method ran and reported failure.
    #[error("method {method} failed: {reason}")]
    MethodFailed {
        /// Method name.
        method: String,
        /// Failure reason.
        reason: String,
    },
}

/// Result type for graph operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised while loading configuration or documents.
#[derive(Error, Debug)]
pub enum ConfigError {
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
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),

    /// The content parsed but is not meaningful.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}
