//! # MARQUETRY Core
//!
//! Data model and host object graph access for the Marquetry composition
//! engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                      OBJECT GRAPH                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  TypeCatalog → MemoryGraph (ObjectGraph) → GraphHandle   │
//! │       ↓              ↓                         ↓         │
//! │  Annotations     DataNodes              Watchers / Undo  │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Threading
//!
//! Graph access is single-threaded: a [`GraphHandle`] is `Rc` based and
//! lives on the host's main thread. Persisted settings are `Send + Sync`
//! and may be shared across composers.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod annotation;
pub mod config;
pub mod error;
pub mod graph;
pub mod handle;
pub mod memory;
pub mod node;
pub mod path;
pub mod persistence;
pub mod scheduler;
pub mod schema;
pub mod settings;
pub mod value;

pub use annotation::{Annotation, AnnotationKind, GroupColor, InlineStyle, Severity};
pub use config::{ComposerConfig, MarquetryConfig, StyleConfig, ValidatorConfig};
pub use error::{ConfigError, CoreError, CoreResult};
pub use graph::{MemberValue, MethodInfo, ObjectGraph};
pub use handle::{GraphHandle, Subscription, WeakGraph};
pub use memory::MemoryGraph;
pub use node::{DataNode, NodeKind, ObjectId};
pub use path::{PathSegment, PropertyPath};
pub use persistence::{MemoryStore, PersistenceStore, SharedStore, TomlFileStore};
pub use scheduler::{Scheduler, TimerGuard};
pub use schema::{EnumSchema, FieldSchema, FieldType, MethodSchema, TypeCatalog, TypeSchema};
pub use settings::{IgnoreList, Toggles};
pub use value::{ObjectValue, Value};
