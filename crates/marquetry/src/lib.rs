//! # MARQUETRY
//!
//! Reflection-driven inspector composition for runtime object graphs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            MARQUETRY                                │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │                                                                     │
//! │  ┌─────────────────┐     ┌─────────────────┐     ┌───────────────┐  │
//! │  │   core          │────>│   compose       │────>│   ui          │  │
//! │  │                 │     │                 │     │               │  │
//! │  │  • DataNode     │     │  • NodeComposer │     │  • UiTree     │  │
//! │  │  • ObjectGraph  │     │  • Decorators   │     │  • StyleBook  │  │
//! │  │  • Schemas      │     │  • Lists, Slots │     │  • Renderer   │  │
//! │  └────────┬────────┘     └────────┬────────┘     └───────────────┘  │
//! │           │                       │                                 │
//! │           │              ┌────────┴────────┐                        │
//! │           └─────────────>│   validator     │                        │
//! │                          │  • PropertyScan │                        │
//! │                          │  • Modules      │                        │
//! │                          └─────────────────┘                        │
//! │                                                                     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `loader`: TOML documents (types + objects) into a [`MemoryGraph`](core::MemoryGraph)
//! - `session`: composed views plus a validator, driven one frame at a time

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod error;
pub mod loader;
pub mod session;

pub use marquetry_compose as compose;
pub use marquetry_core as core;
pub use marquetry_ui as ui;
pub use marquetry_validator as validator;

pub use error::{LoadError, LoadResult};
pub use loader::{load_file, load_str, LoadedDocument};
pub use session::{FrameStats, InspectorSession};

pub use marquetry_compose::{Decorator, DecoratorRegistry, NodeComposer, Verdict};
pub use marquetry_core::{
    Annotation, DataNode, GraphHandle, MarquetryConfig, MemoryGraph, ObjectGraph, ObjectId, PropertyPath, Value,
};
pub use marquetry_ui::{UiHandle, UiNodeId, UiRenderer};
pub use marquetry_validator::{Validator, ValidatorLog};
