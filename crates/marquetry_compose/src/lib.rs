//! # MARQUETRY Compose
//!
//! Turns data nodes into UI trees, running each node's annotations through
//! the decorator pipeline.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                     NODE COMPOSER                        │
//! ├──────────────────────────────────────────────────────────┤
//! │  DataNode → IntrospectionCache → editor / list / slot    │
//! │                  ↓                        ↓              │
//! │          DecoratorRegistry  →  pipeline (pre, replace,   │
//! │                                post, wrap, on_bound)     │
//! │                  ↓                                       │
//! │           DisposalScope  →  release on dispose           │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Lifetimes
//!
//! A [`NodeComposer`] owns every decorator, subscription and timer it
//! creates. [`NodeComposer::dispose`] releases all of them; after that no
//! callback it registered does anything.

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod cache;
pub mod composer;
pub mod decorator;
pub mod decorators;
pub mod editors;
pub mod error;
pub mod list;
pub mod methods;
pub mod pipeline;
pub mod polymorphic;
pub mod registry;

pub use cache::{DecorationLookup, IntrospectionCache};
pub use composer::{foldout_key, ComposerBuilder, DisposalScope, NodeComposer, NodeFilter, WeakComposer};
pub use decorator::{Decorator, Verdict};
pub use editors::{EditorFactory, EditorRegistry};
pub use error::{ComposeError, ComposeResult, DecoratorError, DecoratorResult};
pub use pipeline::apply_decorators;
pub use registry::{DecoratorFactory, DecoratorRegistry};
