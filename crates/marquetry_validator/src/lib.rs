//! # MARQUETRY Validator
//!
//! Incremental validation of object graphs, driven by host scheduler ticks.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                       VALIDATOR                          │
//! ├──────────────────────────────────────────────────────────┤
//! │  start(roots) → modules (AnnotationChecker, …)           │
//! │                    ↓                                     │
//! │            PropertyScan (BFS, visited set)               │
//! │                    ↓                                     │
//! │  decorator gate / check  →  ValidatorLog  →  counters    │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scheduling
//!
//! A run never processes more than the tick's quota synchronously. The
//! host calls [`Validator::tick`] once per frame until it reports
//! [`RunState::Idle`].

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod coordinator;
pub mod error;
pub mod log;
pub mod module;
pub mod modules;
pub mod scan;

pub use coordinator::{RunState, Validator};
pub use error::{ValidatorError, ValidatorResult};
pub use log::{AutoFix, LogCounters, ValidatorLog};
pub use module::{StepOutcome, ValidationContext, ValidatorModule};
pub use modules::{
    builtin_modules, AnnotationChecker, DecorationEnabledCheck, MissingTypeChecker, ReferenceChecker,
};
pub use scan::{PropertyScan, ScanControl};
