//! # Validator Module Contract
//!
//! A module is one independent check. The coordinator calls
//! [`ValidatorModule::start`] once per run and then
//! [`ValidatorModule::step`] with a node quota on every scheduler tick until
//! the module reports it is done.

use std::sync::Arc;

use marquetry_compose::DecoratorRegistry;
use marquetry_core::{GraphHandle, ObjectId, Toggles, ValidatorConfig};

use crate::error::ValidatorResult;
use crate::log::ValidatorLog;

/// What every module may read during a run.
#[derive(Clone)]
pub struct ValidationContext {
    graph: GraphHandle,
    registry: Arc<DecoratorRegistry>,
    toggles: Toggles,
    config: ValidatorConfig,
}

impl ValidationContext {
    /// Creates a context over the built-in decorator registry.
    #[must_use]
    pub fn new(graph: GraphHandle, toggles: Toggles, config: ValidatorConfig) -> Self {
        Self {
            graph,
            registry: DecoratorRegistry::builtin(),
            toggles,
            config,
        }
    }

    /// Replaces the decorator registry.
    #[must_use]
    pub fn with_registry(mut self, registry: Arc<DecoratorRegistry>) -> Self {
        self.registry = registry;
        self
    }

    /// Graph under validation.
    #[must_use]
    pub const fn graph(&self) -> &GraphHandle {
        &self.graph
    }

    /// Registry validators are built from.
    #[must_use]
    pub fn registry(&self) -> &DecoratorRegistry {
        &self.registry
    }

    /// Persisted toggles.
    #[must_use]
    pub const fn toggles(&self) -> &Toggles {
        &self.toggles
    }

    /// Validator settings.
    #[must_use]
    pub const fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    /// Location label of an owner, falling back to the configured one.
    #[must_use]
    pub fn location_of(&self, owner: ObjectId) -> String {
        let name = self.graph.read(|g| g.location_name(owner));
        if name.is_empty() {
            self.config.location_name.clone()
        } else {
            name
        }
    }
}

/// Work done by one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepOutcome {
    /// Units of the quota consumed.
    pub processed: usize,
    /// True once the module has nothing left to do this run.
    pub finished: bool,
}

impl StepOutcome {
    /// Step that consumed `processed` units and has more to do.
    #[must_use]
    pub const fn pending(processed: usize) -> Self {
        Self {
            processed,
            finished: false,
        }
    }

    /// Step that completed the module's run.
    #[must_use]
    pub const fn done(processed: usize) -> Self {
        Self {
            processed,
            finished: true,
        }
    }
}

/// An independent validation check.
pub trait ValidatorModule {
    /// Display name, used in logs and by the enabled-module filter.
    fn name(&self) -> &str;

    /// Returns true if the module only runs on full scans.
    fn full_scan_only(&self) -> bool {
        false
    }

    /// Resets the module for a run over `roots`.
    fn start(&mut self, context: &ValidationContext, roots: &[ObjectId]);

    /// Processes at most `quota` units, appending failures to `logs`.
    ///
    /// # Errors
    ///
    /// Returns an error when the module cannot continue. The coordinator
    /// isolates the failure and finishes the module.
    fn step(
        &mut self,
        context: &ValidationContext,
        quota: usize,
        logs: &mut Vec<ValidatorLog>,
    ) -> ValidatorResult<StepOutcome>;
}
