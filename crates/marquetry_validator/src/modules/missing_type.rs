//! Reports root objects whose type has no known schema.

use std::collections::VecDeque;

use marquetry_compose::composer::MISSING_TYPE_MESSAGE;
use marquetry_core::{ObjectId, Severity};

use crate::error::ValidatorResult;
use crate::log::ValidatorLog;
use crate::module::{StepOutcome, ValidationContext, ValidatorModule};

/// Display name of [`MissingTypeChecker`].
pub const MISSING_TYPE_CHECKER: &str = "Missing Type Checker";

/// Checks one root object per quota unit.
#[derive(Default)]
pub struct MissingTypeChecker {
    pending: VecDeque<ObjectId>,
}

impl ValidatorModule for MissingTypeChecker {
    fn name(&self) -> &str {
        MISSING_TYPE_CHECKER
    }

    fn start(&mut self, _context: &ValidationContext, roots: &[ObjectId]) {
        self.pending = roots.iter().copied().collect();
    }

    fn step(
        &mut self,
        context: &ValidationContext,
        quota: usize,
        logs: &mut Vec<ValidatorLog>,
    ) -> ValidatorResult<StepOutcome> {
        let graph = context.graph();
        let mut processed = 0;
        while processed < quota {
            let Some(owner) = self.pending.pop_front() else {
                break;
            };
            processed += 1;
            if graph.is_alive(owner) && !graph.read(|g| g.type_known(owner)) {
                logs.push(
                    ValidatorLog::new(MISSING_TYPE_CHECKER, Severity::Error, MISSING_TYPE_MESSAGE)
                        .with_target(owner, context.location_of(owner)),
                );
            }
        }
        Ok(if self.pending.is_empty() {
            StepOutcome::done(processed)
        } else {
            StepOutcome::pending(processed)
        })
    }
}
