//! Warns when decorated composition is switched off.

use marquetry_core::{ObjectId, Severity};

use crate::error::ValidatorResult;
use crate::log::{AutoFix, ValidatorLog};
use crate::module::{StepOutcome, ValidationContext, ValidatorModule};

/// Display name of [`DecorationEnabledCheck`].
pub const DECORATION_CHECK: &str = "Decoration Enabled Check";

/// Message of the disabled-decoration warning.
pub const DECORATION_DISABLED_MESSAGE: &str =
    "Decorated composition is disabled. Annotations are neither drawn nor checked in the inspector.";

/// Single-step check of the persisted decoration toggle.
#[derive(Default)]
pub struct DecorationEnabledCheck {
    pending: bool,
}

impl ValidatorModule for DecorationEnabledCheck {
    fn name(&self) -> &str {
        DECORATION_CHECK
    }

    fn full_scan_only(&self) -> bool {
        true
    }

    fn start(&mut self, _context: &ValidationContext, _roots: &[ObjectId]) {
        self.pending = true;
    }

    fn step(
        &mut self,
        context: &ValidationContext,
        _quota: usize,
        logs: &mut Vec<ValidatorLog>,
    ) -> ValidatorResult<StepOutcome> {
        if !std::mem::take(&mut self.pending) {
            return Ok(StepOutcome::done(0));
        }
        if !context.toggles().decoration_enabled() {
            logs.push(
                ValidatorLog::new(DECORATION_CHECK, Severity::Warning, DECORATION_DISABLED_MESSAGE)
                    .with_fix(AutoFix::EnableDecoration),
            );
        }
        Ok(StepOutcome::done(1))
    }
}
