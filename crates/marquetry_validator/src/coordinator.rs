//! # Validator Coordinator
//!
//! Drives every enabled module through one validation run:
//!
//! ```text
//!          start(roots)                 tick(quota) …
//!   Idle ───────────────► Scanning ───────────────────► Idle
//!                          │  module 0 → module 1 → …
//!                          └─ quota shared across modules per tick
//! ```
//!
//! Logs are merged in module order and replaced by the next run.

use std::collections::HashSet;

use marquetry_core::{ObjectId, Severity};

use crate::log::{AutoFix, LogCounters, ValidatorLog};
use crate::module::{ValidationContext, ValidatorModule};
use crate::modules::builtin_modules;

/// Coordinator state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// No run in progress.
    Idle,
    /// A run has work left.
    Scanning,
}

struct ModuleSlot {
    module: Box<dyn ValidatorModule>,
    active: bool,
}

/// Aggregates validator modules over one graph.
pub struct Validator {
    context: ValidationContext,
    modules: Vec<ModuleSlot>,
    enabled: Option<HashSet<String>>,
    logs: Vec<ValidatorLog>,
    state: RunState,
    cursor: usize,
    last_tick: usize,
    runs: u64,
}

impl Validator {
    /// Creates a coordinator without modules.
    #[must_use]
    pub fn new(context: ValidationContext) -> Self {
        Self {
            context,
            modules: Vec::new(),
            enabled: None,
            logs: Vec::new(),
            state: RunState::Idle,
            cursor: 0,
            last_tick: 0,
            runs: 0,
        }
    }

    /// Creates a coordinator holding every built-in module.
    #[must_use]
    pub fn with_builtins(context: ValidationContext) -> Self {
        let mut validator = Self::new(context);
        for module in builtin_modules() {
            validator.add_module(module);
        }
        validator
    }

    /// Appends a module. Modules run in insertion order.
    pub fn add_module(&mut self, module: Box<dyn ValidatorModule>) {
        self.modules.push(ModuleSlot { module, active: false });
    }

    /// Restricts runs to the named modules. `None` enables all.
    pub fn set_enabled_modules(&mut self, names: Option<HashSet<String>>) {
        self.enabled = names;
    }

    /// Names of every registered module.
    #[must_use]
    pub fn module_names(&self) -> Vec<&str> {
        self.modules.iter().map(|slot| slot.module.name()).collect()
    }

    /// Shared run context.
    #[must_use]
    pub const fn context(&self) -> &ValidationContext {
        &self.context
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> RunState {
        self.state
    }

    /// Units processed by the most recent tick.
    #[must_use]
    pub const fn last_tick_processed(&self) -> usize {
        self.last_tick
    }

    /// Runs started so far.
    #[must_use]
    pub const fn runs(&self) -> u64 {
        self.runs
    }

    fn is_enabled(&self, name: &str) -> bool {
        self.enabled.as_ref().map_or(true, |names| names.contains(name))
    }

    /// Starts a run over `roots`, discarding the previous run's logs.
    /// Modules flagged full-scan-only take part only when `full_scan` is set.
    pub fn start(&mut self, roots: &[ObjectId], full_scan: bool) {
        self.logs.clear();
        self.cursor = 0;
        self.runs += 1;
        let mut active = 0;
        for index in 0..self.modules.len() {
            let wanted = {
                let module = &self.modules[index].module;
                (full_scan || !module.full_scan_only()) && self.is_enabled(module.name())
            };
            let slot = &mut self.modules[index];
            slot.active = wanted;
            if wanted {
                slot.module.start(&self.context, roots);
                active += 1;
            }
        }
        self.state = if active == 0 { RunState::Idle } else { RunState::Scanning };
        tracing::debug!(roots = roots.len(), modules = active, full_scan, "validation started");
    }

    /// Advances the run by at most `quota` units shared across modules.
    pub fn tick(&mut self, quota: usize) -> RunState {
        self.last_tick = 0;
        if self.state == RunState::Idle {
            return RunState::Idle;
        }
        let quota = quota.max(1);
        while self.cursor < self.modules.len() && self.last_tick < quota {
            let slot = &mut self.modules[self.cursor];
            if !slot.active {
                self.cursor += 1;
                continue;
            }
            let remaining = quota - self.last_tick;
            match slot.module.step(&self.context, remaining, &mut self.logs) {
                Ok(outcome) => {
                    self.last_tick += outcome.processed.min(remaining);
                    if outcome.finished {
                        slot.active = false;
                        self.cursor += 1;
                    } else if outcome.processed == 0 {
                        // Stalled until something outside the run changes.
                        break;
                    }
                }
                Err(err) => {
                    let name = slot.module.name().to_string();
                    tracing::error!(module = %name, error = %err, "validator module failed");
                    self.logs.push(ValidatorLog::new(
                        name.clone(),
                        Severity::Error,
                        format!("Validator module {name} failed: {err}"),
                    ));
                    slot.active = false;
                    self.cursor += 1;
                }
            }
        }
        if self.cursor >= self.modules.len() {
            self.state = RunState::Idle;
            let counters = self.counters();
            tracing::debug!(
                errors = counters.errors,
                warnings = counters.warnings,
                comments = counters.comments,
                "validation finished"
            );
        }
        self.state
    }

    /// Ticks until the run finishes. Returns the number of ticks used.
    pub fn run_to_completion(&mut self, quota: usize) -> usize {
        let mut ticks = 0;
        while self.state == RunState::Scanning {
            self.tick(quota);
            ticks += 1;
        }
        ticks
    }

    /// Logs of the current or last run, in module order.
    #[must_use]
    pub fn logs(&self) -> &[ValidatorLog] {
        &self.logs
    }

    /// Per-severity totals of [`Validator::logs`].
    #[must_use]
    pub fn counters(&self) -> LogCounters {
        LogCounters::from_logs(&self.logs)
    }

    /// Applies the repair attached to a log. Returns false if it has none.
    pub fn apply_fix(&self, log: &ValidatorLog) -> bool {
        match log.fix() {
            Some(AutoFix::EnableDecoration) => {
                self.context.toggles().set_decoration_enabled(true);
                tracing::debug!("decoration enabled by auto-fix");
                true
            }
            None => false,
        }
    }
}
