//! Runs every validator annotation of every reachable node.

use marquetry_compose::{Decorator, Verdict};
use marquetry_core::{DataNode, ObjectId, Severity};

use crate::error::ValidatorResult;
use crate::log::ValidatorLog;
use crate::module::{StepOutcome, ValidationContext, ValidatorModule};
use crate::scan::{PropertyScan, ScanControl};

/// Display name of [`AnnotationChecker`].
pub const ANNOTATION_CHECKER: &str = "Annotation Checker";

/// Breadth-first check of `required`, `validate_input`, `validate_json`
/// and any custom validator kind, skipping subtrees whose visibility gate
/// is closed.
#[derive(Default)]
pub struct AnnotationChecker {
    scan: Option<PropertyScan>,
}

impl AnnotationChecker {
    /// Creates the module.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_node(context: &ValidationContext, node: &DataNode, logs: &mut Vec<ValidatorLog>) -> ScanControl {
    if node.annotations().is_empty() {
        return ScanControl::Descend;
    }
    let graph = context.graph();
    let mut decorators: Vec<Box<dyn Decorator>> = Vec::with_capacity(node.annotations().len());
    for annotation in node.annotations() {
        match context.registry().create(annotation) {
            Some(Ok(decorator)) => decorators.push(decorator),
            Some(Err(err)) => {
                tracing::warn!(node = %node, error = %err, "validator decorator unavailable");
                logs.push(entry(context, node, Severity::Warning, err.to_string()));
            }
            None => {}
        }
    }

    if decorators.iter().any(|d| d.gate(graph, node) == Some(false)) {
        tracing::trace!(node = %node, "subtree gated out of validation");
        return ScanControl::SkipSubtree;
    }
    for decorator in &decorators {
        if let Some(Verdict::Invalid { message, severity }) = decorator.check(graph, node) {
            logs.push(entry(context, node, severity, message));
        }
    }
    ScanControl::Descend
}

fn entry(
    context: &ValidationContext,
    node: &DataNode,
    severity: Severity,
    message: String,
) -> ValidatorLog {
    ValidatorLog::new(ANNOTATION_CHECKER, severity, message)
        .with_target(node.owner(), context.location_of(node.owner()))
        .with_path(node.path().clone())
}

impl ValidatorModule for AnnotationChecker {
    fn name(&self) -> &str {
        ANNOTATION_CHECKER
    }

    fn start(&mut self, context: &ValidationContext, roots: &[ObjectId]) {
        self.scan = Some(PropertyScan::new(context.graph(), roots));
    }

    fn step(
        &mut self,
        context: &ValidationContext,
        quota: usize,
        logs: &mut Vec<ValidatorLog>,
    ) -> ValidatorResult<StepOutcome> {
        let Some(scan) = self.scan.as_mut() else {
            return Ok(StepOutcome::done(0));
        };
        let processed = scan.next_batch(context.graph(), quota, |node| check_node(context, node, logs));
        if scan.is_finished() {
            tracing::debug!(nodes = scan.processed(), dead = scan.skipped_dead(), "annotation scan finished");
            self.scan = None;
            return Ok(StepOutcome::done(processed));
        }
        Ok(StepOutcome::pending(processed))
    }
}
