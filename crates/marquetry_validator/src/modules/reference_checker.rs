//! Reports reference fields pointing at destroyed objects.

use marquetry_core::{DataNode, NodeKind, ObjectId, Severity, Value};

use crate::error::ValidatorResult;
use crate::log::ValidatorLog;
use crate::module::{StepOutcome, ValidationContext, ValidatorModule};
use crate::scan::{PropertyScan, ScanControl};

/// Display name of [`ReferenceChecker`].
pub const REFERENCE_CHECKER: &str = "Null Reference Checker";

/// Breadth-first scan for dangling references. Empty references are
/// allowed.
#[derive(Default)]
pub struct ReferenceChecker {
    scan: Option<PropertyScan>,
}

impl ReferenceChecker {
    /// Creates the module.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn check_node(context: &ValidationContext, node: &DataNode, logs: &mut Vec<ValidatorLog>) -> ScanControl {
    if node.kind() != NodeKind::Reference {
        return ScanControl::Descend;
    }
    if let Ok(Value::Reference(Some(target))) = context.graph().value(node) {
        if !context.graph().is_alive(target) {
            logs.push(
                ValidatorLog::new(
                    REFERENCE_CHECKER,
                    Severity::Error,
                    format!("{} references destroyed object {target}.", node.display_name()),
                )
                .with_target(node.owner(), context.location_of(node.owner()))
                .with_path(node.path().clone()),
            );
        }
    }
    ScanControl::Descend
}

impl ValidatorModule for ReferenceChecker {
    fn name(&self) -> &str {
        REFERENCE_CHECKER
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
            tracing::debug!(nodes = scan.processed(), "reference scan finished");
            self.scan = None;
            return Ok(StepOutcome::done(processed));
        }
        Ok(StepOutcome::pending(processed))
    }
}

#[cfg(test)]
mod tests {
    use marquetry_core::{
        FieldSchema, FieldType, GraphHandle, MemoryGraph, MemoryStore, Toggles, TypeCatalog, TypeSchema,
        ValidatorConfig,
    };

    use super::*;

    #[test]
    fn test_dangling_references_are_reported() {
        let catalog = TypeCatalog::new()
            .with(TypeSchema::new("Item"))
            .with(
                TypeSchema::new("Slot")
                    .field(FieldSchema::new("held", FieldType::Reference("Item".into())))
                    .field(FieldSchema::new("spare", FieldType::Reference("Item".into())))
                    .field(FieldSchema::new(
                        "extras",
                        FieldType::Sequence(Box::new(FieldType::Reference("Item".into()))),
                    )),
            );
        let mut graph = MemoryGraph::new(catalog);
        let sword = graph.spawn("sword", "Item").unwrap();
        let slot = graph.spawn("slot", "Slot").unwrap();
        let graph = GraphHandle::new(graph);
        let fields = graph.children(&graph.root(slot).unwrap()).unwrap();
        graph.write(&fields[0], Value::Reference(Some(sword))).unwrap();
        graph
            .insert_element(&fields[2], 0, Some(Value::Reference(Some(sword))))
            .unwrap();
        let context = ValidationContext::new(
            graph.clone(),
            Toggles::new(MemoryStore::shared(), true),
            ValidatorConfig::default(),
        );

        let run = || {
            let mut module = ReferenceChecker::new();
            module.start(&context, &[slot]);
            let mut logs = Vec::new();
            while !module.step(&context, 2, &mut logs).unwrap().finished {}
            logs
        };
        assert!(run().is_empty());

        assert!(graph.destroy(sword));
        let logs = run();
        let paths: Vec<String> = logs.iter().map(|l| l.path().unwrap().to_string()).collect();
        assert_eq!(paths, vec!["held".to_string(), "extras[0]".to_string()]);
        assert!(logs.iter().all(|l| l.severity() == Severity::Error));
        assert_eq!(logs[0].location(), "slot");
    }
}
