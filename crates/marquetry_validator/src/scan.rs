//! # Property Scan
//!
//! Resumable breadth-first walk over the nodes of one or more root objects.
//!
//! ```text
//! roots ──► queue ──► next_batch(quota) ──► visit(node) ──► Descend?
//!             ▲                                              │
//!             └──────── unvisited children ◄─────────────────┘
//! ```
//!
//! Every dequeued node counts against the quota, including nodes skipped
//! because their owner was destroyed mid-scan. Nodes are keyed by owner and
//! path, so no node is visited twice even when references loop back.

use std::collections::{HashSet, VecDeque};

use marquetry_core::annotation::split_for_sequence;
use marquetry_core::{DataNode, GraphHandle, ObjectId, PropertyPath};

/// What the scan does after visiting a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    /// Queue the node's children.
    Descend,
    /// Leave the node's subtree out of the scan.
    SkipSubtree,
}

/// Breadth-first scan state.
#[derive(Debug, Default)]
pub struct PropertyScan {
    queue: VecDeque<DataNode>,
    visited: HashSet<(ObjectId, PropertyPath)>,
    processed: usize,
    skipped_dead: usize,
}

impl PropertyScan {
    /// Creates a scan seeded with the root node of every live owner.
    #[must_use]
    pub fn new(graph: &GraphHandle, roots: &[ObjectId]) -> Self {
        let mut scan = Self::default();
        for owner in roots {
            match graph.root(*owner) {
                Ok(node) => scan.enqueue(node),
                Err(err) => tracing::debug!(%owner, error = %err, "scan root unavailable"),
            }
        }
        scan
    }

    fn enqueue(&mut self, node: DataNode) {
        if self.visited.insert((node.owner(), node.path().clone())) {
            self.queue.push_back(node);
        }
    }

    /// Returns true once the queue is drained.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }

    /// Nodes waiting in the queue.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Nodes dequeued so far.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.processed
    }

    /// Nodes dropped because their owner was gone.
    #[must_use]
    pub const fn skipped_dead(&self) -> usize {
        self.skipped_dead
    }

    /// Dequeues at most `quota` nodes, handing each live one to `visit`.
    /// Returns the number dequeued.
    ///
    /// A sequence node is visited with its array-level annotations only;
    /// its elements are queued carrying the element-level ones.
    pub fn next_batch(
        &mut self,
        graph: &GraphHandle,
        quota: usize,
        mut visit: impl FnMut(&DataNode) -> ScanControl,
    ) -> usize {
        let mut dequeued = 0;
        while dequeued < quota {
            let Some(node) = self.queue.pop_front() else {
                break;
            };
            dequeued += 1;
            self.processed += 1;
            if !graph.is_alive(node.owner()) {
                self.skipped_dead += 1;
                continue;
            }

            let (node, element_annotations) = if node.is_sequence() {
                let (array_level, element_level) = split_for_sequence(node.annotations());
                (node.with_annotations(array_level), Some(element_level))
            } else {
                (node, None)
            };
            if visit(&node) == ScanControl::SkipSubtree {
                continue;
            }
            match graph.children(&node) {
                Ok(children) => {
                    for child in children {
                        let child = match &element_annotations {
                            Some(annotations) => child.with_annotations(annotations.clone()),
                            None => child,
                        };
                        self.enqueue(child);
                    }
                }
                Err(err) => tracing::debug!(node = %node, error = %err, "children unavailable during scan"),
            }
        }
        dequeued
    }
}
