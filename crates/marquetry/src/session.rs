//! # Inspector Session
//!
//! One host frame:
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ 1. SCHEDULER TICK                                        │
//! │    └─ recurring decorator timers (enable_if polling)     │
//! │ 2. VALIDATOR TICK                                        │
//! │    └─ at most `batch_quota` property entries             │
//! │ 3. RENDER (on demand)                                    │
//! │    └─ outline of every composed root                     │
//! └──────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;

use marquetry_compose::{ComposeResult, NodeComposer};
use marquetry_core::{GraphHandle, MarquetryConfig, ObjectId, Scheduler, SharedStore};
use marquetry_ui::{UiHandle, UiNodeId, UiRenderer};
use marquetry_validator::{LogCounters, RunState, ValidationContext, Validator, ValidatorLog};

/// Work done in one frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameStats {
    /// Timers fired by the scheduler.
    pub timers_fired: usize,
    /// Property entries the validator processed.
    pub validated: usize,
    /// Validator state after the frame.
    pub state: RunState,
}

/// A composed inspector over a set of root objects, with its validator.
pub struct InspectorSession {
    composer: NodeComposer,
    validator: Validator,
    roots: Vec<ObjectId>,
    views: Vec<(ObjectId, UiNodeId)>,
    quota: usize,
}

impl InspectorSession {
    /// Creates a session. Nothing is composed until [`Self::compose_all`].
    #[must_use]
    pub fn new(graph: GraphHandle, roots: Vec<ObjectId>, config: &MarquetryConfig, store: SharedStore) -> Self {
        let composer = NodeComposer::builder(graph.clone(), UiHandle::new())
            .scheduler(Scheduler::new())
            .store(Arc::clone(&store))
            .config(config)
            .build();
        let context = ValidationContext::new(graph, composer.toggles().clone(), config.validator.clone());
        Self {
            composer,
            validator: Validator::with_builtins(context),
            roots,
            views: Vec::new(),
            quota: config.validator.batch_quota,
        }
    }

    /// The composer.
    #[must_use]
    pub const fn composer(&self) -> &NodeComposer {
        &self.composer
    }

    /// The validator.
    #[must_use]
    pub const fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Mutable access to the validator, e.g. to filter modules.
    pub fn validator_mut(&mut self) -> &mut Validator {
        &mut self.validator
    }

    /// Root objects of the session.
    #[must_use]
    pub fn roots(&self) -> &[ObjectId] {
        &self.roots
    }

    /// Composed root containers.
    #[must_use]
    pub fn views(&self) -> &[(ObjectId, UiNodeId)] {
        &self.views
    }

    /// Composes and attaches every root. Previous views are removed first.
    ///
    /// # Errors
    ///
    /// Fails on the first root that cannot be composed.
    pub fn compose_all(&mut self) -> ComposeResult<()> {
        for (_, view) in self.views.drain(..) {
            self.composer.ui().remove(view);
        }
        for &owner in &self.roots {
            let view = self.composer.compose_object(owner)?;
            self.composer.ui().attach_root(view);
            self.views.push((owner, view));
        }
        tracing::debug!(views = self.views.len(), "session composed");
        Ok(())
    }

    /// Starts a validation run over every root.
    pub fn validate(&mut self, full_scan: bool) {
        self.validator.start(&self.roots, full_scan);
    }

    /// Advances one host frame.
    pub fn frame(&mut self) -> FrameStats {
        let timers_fired = self.composer.scheduler().tick();
        let state = self.validator.tick(self.quota);
        FrameStats {
            timers_fired,
            validated: self.validator.last_tick_processed(),
            state,
        }
    }

    /// Runs frames until validation is idle. Returns the frame count.
    pub fn settle(&mut self) -> usize {
        let mut frames = 0;
        loop {
            frames += 1;
            if self.frame().state == RunState::Idle {
                return frames;
            }
        }
    }

    /// Logs of the current or last validation run.
    #[must_use]
    pub fn logs(&self) -> &[ValidatorLog] {
        self.validator.logs()
    }

    /// Log counters of the current or last validation run.
    #[must_use]
    pub fn counters(&self) -> LogCounters {
        self.validator.counters()
    }

    /// Plain-text outline of every composed root.
    #[must_use]
    pub fn render(&self) -> String {
        let mut renderer = UiRenderer::default();
        renderer.begin_frame();
        let styles = self.composer.styles();
        self.composer.ui().read(|tree| {
            for &(_, view) in &self.views {
                renderer.render(tree, styles, view);
            }
        });
        renderer.to_text()
    }

    /// Releases every decorator and subscription.
    pub fn close(self) {
        self.composer.dispose();
    }
}
