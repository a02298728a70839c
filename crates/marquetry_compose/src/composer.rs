//! # Node Composer
//!
//! Builds the UI of one data node and, recursively, of its subtree.
//!
//! ## Branches
//!
//! ```text
//! compose(node)
//!   ├─ filtered?                  → None
//!   ├─ decoration not required    → default editor → pipeline
//!   └─ decoration required
//!        ├─ sequence              → list / table   → array-level pipeline
//!        ├─ polymorphic slot      → type selector + rebuilt children
//!        ├─ has children
//!        │    ├─ specialized editor for the type
//!        │    ├─ opaque math type → single-row editor
//!        │    └─ foldout or flat children + methods → pipeline
//!        └─ leaf                  → bound editor   → pipeline
//! ```
//!
//! ## Lifetime
//!
//! Every decorator, subscription and timer created while composing is pushed
//! on the composer's disposal stack. [`NodeComposer::dispose`] releases them
//! in reverse order and clears the introspection cache; dropping the last
//! handle does the same. UI callbacks only hold a [`WeakComposer`] and go
//! quiet once the composer is disposed.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use marquetry_core::annotation::{kinds, split_for_sequence};
use marquetry_core::{
    ComposerConfig, DataNode, GraphHandle, IgnoreList, MarquetryConfig, MemoryStore, NodeKind,
    ObjectId, PathSegment, PropertyPath, Scheduler, Severity, SharedStore, Subscription,
    TimerGuard, Toggles,
};
use marquetry_ui::{StyleBook, UiEvent, UiHandle, UiKind, UiNodeId};

use crate::cache::{DecorationLookup, IntrospectionCache};
use crate::decorator::DecoratorCell;
use crate::editors::{self, EditorRegistry};
use crate::error::{ComposeError, ComposeResult};
use crate::registry::DecoratorRegistry;
use crate::{list, methods, pipeline, polymorphic};

/// Persistence scope of foldout expansion state.
pub const FOLDOUT_SCOPE: &str = "marquetry.foldouts";

/// Class of inline composition failures.
pub const COMPOSITION_ERROR_CLASS: &str = "composition-error";

/// Class of validation message boxes.
pub const VALIDATION_ERROR_CLASS: &str = "validation-error";

/// Class of foldouts holding nested fields.
pub const NESTED_FIELD_CLASS: &str = "nested-field-property";

/// Message shown for objects whose type has no schema.
pub const MISSING_TYPE_MESSAGE: &str = "The type of this object is missing.";

/// External node filter. Returning false hides the node.
pub type NodeFilter = Rc<dyn Fn(&DataNode) -> bool>;

type GroupKey = (ObjectId, Option<PropertyPath>, String);

/// A resource released by a composer or disposal scope.
enum Disposable {
    Decorator(Rc<DecoratorCell>),
    Subscription(Subscription),
    Timer(TimerGuard),
    Scope(DisposalScope),
}

impl Disposable {
    fn release(self) {
        match self {
            Self::Decorator(cell) => cell.release(),
            Self::Subscription(subscription) => subscription.cancel(),
            Self::Timer(timer) => timer.cancel(),
            Self::Scope(scope) => scope.release(),
        }
    }
}

/// A region of the UI that is rebuilt at runtime. Releasing it drops the
/// resources of the previous build.
#[derive(Clone, Default)]
pub struct DisposalScope {
    items: Rc<RefCell<Vec<Disposable>>>,
}

impl DisposalScope {
    /// Releases everything registered in the scope, newest first.
    pub fn release(&self) {
        let items = std::mem::take(&mut *self.items.borrow_mut());
        for item in items.into_iter().rev() {
            item.release();
        }
    }

    /// Number of live resources.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }
}

struct ComposerState {
    graph: GraphHandle,
    ui: UiHandle,
    scheduler: Scheduler,
    registry: Arc<DecoratorRegistry>,
    editors: Arc<EditorRegistry>,
    styles: Arc<StyleBook>,
    store: SharedStore,
    ignore: Arc<IgnoreList>,
    toggles: Toggles,
    config: ComposerConfig,
    required_styles: Vec<String>,
    cache: IntrospectionCache,
    filter: RefCell<Option<NodeFilter>>,
    disposal: RefCell<Vec<Disposable>>,
    scopes: RefCell<Vec<DisposalScope>>,
    groups: RefCell<HashMap<GroupKey, UiNodeId>>,
    disposed: Cell<bool>,
}

impl ComposerState {
    fn dispose(&self) {
        if self.disposed.replace(true) {
            return;
        }
        self.scopes.borrow_mut().clear();
        let items = std::mem::take(&mut *self.disposal.borrow_mut());
        let released = items.len();
        for item in items.into_iter().rev() {
            item.release();
        }
        self.groups.borrow_mut().clear();
        self.cache.clear();
        tracing::debug!(released, "composer disposed");
    }

    fn register(&self, item: Disposable) {
        if self.disposed.get() {
            item.release();
            return;
        }
        let scope = self.scopes.borrow().last().cloned();
        match scope {
            Some(scope) => scope.items.borrow_mut().push(item),
            None => self.disposal.borrow_mut().push(item),
        }
    }
}

impl Drop for ComposerState {
    fn drop(&mut self) {
        self.dispose();
    }
}

/// Shared handle to a composer.
#[derive(Clone)]
pub struct NodeComposer {
    state: Rc<ComposerState>,
}

/// Non-owning composer handle held by UI callbacks.
#[derive(Clone)]
pub struct WeakComposer {
    state: Weak<ComposerState>,
}

impl WeakComposer {
    /// Upgrades while the composer lives.
    #[must_use]
    pub fn upgrade(&self) -> Option<NodeComposer> {
        self.state.upgrade().map(|state| NodeComposer { state })
    }
}

/// Builder for [`NodeComposer`].
pub struct ComposerBuilder {
    graph: GraphHandle,
    ui: UiHandle,
    scheduler: Option<Scheduler>,
    registry: Option<Arc<DecoratorRegistry>>,
    editors: Option<Arc<EditorRegistry>>,
    styles: Option<Arc<StyleBook>>,
    store: Option<SharedStore>,
    ignore: Option<Arc<IgnoreList>>,
    config: MarquetryConfig,
}

impl ComposerBuilder {
    /// Host scheduler driving recurring timers.
    #[must_use]
    pub fn scheduler(mut self, scheduler: Scheduler) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Decorator registry. Defaults to the built-in one.
    #[must_use]
    pub fn registry(mut self, registry: Arc<DecoratorRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Specialized editors.
    #[must_use]
    pub fn editors(mut self, editors: Arc<EditorRegistry>) -> Self {
        self.editors = Some(editors);
        self
    }

    /// Style assets. Defaults to the built-in book.
    #[must_use]
    pub fn styles(mut self, styles: Arc<StyleBook>) -> Self {
        self.styles = Some(styles);
        self
    }

    /// Persistence for UI state and toggles. Defaults to an in-memory store.
    #[must_use]
    pub fn store(mut self, store: SharedStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Shared ignore list. Defaults to one loaded from the store.
    #[must_use]
    pub fn ignore_list(mut self, ignore: Arc<IgnoreList>) -> Self {
        self.ignore = Some(ignore);
        self
    }

    /// Configuration.
    #[must_use]
    pub fn config(mut self, config: &MarquetryConfig) -> Self {
        self.config = config.clone();
        self
    }

    /// Builds the composer.
    #[must_use]
    pub fn build(self) -> NodeComposer {
        let store = self.store.unwrap_or_else(MemoryStore::shared);
        let ignore = self.ignore.unwrap_or_else(|| {
            Arc::new(IgnoreList::load(
                Arc::clone(&store),
                &self.config.composer.ignored_type_names,
            ))
        });
        let toggles = Toggles::new(Arc::clone(&store), self.config.composer.decoration_enabled);
        NodeComposer {
            state: Rc::new(ComposerState {
                graph: self.graph,
                ui: self.ui,
                scheduler: self.scheduler.unwrap_or_default(),
                registry: self.registry.unwrap_or_else(DecoratorRegistry::builtin),
                editors: self.editors.unwrap_or_default(),
                styles: self.styles.unwrap_or_else(|| Arc::new(StyleBook::builtin())),
                store,
                ignore,
                toggles,
                config: self.config.composer,
                required_styles: self.config.styles.required,
                cache: IntrospectionCache::new(),
                filter: RefCell::new(None),
                disposal: RefCell::new(Vec::new()),
                scopes: RefCell::new(Vec::new()),
                groups: RefCell::new(HashMap::new()),
                disposed: Cell::new(false),
            }),
        }
    }
}

impl NodeComposer {
    /// Starts building a composer over a graph and a UI tree.
    #[must_use]
    pub fn builder(graph: GraphHandle, ui: UiHandle) -> ComposerBuilder {
        ComposerBuilder {
            graph,
            ui,
            scheduler: None,
            registry: None,
            editors: None,
            styles: None,
            store: None,
            ignore: None,
            config: MarquetryConfig::default(),
        }
    }

    /// Weak handle for callbacks.
    #[must_use]
    pub fn downgrade(&self) -> WeakComposer {
        WeakComposer {
            state: Rc::downgrade(&self.state),
        }
    }

    /// Graph being composed.
    #[must_use]
    pub fn graph(&self) -> &GraphHandle {
        &self.state.graph
    }

    /// UI tree being built.
    #[must_use]
    pub fn ui(&self) -> &UiHandle {
        &self.state.ui
    }

    /// Host scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Scheduler {
        &self.state.scheduler
    }

    /// Decorator registry.
    #[must_use]
    pub fn registry(&self) -> &DecoratorRegistry {
        &self.state.registry
    }

    /// Style assets.
    #[must_use]
    pub fn styles(&self) -> &StyleBook {
        &self.state.styles
    }

    /// Persistence for UI state.
    #[must_use]
    pub fn store(&self) -> &SharedStore {
        &self.state.store
    }

    /// Persisted toggles.
    #[must_use]
    pub fn toggles(&self) -> &Toggles {
        &self.state.toggles
    }

    /// Type-name ignore list.
    #[must_use]
    pub fn ignore_list(&self) -> &IgnoreList {
        &self.state.ignore
    }

    /// Composer settings.
    #[must_use]
    pub fn config(&self) -> &ComposerConfig {
        &self.state.config
    }

    /// Introspection cache of this composer.
    #[must_use]
    pub fn cache(&self) -> &IntrospectionCache {
        &self.state.cache
    }

    /// Returns true while decorators run.
    #[must_use]
    pub fn decoration_enabled(&self) -> bool {
        self.state.toggles.decoration_enabled()
    }

    /// Returns true once disposed.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.state.disposed.get()
    }

    /// Installs an external node filter.
    pub fn set_filter(&self, filter: impl Fn(&DataNode) -> bool + 'static) {
        *self.state.filter.borrow_mut() = Some(Rc::new(filter));
    }

    /// Current external filter.
    #[must_use]
    pub fn filter(&self) -> Option<NodeFilter> {
        self.state.filter.borrow().clone()
    }

    /// Returns false for nodes hidden by configuration or the filter.
    #[must_use]
    pub fn accepts(&self, node: &DataNode) -> bool {
        let hidden = matches!(
            node.path().last(),
            Some(PathSegment::Field(name)) if self.state.config.hidden_property_names.contains(name)
        );
        !hidden && self.filter().map_or(true, |filter| filter(node))
    }

    /// Memoized "node or subtree needs decoration".
    pub fn requires_decoration(&self, node: &DataNode) -> bool {
        let lookup = DecorationLookup {
            graph: &self.state.graph,
            registry: &self.state.registry,
            ignore: &self.state.ignore,
        };
        self.state.cache.requires_decoration(node, &lookup)
    }

    /// Composes one node. `None` if the node is filtered out.
    pub fn compose(&self, node: &DataNode, force: bool, use_foldout: bool) -> Option<UiNodeId> {
        if self.is_disposed() || !self.accepts(node) {
            return None;
        }
        let force = force || node.has_annotation(&kinds::FORCE_DECORATION);
        let decorate = self.decoration_enabled() && (force || self.requires_decoration(node));
        if !decorate {
            let editor = editors::default_editor(self, node);
            return Some(pipeline::apply_decorators(self, node, editor, node.annotations()));
        }
        Some(match node.kind() {
            NodeKind::Sequence => {
                let (array_level, element_level) = split_for_sequence(node.annotations());
                let list = list::compose_sequence(self, node, &element_level, force);
                pipeline::apply_decorators(self, node, list, &array_level)
            }
            NodeKind::Polymorphic => polymorphic::compose_slot(self, node, force),
            _ if node.has_visible_children() => {
                let editor = self.compose_structured(node, force, use_foldout);
                pipeline::apply_decorators(self, node, editor, node.annotations())
            }
            _ => {
                let editor = editors::bound_field(self, node);
                pipeline::apply_decorators(self, node, editor, node.annotations())
            }
        })
    }

    fn compose_structured(&self, node: &DataNode, force: bool, use_foldout: bool) -> UiNodeId {
        if let Some(result) = self.state.editors.create(self, node) {
            return result.unwrap_or_else(|err| {
                tracing::warn!(node = %node, error = %err, "specialized editor failed");
                let container = self.ui().create(UiKind::Container);
                let indicator = self.error_indicator(node, &err);
                self.ui().append(container, indicator);
                let fallback = editors::default_editor(self, node);
                self.ui().append(container, fallback);
                container
            });
        }
        if self.state.config.opaque_math_types.contains(&node.type_name()) {
            return editors::bound_field(self, node);
        }
        let container = if use_foldout {
            let foldout = self.persistent_foldout(node.display_name(), &foldout_key(node));
            self.ui().add_class(foldout, NESTED_FIELD_CLASS);
            foldout
        } else {
            self.ui().create(UiKind::Container)
        };
        self.ui().edit_element(container, |e| e.name = node.path().to_string());
        self.compose_children_into(node, container, force);
        container
    }

    /// Composes every visible child of `node` into `container`, followed by
    /// the node's methods block.
    pub fn compose_children_into(&self, node: &DataNode, container: UiNodeId, force: bool) {
        match self.graph().children(node) {
            Ok(children) => {
                for child in &children {
                    if let Some(id) = self.compose(child, force, true) {
                        self.ui().append(container, id);
                    }
                }
            }
            Err(err) => {
                let indicator = self.error_indicator(node, &err);
                self.ui().append(container, indicator);
            }
        }
        if let Some(block) = methods::compose_methods(self, node) {
            self.ui().append(container, block);
        }
    }

    /// Composes the inspector of a root object.
    ///
    /// Fails only when required style assets are missing or the object is
    /// gone; everything else is reported inline.
    pub fn compose_object(&self, owner: ObjectId) -> ComposeResult<UiNodeId> {
        if self.is_disposed() {
            return Err(ComposeError::Disposed);
        }
        self.state.styles.require(&self.state.required_styles)?;
        let root_node = self.graph().root(owner)?;
        let ui = self.ui();
        let root = ui.create_labeled(UiKind::Container, root_node.display_name());
        ui.edit_element(root, |e| {
            e.name = format!("inspector {owner}");
            e.style_sheets.clone_from(&self.state.required_styles);
        });
        ui.add_class(root, "inspector-root");

        if !self.graph().read(|g| g.type_known(owner)) {
            let notice = ui.create_labeled(UiKind::InfoBox { severity: Severity::Error }, MISSING_TYPE_MESSAGE);
            ui.add_class(notice, "missing-type");
            ui.append(root, notice);
        }
        self.compose_children_into(&root_node, root, false);

        if !self.decoration_enabled() || self.state.cache.any_required() {
            let indicator = self.decoration_indicator();
            ui.append(root, indicator);
        }
        tracing::debug!(%owner, nodes = ui.read(|t| t.iter_dfs(root).count()), "inspector composed");
        Ok(root)
    }

    fn decoration_indicator(&self) -> UiNodeId {
        let ui = self.ui();
        let indicator = ui.create_labeled(UiKind::Indicator, "Decoration");
        ui.add_class(indicator, "decoration-indicator");
        ui.edit_element(indicator, |e| {
            e.tooltip = Some("Toggle decorated composition".to_string());
        });
        set_indicator_state(ui, indicator, self.decoration_enabled());
        let weak = self.downgrade();
        ui.on_event(indicator, move |event| {
            if !matches!(event, UiEvent::Clicked) {
                return;
            }
            let Some(composer) = weak.upgrade().filter(|c| !c.is_disposed()) else {
                return;
            };
            let enabled = !composer.decoration_enabled();
            composer.toggles().set_decoration_enabled(enabled);
            set_indicator_state(composer.ui(), indicator, enabled);
        });
        indicator
    }

    /// Foldout whose expansion state persists under `key`.
    pub fn persistent_foldout(&self, title: &str, key: &str) -> UiNodeId {
        let ui = self.ui();
        let foldout = ui.create(UiKind::Foldout { title: title.to_string() });
        let expanded = self.store().load_bool(FOLDOUT_SCOPE, key, true);
        ui.set_expanded_silently(foldout, expanded);
        let store = Arc::clone(self.store());
        let key = key.to_string();
        ui.on_event(foldout, move |event| {
            if let UiEvent::Toggled(open) = event {
                store.save_bool(FOLDOUT_SCOPE, &key, *open);
            }
        });
        foldout
    }

    /// Shared container of a named group among the node's siblings.
    ///
    /// Returns the container and whether it was created by this call.
    pub fn group_container(
        &self,
        node: &DataNode,
        name: &str,
        create: impl FnOnce() -> UiNodeId,
    ) -> (UiNodeId, bool) {
        let key = (node.owner(), node.path().parent(), name.to_string());
        let existing = self.state.groups.borrow().get(&key).copied();
        if let Some(id) = existing.filter(|id| self.ui().read(|t| t.contains(*id))) {
            return (id, false);
        }
        let id = create();
        self.state.groups.borrow_mut().insert(key, id);
        (id, true)
    }

    /// Inline error indicator for a failed contribution.
    pub fn error_indicator(&self, node: &DataNode, error: &dyn fmt::Display) -> UiNodeId {
        tracing::warn!(node = %node, error = %error, "composition error");
        let id = self.ui().create_labeled(UiKind::ErrorIndicator, error.to_string());
        self.ui().add_class(id, COMPOSITION_ERROR_CLASS);
        id
    }

    pub(crate) fn register_decorator(&self, cell: Rc<DecoratorCell>) {
        self.state.register(Disposable::Decorator(cell));
    }

    /// Keeps a subscription alive until the composer (or the current
    /// disposal scope) is released.
    pub fn retain_subscription(&self, subscription: Subscription) {
        self.state.register(Disposable::Subscription(subscription));
    }

    /// Keeps a timer alive until the composer (or the current disposal
    /// scope) is released.
    pub fn retain_timer(&self, timer: TimerGuard) {
        self.state.register(Disposable::Timer(timer));
    }

    /// New disposal scope registered in the current one.
    pub fn new_scope(&self) -> DisposalScope {
        let scope = DisposalScope::default();
        self.state.register(Disposable::Scope(scope.clone()));
        scope
    }

    /// Runs `build` with `scope` receiving every resource it registers.
    pub fn within_scope<R>(&self, scope: &DisposalScope, build: impl FnOnce() -> R) -> R {
        self.state.scopes.borrow_mut().push(scope.clone());
        let result = build();
        self.state.scopes.borrow_mut().pop();
        result
    }

    /// Number of resources on the disposal stack, scopes counted once.
    #[must_use]
    pub fn disposal_len(&self) -> usize {
        self.state.disposal.borrow().len()
    }

    /// Releases every decorator, subscription and timer, newest first, and
    /// clears the cache. Idempotent.
    pub fn dispose(&self) {
        self.state.dispose();
    }
}

/// Persistence key of a node's foldout.
#[must_use]
pub fn foldout_key(node: &DataNode) -> String {
    format!("{}:{}", node.owner(), node.path())
}

fn set_indicator_state(ui: &UiHandle, indicator: UiNodeId, enabled: bool) {
    ui.set_class(indicator, "indicator-enabled", enabled);
    ui.set_class(indicator, "indicator-disabled", !enabled);
}
