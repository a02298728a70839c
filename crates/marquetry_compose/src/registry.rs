//! # Decorator Registry
//!
//! Maps a stable annotation kind to the factory building its decorator.
//! The built-in registry is created once per process and is read-only
//! afterwards; hosts needing extra kinds build their own with
//! [`DecoratorRegistry::with_builtins`] and [`DecoratorRegistry::register`].

use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use marquetry_core::{Annotation, AnnotationKind};

use crate::decorator::Decorator;
use crate::decorators;
use crate::error::DecoratorResult;

/// Builds a decorator for one annotation instance.
pub type DecoratorFactory = Arc<dyn Fn(&Annotation) -> DecoratorResult<Box<dyn Decorator>> + Send + Sync>;

/// Annotation kind → decorator factory.
#[derive(Clone, Default)]
pub struct DecoratorRegistry {
    factories: HashMap<AnnotationKind, DecoratorFactory>,
}

impl DecoratorRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding every built-in decorator.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        decorators::register_builtins(&mut registry);
        registry
    }

    /// Shared built-in registry.
    #[must_use]
    pub fn builtin() -> Arc<Self> {
        static BUILTIN: OnceLock<Arc<DecoratorRegistry>> = OnceLock::new();
        Arc::clone(BUILTIN.get_or_init(|| {
            let registry = Self::with_builtins();
            tracing::debug!(kinds = registry.len(), "built-in decorator registry ready");
            Arc::new(registry)
        }))
    }

    /// Registers or replaces the factory of a kind.
    pub fn register(
        &mut self,
        kind: AnnotationKind,
        factory: impl Fn(&Annotation) -> DecoratorResult<Box<dyn Decorator>> + Send + Sync + 'static,
    ) {
        self.factories.insert(kind, Arc::new(factory));
    }

    /// Returns true if the kind has a factory.
    #[must_use]
    pub fn contains(&self, kind: &AnnotationKind) -> bool {
        self.factories.contains_key(kind)
    }

    /// Returns true if the annotation drives composition: it has a decorator
    /// or is a behaviour marker.
    #[must_use]
    pub fn recognizes(&self, annotation: &Annotation) -> bool {
        annotation.is_marker() || self.contains(&annotation.kind())
    }

    /// Builds the decorator of an annotation. `None` for kinds without one.
    #[must_use]
    pub fn create(&self, annotation: &Annotation) -> Option<DecoratorResult<Box<dyn Decorator>>> {
        let factory = self.factories.get(&annotation.kind())?;
        Some(factory(annotation))
    }

    /// Registered kinds, sorted.
    #[must_use]
    pub fn kinds(&self) -> Vec<AnnotationKind> {
        let mut kinds: Vec<_> = self.factories.keys().cloned().collect();
        kinds.sort();
        kinds
    }

    /// Number of registered kinds.
    #[must_use]
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    /// Returns true if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use marquetry_core::annotation::kinds;

    use super::*;
    use crate::error::DecoratorError;

    #[test]
    fn test_builtins_cover_decorated_kinds() {
        let registry = DecoratorRegistry::builtin();
        for kind in [
            kinds::REQUIRED,
            kinds::VALIDATE_INPUT,
            kinds::VALIDATE_JSON,
            kinds::ENABLE_IF,
            kinds::SPACE,
            kinds::TITLE,
            kinds::INFO_BOX,
            kinds::CONDITIONAL_INFO_BOX,
            kinds::READ_ONLY,
            kinds::TOOLTIP,
            kinds::LABEL_WIDTH,
            kinds::INLINE_PROPERTY,
            kinds::BOX_GROUP,
            kinds::FOLDOUT_GROUP,
            kinds::MIN_VALUE,
            kinds::MAX_VALUE,
        ] {
            assert!(registry.contains(&kind), "{kind} missing");
        }
        assert!(!registry.contains(&kinds::TABLE_LIST));
        assert!(registry.recognizes(&Annotation::TableList));
        assert!(!registry.recognizes(&Annotation::custom("unknown")));
        assert!(registry.create(&Annotation::custom("unknown")).is_none());
    }

    #[test]
    fn test_custom_kind_registration() {
        let mut registry = DecoratorRegistry::with_builtins();
        let before = registry.len();
        registry.register(AnnotationKind::new("highlight"), |annotation| {
            Err(DecoratorError::Failed {
                kind: annotation.kind(),
                reason: "not today".into(),
            })
        });
        assert_eq!(registry.len(), before + 1);
        assert!(registry.recognizes(&Annotation::custom("highlight")));
        assert!(matches!(
            registry.create(&Annotation::custom("highlight")),
            Some(Err(DecoratorError::Failed { .. }))
        ));
    }
}
