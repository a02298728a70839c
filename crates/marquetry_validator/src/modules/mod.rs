//! Built-in validator modules.

pub mod annotation_checker;
pub mod decoration;
pub mod missing_type;
pub mod reference_checker;

pub use annotation_checker::AnnotationChecker;
pub use decoration::DecorationEnabledCheck;
pub use missing_type::MissingTypeChecker;
pub use reference_checker::ReferenceChecker;

use crate::module::ValidatorModule;

/// Every built-in module, in run order.
#[must_use]
pub fn builtin_modules() -> Vec<Box<dyn ValidatorModule>> {
    vec![
        Box::new(DecorationEnabledCheck::default()),
        Box::new(MissingTypeChecker::default()),
        Box::new(AnnotationChecker::default()),
        Box::new(ReferenceChecker::default()),
    ]
}
