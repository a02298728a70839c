//! # Validator Logs
//!
//! Immutable diagnostic entries produced by a validation run, plus the
//! per-severity counters the coordinator exposes.

use std::fmt;

use marquetry_core::{GraphHandle, ObjectId, PropertyPath, Severity};

/// Automatic repair offered with a log entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoFix {
    /// Turns decorated composition back on.
    EnableDecoration,
}

impl fmt::Display for AutoFix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EnableDecoration => f.write_str("Enable decoration"),
        }
    }
}

/// One diagnostic entry.
///
/// The target is held by identifier only; it may have been destroyed since
/// the entry was written.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatorLog {
    severity: Severity,
    message: String,
    module: String,
    target: Option<ObjectId>,
    location: String,
    path: Option<PropertyPath>,
    fix: Option<AutoFix>,
}

impl ValidatorLog {
    /// Creates an entry without a target.
    #[must_use]
    pub fn new(module: impl Into<String>, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            severity,
            message: message.into(),
            module: module.into(),
            target: None,
            location: String::new(),
            path: None,
            fix: None,
        }
    }

    /// Sets the target object and its location label.
    #[must_use]
    pub fn with_target(mut self, target: ObjectId, location: impl Into<String>) -> Self {
        self.target = Some(target);
        self.location = location.into();
        self
    }

    /// Sets the offending property.
    #[must_use]
    pub fn with_path(mut self, path: PropertyPath) -> Self {
        self.path = Some(path);
        self
    }

    /// Attaches an automatic repair.
    #[must_use]
    pub const fn with_fix(mut self, fix: AutoFix) -> Self {
        self.fix = Some(fix);
        self
    }

    /// Entry severity.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        self.severity
    }

    /// Icon name of the severity.
    #[must_use]
    pub const fn icon(&self) -> &'static str {
        match self.severity {
            Severity::Log => "icon-info",
            Severity::Warning => "icon-warning",
            Severity::Error => "icon-error",
        }
    }

    /// Diagnostic message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Name of the module that wrote the entry.
    #[must_use]
    pub fn module(&self) -> &str {
        &self.module
    }

    /// Target object, if any.
    #[must_use]
    pub const fn target(&self) -> Option<ObjectId> {
        self.target
    }

    /// Location label of the target.
    #[must_use]
    pub fn location(&self) -> &str {
        &self.location
    }

    /// Offending property, if any.
    #[must_use]
    pub const fn path(&self) -> Option<&PropertyPath> {
        self.path.as_ref()
    }

    /// Offered repair, if any.
    #[must_use]
    pub const fn fix(&self) -> Option<AutoFix> {
        self.fix
    }

    /// Returns true while the target still exists. Entries without a
    /// target are always live.
    #[must_use]
    pub fn is_target_alive(&self, graph: &GraphHandle) -> bool {
        self.target.map_or(true, |owner| graph.is_alive(owner))
    }
}

impl fmt::Display for ValidatorLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.severity, self.module)?;
        if !self.location.is_empty() {
            write!(f, " {}", self.location)?;
        }
        if let Some(path) = &self.path {
            write!(f, " {path}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Per-severity totals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogCounters {
    /// Informational entries.
    pub comments: usize,
    /// Warnings.
    pub warnings: usize,
    /// Errors.
    pub errors: usize,
}

impl LogCounters {
    /// Counts a slice of entries.
    #[must_use]
    pub fn from_logs(logs: &[ValidatorLog]) -> Self {
        logs.iter().fold(Self::default(), |mut counters, log| {
            counters.record(log.severity());
            counters
        })
    }

    /// Adds one entry of the given severity.
    pub fn record(&mut self, severity: Severity) {
        match severity {
            Severity::Log => self.comments += 1,
            Severity::Warning => self.warnings += 1,
            Severity::Error => self.errors += 1,
        }
    }

    /// Sum over every severity.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.comments + self.warnings + self.errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_display() {
        let log = ValidatorLog::new("Annotation Checker", Severity::Error, "Property is required.")
            .with_target(ObjectId(3), "player")
            .with_path(PropertyPath::parse("stats.health"));
        assert_eq!(
            log.to_string(),
            "[error] Annotation Checker player stats.health: Property is required."
        );
        assert_eq!(log.icon(), "icon-error");
        assert_eq!(log.fix(), None);
    }

    #[test]
    fn test_counters() {
        let logs = vec![
            ValidatorLog::new("a", Severity::Error, "x"),
            ValidatorLog::new("a", Severity::Warning, "y"),
            ValidatorLog::new("b", Severity::Error, "z"),
        ];
        let counters = LogCounters::from_logs(&logs);
        assert_eq!(counters.errors, 2);
        assert_eq!(counters.warnings, 1);
        assert_eq!(counters.comments, 0);
        assert_eq!(counters.total(), 3);
    }
}
