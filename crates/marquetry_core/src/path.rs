//! Property paths addressing locations inside an object graph.

use std::fmt;

/// One step of a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PathSegment {
    /// A named field.
    Field(String),
    /// A sequence element.
    Index(usize),
}

/// A sequence of field names and indices from an object's root.
///
/// The empty path addresses the root object itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyPath(Vec<PathSegment>);

impl PropertyPath {
    /// The root path.
    #[must_use]
    pub const fn root() -> Self {
        Self(Vec::new())
    }

    /// Parses a dotted path such as `items[2].name`.
    #[must_use]
    pub fn parse(text: &str) -> Self {
        let mut segments = Vec::new();
        for part in text.split('.').filter(|p| !p.is_empty()) {
            let mut rest = part;
            if let Some(open) = rest.find('[') {
                let (name, tail) = rest.split_at(open);
                if !name.is_empty() {
                    segments.push(PathSegment::Field(name.to_string()));
                }
                rest = tail;
                while let Some(stripped) = rest.strip_prefix('[') {
                    let Some(close) = stripped.find(']') else { break };
                    if let Ok(index) = stripped[..close].parse() {
                        segments.push(PathSegment::Index(index));
                    }
                    rest = &stripped[close + 1..];
                }
            } else {
                segments.push(PathSegment::Field(rest.to_string()));
            }
        }
        Self(segments)
    }

    /// Returns the segments.
    #[must_use]
    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of segments.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.0.len()
    }

    /// Path of a named child field.
    #[must_use]
    pub fn field(&self, name: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Field(name.to_string()));
        Self(segments)
    }

    /// Path of a sequence element.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        let mut segments = self.0.clone();
        segments.push(PathSegment::Index(index));
        Self(segments)
    }

    /// Path of the enclosing scope, `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            return None;
        }
        Some(Self(self.0[..self.0.len() - 1].to_vec()))
    }

    /// Last segment, if any.
    #[must_use]
    pub fn last(&self) -> Option<&PathSegment> {
        self.0.last()
    }

    /// Returns true if `self` equals `other` or lies below it.
    #[must_use]
    pub fn starts_with(&self, other: &Self) -> bool {
        self.0.len() >= other.0.len() && self.0[..other.0.len()] == other.0[..]
    }

    /// Returns true when one path contains the other.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.starts_with(other) || other.starts_with(self)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("<root>");
        }
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Field(name) if i == 0 => write!(f, "{name}")?,
                PathSegment::Field(name) => write!(f, ".{name}")?,
                PathSegment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
