//! Compiled path sets

use std::collections::HashMap;
use std::fmt;

use super::canonical::CanonicalPath;

/// Declared kind of a sensitive leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeafKind {
    String,
    Number,
    /// Dynamically typed; only scalar runtime values are transformed
    Any,
}

impl LeafKind {
    pub fn name(&self) -> &'static str {
        match self {
            LeafKind::String => "string",
            LeafKind::Number => "number",
            LeafKind::Any => "any",
        }
    }
}

/// Immutable set of canonical paths eligible for transformation.
///
/// Built once per schema and shared read-only by every walk over documents
/// of that schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSet {
    paths: HashMap<CanonicalPath, LeafKind>,
}

impl PathSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a path. A path already present keeps its first declared kind.
    pub fn insert(&mut self, path: CanonicalPath, kind: LeafKind) {
        self.paths.entry(path).or_insert(kind);
    }

    pub fn contains(&self, path: &CanonicalPath) -> bool {
        self.paths.contains_key(path)
    }

    pub fn kind(&self, path: &CanonicalPath) -> Option<LeafKind> {
        self.paths.get(path).copied()
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CanonicalPath, LeafKind)> {
        self.paths.iter().map(|(path, kind)| (path, *kind))
    }

    /// Paths rendered as dotted strings, sorted
    pub fn to_strings(&self) -> Vec<String> {
        let mut out: Vec<String> = self.paths.keys().map(ToString::to_string).collect();
        out.sort();
        out
    }
}

impl FromIterator<(CanonicalPath, LeafKind)> for PathSet {
    fn from_iter<I: IntoIterator<Item = (CanonicalPath, LeafKind)>>(iter: I) -> Self {
        let mut set = PathSet::new();
        for (path, kind) in iter {
            set.insert(path, kind);
        }
        set
    }
}

impl fmt::Display for PathSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}", self.to_strings().join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path(s: &str) -> CanonicalPath {
        s.parse().unwrap()
    }

    #[test]
    fn test_membership_is_exact() {
        let set: PathSet = [(path("author.*.firstName"), LeafKind::String)]
            .into_iter()
            .collect();

        assert!(set.contains(&path("author.*.firstName")));
        assert!(!set.contains(&path("author.firstName")));
        assert!(!set.contains(&path("author.*")));
    }

    #[test]
    fn test_first_kind_wins() {
        let mut set = PathSet::new();
        set.insert(path("trash.*"), LeafKind::Any);
        set.insert(path("trash.*"), LeafKind::String);
        assert_eq!(set.len(), 1);
        assert_eq!(set.kind(&path("trash.*")), Some(LeafKind::Any));
    }

    #[test]
    fn test_display_is_sorted() {
        let set: PathSet = [
            (path("title"), LeafKind::String),
            (path("body"), LeafKind::String),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.to_string(), "{body, title}");
    }
}
