//! Canonical field paths
//!
//! A canonical path addresses a leaf relative to the schema root. Array
//! positions are erased to the wildcard segment `*`, so every element of an
//! array shares one path: `author.*.firstName`, `trash.*`.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Wildcard segment literal
pub const WILDCARD: &str = "*";

/// One segment of a canonical path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Segment {
    /// Literal field name
    Field(String),
    /// Any position in an array at this depth
    Wildcard,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Field(name) => f.write_str(name),
            Segment::Wildcard => f.write_str(WILDCARD),
        }
    }
}

/// Ordered sequence of segments. The empty path is the document root.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalPath {
    segments: Vec<Segment>,
}

impl CanonicalPath {
    /// The document root
    pub fn root() -> Self {
        Self::default()
    }

    /// Returns this path extended by a literal field name
    pub fn field(&self, name: &str) -> Self {
        self.extended(Segment::Field(name.to_string()))
    }

    /// Returns this path extended by a wildcard segment
    pub fn wildcard(&self) -> Self {
        self.extended(Segment::Wildcard)
    }

    fn extended(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for CanonicalPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// Error parsing a dotted path string
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid canonical path '{input}': empty segment at position {position}")]
pub struct PathParseError {
    pub input: String,
    pub position: usize,
}

impl FromStr for CanonicalPath {
    type Err = PathParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::root());
        }

        let segments = s
            .split('.')
            .enumerate()
            .map(|(position, part)| match part {
                "" => Err(PathParseError {
                    input: s.to_string(),
                    position,
                }),
                WILDCARD => Ok(Segment::Wildcard),
                name => Ok(Segment::Field(name.to_string())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { segments })
    }
}
