//! Path compilation
//!
//! Turns a schema into the set of canonical paths whose leaves are
//! encrypted. Runs once per schema; the resulting [`PathSet`] is cached and
//! reused by every document walk.

mod canonical;
mod compiler;
mod set;

pub use canonical::{CanonicalPath, PathParseError, Segment, WILDCARD};
pub use compiler::PathCompiler;
pub use set::{LeafKind, PathSet};
