//! Documents and the document walker
//!
//! A document is a tree of [`Value`]s. The walker visits its leaves with the
//! same canonical path convention the path compiler uses and hands matching
//! leaves to an asynchronous transform.

mod value;
mod walker;

pub use value::{Blob, Document, Map, Value, BINARY_KEY, ENCRYPTED_SUBTYPE};
pub use walker::{DocumentWalker, Guard, LeafFuture, LeafGuard, LeafTransform, Walked};
