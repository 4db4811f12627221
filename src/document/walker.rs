//! Document walker
//!
//! Visits every leaf of a document, computes its canonical path with the
//! same wildcard convention as the path compiler, and replaces the leaves
//! whose path is in the [`PathSet`] and that pass the caller's guard.
//!
//! The walk is copy-on-write: it builds a new value tree and leaves the
//! input untouched, so a failed walk never corrupts the caller's document.
//! Sibling subtrees are transformed concurrently; the first failure aborts
//! the walk.

use std::future::Future;
use std::pin::Pin;

use futures_util::future::{try_join_all, BoxFuture};
use futures_util::FutureExt;

use super::value::{Map, Value};
use crate::error::{CryptError, CryptResult};
use crate::path::{CanonicalPath, LeafKind, PathSet};

/// Future returned by a leaf transform
pub type LeafFuture<'a> = Pin<Box<dyn Future<Output = CryptResult<Value>> + Send + 'a>>;

/// Per-leaf asynchronous transform (encrypt or decrypt)
pub trait LeafTransform: Send + Sync {
    fn transform<'a>(&'a self, path: &'a CanonicalPath, leaf: &'a Value) -> LeafFuture<'a>;
}

/// Decides whether a leaf at a matching path is eligible
pub trait LeafGuard: Sync {
    fn admits(&self, leaf: &Value) -> bool;
}

/// Built-in guards for the two walk directions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guard {
    /// Strings and numbers; used when encrypting
    Plaintext,
    /// Opaque blobs; used when decrypting
    Opaque,
}

impl LeafGuard for Guard {
    fn admits(&self, leaf: &Value) -> bool {
        match self {
            Guard::Plaintext => leaf.is_plaintext(),
            Guard::Opaque => leaf.is_opaque(),
        }
    }
}

impl<F> LeafGuard for F
where
    F: Fn(&Value) -> bool + Sync,
{
    fn admits(&self, leaf: &Value) -> bool {
        self(leaf)
    }
}

/// Result of a completed walk
#[derive(Debug, Clone, PartialEq)]
pub struct Walked {
    /// The transformed document
    pub value: Value,
    /// Number of leaves replaced
    pub transformed: usize,
}

impl Walked {
    fn unchanged(value: Value) -> Self {
        Self {
            value,
            transformed: 0,
        }
    }
}

/// Walks documents against one compiled path set
#[derive(Debug, Clone, Copy)]
pub struct DocumentWalker<'p> {
    paths: &'p PathSet,
}

impl<'p> DocumentWalker<'p> {
    pub fn new(paths: &'p PathSet) -> Self {
        Self { paths }
    }

    /// Walks `value`, returning the transformed copy.
    ///
    /// # Errors
    ///
    /// - the first error returned by `transform`
    /// - `ShapeMismatch` if a container sits at a path declared as a
    ///   string or number leaf
    pub async fn walk<T, G>(&self, value: &Value, transform: &T, guard: &G) -> CryptResult<Walked>
    where
        T: LeafTransform + ?Sized,
        G: LeafGuard + ?Sized,
    {
        self.visit(value, CanonicalPath::root(), transform, guard).await
    }

    fn visit<'a, T, G>(
        &'a self,
        value: &'a Value,
        path: CanonicalPath,
        transform: &'a T,
        guard: &'a G,
    ) -> BoxFuture<'a, CryptResult<Walked>>
    where
        T: LeafTransform + ?Sized,
        G: LeafGuard + ?Sized,
    {
        async move {
            match value {
                Value::Object(map) => {
                    self.check_container(&path, value)?;
                    let (map, transformed) = self.visit_map(map, &path, transform, guard).await?;
                    Ok(Walked {
                        value: Value::Object(map),
                        transformed,
                    })
                }
                // Sub-documents walk as their field map.
                Value::Document(doc) => {
                    self.check_container(&path, value)?;
                    let (map, transformed) =
                        self.visit_map(doc.fields(), &path, transform, guard).await?;
                    Ok(Walked {
                        value: Value::Document(doc.with_fields(map)),
                        transformed,
                    })
                }
                Value::Array(items) => {
                    self.check_container(&path, value)?;
                    let element_path = path.wildcard();
                    let visited = try_join_all(
                        items
                            .iter()
                            .map(|item| self.visit(item, element_path.clone(), transform, guard)),
                    )
                    .await?;

                    let transformed = visited.iter().map(|w| w.transformed).sum();
                    Ok(Walked {
                        value: Value::Array(visited.into_iter().map(|w| w.value).collect()),
                        transformed,
                    })
                }
                leaf if self.paths.contains(&path) && guard.admits(leaf) => {
                    let replaced = transform.transform(&path, leaf).await?;
                    Ok(Walked {
                        value: replaced,
                        transformed: 1,
                    })
                }
                leaf => Ok(Walked::unchanged(leaf.clone())),
            }
        }
        .boxed()
    }

    async fn visit_map<T, G>(
        &self,
        map: &Map,
        path: &CanonicalPath,
        transform: &T,
        guard: &G,
    ) -> CryptResult<(Map, usize)>
    where
        T: LeafTransform + ?Sized,
        G: LeafGuard + ?Sized,
    {
        let visited = try_join_all(map.iter().map(|(key, child)| {
            self.visit(child, path.field(key), transform, guard)
                .map(move |result| result.map(|walked| (key.clone(), walked)))
        }))
        .await?;

        let mut transformed = 0;
        let mut out = Map::new();
        for (key, walked) in visited {
            transformed += walked.transformed;
            out.insert(key, walked.value);
        }
        Ok((out, transformed))
    }

    /// A container where a string or number leaf is declared is a schema
    /// violation; under an `any` path it is simply left alone.
    fn check_container(&self, path: &CanonicalPath, value: &Value) -> CryptResult<()> {
        match self.paths.kind(path) {
            Some(kind @ (LeafKind::String | LeafKind::Number)) => Err(CryptError::ShapeMismatch {
                path: path.to_string(),
                expected: kind.name(),
                found: value.kind_name(),
            }),
            _ => Ok(()),
        }
    }
}
