//! # Key Resolver

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::errors::KeyResult;
use super::key::KeyHandle;

/// Future returned by [`KeyResolver::resolve`]
pub type ResolveFuture<'a> = Pin<Box<dyn Future<Output = KeyResult<KeyHandle>> + Send + 'a>>;

/// Maps a logical key name to a data key handle.
///
/// Implementations find an existing key by alternate name or mint and
/// persist a new one. Concurrent calls for the same name must agree on a
/// single key.
pub trait KeyResolver: Send + Sync {
    fn resolve<'a>(&'a self, key_name: &'a str) -> ResolveFuture<'a>;
}

impl<R: KeyResolver + ?Sized> KeyResolver for Arc<R> {
    fn resolve<'a>(&'a self, key_name: &'a str) -> ResolveFuture<'a> {
        (**self).resolve(key_name)
    }
}
