//! # Cipher
//!
//! Forward and backward transforms for single leaf values.

mod algorithm;
mod local;

use std::future::Future;
use std::pin::Pin;

use thiserror::Error;

use crate::document::{Blob, Value};
use crate::keys::{KeyError, KeyHandle};

pub use algorithm::Algorithm;
pub use local::{LocalCipher, BLOB_VERSION};

/// Future returned by cipher operations
pub type CipherFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, CipherError>> + Send + 'a>>;

/// Cipher errors
#[derive(Debug, Clone, Error)]
pub enum CipherError {
    #[error(transparent)]
    Key(#[from] KeyError),

    /// Not a blob this cipher produced
    #[error("malformed blob: {0}")]
    MalformedBlob(&'static str),

    /// Wrong key or tampered ciphertext
    #[error("authentication failed")]
    Authentication,

    /// Only strings and numbers are encrypted
    #[error("value is not a string or number")]
    NotScalar,

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("encryption failed")]
    Encryption,
}

/// Transforms one leaf value.
///
/// `backward` must reject anything `forward` did not produce.
pub trait Cipher: Send + Sync {
    fn forward<'a>(
        &'a self,
        plain: &'a Value,
        key: KeyHandle,
        algorithm: Algorithm,
    ) -> CipherFuture<'a, Blob>;

    fn backward<'a>(&'a self, blob: &'a Blob) -> CipherFuture<'a, Value>;
}
