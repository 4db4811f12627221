//! # Key Management
//!
//! Data keys addressed by alternate name, wrapped under a local master key,
//! and a per-process cache of resolved handles.

mod cache;
mod errors;
mod key;
mod resolver;
mod store;
mod vault;

pub use cache::KeyCache;
pub use errors::{KeyError, KeyResult};
pub use key::{DataKey, KeyHandle, KeyVaultNamespace, DATA_KEY_LEN};
pub use resolver::{KeyResolver, ResolveFuture};
pub use store::{FileKeyStore, KeyStore, MemoryKeyStore};
pub use vault::{KeyMaterial, LocalKeyVault, MIN_SECRET_LEN};
