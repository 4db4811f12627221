//! Single-flight key handle cache
//!
//! The first lookup of a key name resolves it; concurrent first callers wait
//! on the same resolution and all observe the same handle. A failed
//! resolution leaves the slot empty so the next caller retries.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::OnceCell;

use super::errors::KeyResult;
use super::key::KeyHandle;
use super::resolver::KeyResolver;

#[derive(Debug, Default)]
pub struct KeyCache {
    slots: Mutex<HashMap<String, Arc<OnceCell<KeyHandle>>>>,
}

impl KeyCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get_or_resolve<R>(&self, key_name: &str, resolver: &R) -> KeyResult<KeyHandle>
    where
        R: KeyResolver + ?Sized,
    {
        let slot = {
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(slots.entry(key_name.to_string()).or_default())
        };

        slot.get_or_try_init(|| resolver.resolve(key_name))
            .await
            .copied()
    }

    /// Handle for `key_name` if already resolved
    pub fn cached(&self, key_name: &str) -> Option<KeyHandle> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots.get(key_name).and_then(|slot| slot.get().copied())
    }

    pub fn clear(&self) {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}
