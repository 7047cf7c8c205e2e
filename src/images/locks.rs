//! Per-image-key async locks.

use std::sync::Arc;

use closet_core::ImageKey;
use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// A table of async mutexes, one per [`ImageKey`] currently in use.
///
/// Entries are created on demand and dropped again once the last holder or
/// waiter lets go, so the table only ever holds keys with work in flight.
#[derive(Default)]
pub struct KeyLocks {
    locks: DashMap<ImageKey, Arc<Mutex<()>>>,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `key`.
    pub async fn lock(&self, key: ImageKey) -> KeyGuard<'_> {
        let lock = Arc::clone(self.locks.entry(key).or_default().value());
        let guard = lock.lock_owned().await;
        KeyGuard {
            locks: self,
            key,
            guard: Some(guard),
        }
    }

    /// Number of keys with a holder or waiter.
    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

/// Exclusive access to one key; released on drop.
pub struct KeyGuard<'a> {
    locks: &'a KeyLocks,
    key: ImageKey,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for KeyGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        self.locks
            .locks
            .remove_if(&self.key, |_, lock| Arc::strong_count(lock) == 1);
    }
}
