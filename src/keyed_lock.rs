//! Per-key asynchronous mutual exclusion.
//!
//! Registry entries, workflow instances and inbox correlation ids are
//! process-local shared state. [`KeyedLocks`] hands out one async mutex per
//! key so writers touching the same key run one at a time while writers on
//! different keys proceed concurrently.

use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Number of slots retained before idle slots are pruned.
const PRUNE_THRESHOLD: usize = 64;

/// Guard returned by [`KeyedLocks::lock`]; the key is released on drop.
pub type KeyGuard = OwnedMutexGuard<()>;

/// Table of async mutexes keyed by `K`.
#[derive(Debug)]
pub struct KeyedLocks<K> {
    slots: Mutex<HashMap<K, Arc<AsyncMutex<()>>>>,
}

impl<K> Default for KeyedLocks<K> {
    fn default() -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
        }
    }
}

impl<K> KeyedLocks<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires exclusive access to `key`, waiting for any current holder.
    pub async fn lock(&self, key: &K) -> KeyGuard {
        let slot = {
            // The map is only ever mutated atomically under this mutex, so a
            // poisoned guard still holds a consistent table.
            let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
            if slots.len() >= PRUNE_THRESHOLD {
                slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            }
            Arc::clone(slots.entry(key.clone()).or_default())
        };
        slot.lock_owned().await
    }

    /// Returns the number of slots currently tracked.
    #[must_use]
    pub fn tracked(&self) -> usize {
        self.slots
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
