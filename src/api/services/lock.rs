//! Per-resource advisory locking.
//!
//! In-process keyed mutex registry serializing mutating operations on the
//! same automation resource. The guard is acquired before the storage
//! transaction begins and released when it drops, after the transaction has
//! committed or rolled back.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of named advisory locks.
#[derive(Default)]
pub struct LockRegistry {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

/// Held lock on one resource key. Dropping releases the lock.
pub struct LockGuard {
    _guard: OwnedMutexGuard<()>,
}

impl LockRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the lock for `key`, waiting until any current holder releases
    /// it.
    pub async fn acquire(&self, key: &str) -> LockGuard {
        let cell = {
            let mut locks = self.locks.lock().await;
            // A cell with no holder and no waiter is only referenced by the
            // map itself; sweeping those keeps the registry bounded.
            locks.retain(|_, cell| Arc::strong_count(cell) > 1);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        LockGuard {
            _guard: cell.lock_owned().await,
        }
    }

    /// Number of keys currently tracked (held, awaited, or not yet swept).
    pub async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.locks.lock().await.is_empty()
    }
}

/// Lock key for a single automation resource.
///
/// Update and delete share the key so they serialize against each other;
/// at most one mutating operation per automation is in flight at a time.
pub fn automation_key(id: &str, user_id: &str, home_id: &str, app_code: &str) -> String {
    format!("automation/{id}/{user_id}/{home_id}/{app_code}")
}
