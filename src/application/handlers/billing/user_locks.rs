//! Per-customer serialization of reconciliation.
//!
//! Deliveries for the same customer can arrive concurrently. Each runs
//! its read-modify-write under a keyed async mutex so the later one sees
//! the earlier one's write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

/// Keyed async locks.
///
/// Entries no longer held by anyone are pruned on each acquire.
#[derive(Debug)]
pub struct UserLocks {
    enabled: bool,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Default for UserLocks {
    fn default() -> Self {
        Self::new()
    }
}

impl UserLocks {
    pub fn new() -> Self {
        Self {
            enabled: true,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Locks that never block.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            locks: Mutex::new(HashMap::new()),
        }
    }

    /// Waits for exclusive access to `key`. `None` when locking is disabled.
    pub async fn acquire(&self, key: &str) -> Option<OwnedMutexGuard<()>> {
        if !self.enabled {
            return None;
        }

        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            locks.retain(|k, l| k == key || Arc::strong_count(l) > 1);
            locks
                .entry(key.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };

        Some(lock.lock_owned().await)
    }

    pub fn tracked_keys(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}
