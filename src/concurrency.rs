//! Per-entity serialization for concurrent writers
//!
//! The core assumes one logical owner per entity id. Writers that read-modify-write
//! one entity (a reputation history, a thread's message sequence) take that entity's
//! lock first so concurrent submissions against the same id are applied one at a
//! time, while writers on different ids proceed independently.

use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Per-id async lock manager.
pub struct EntityLocks {
    /// Map from entity id to its lock. The map itself is guarded by a short-lived
    /// sync lock; the per-entity lock may be held across awaits.
    locks: RwLock<HashMap<String, Arc<Mutex<()>>>>,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self {
            locks: RwLock::new(HashMap::new()),
        }
    }

    fn entity_lock(&self, id: &str) -> Arc<Mutex<()>> {
        {
            let map = self.locks.read();
            if let Some(lock) = map.get(id) {
                return lock.clone();
            }
        }

        let mut map = self.locks.write();
        // Another writer may have inserted it between the two guards
        map.entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    /// Wait for exclusive access to one entity.
    pub async fn lock(&self, id: &str) -> OwnedMutexGuard<()> {
        self.entity_lock(id).lock_owned().await
    }

    /// Drop the lock entry for a deleted entity. An entry still held or awaited
    /// elsewhere is kept so later lockers queue on the same mutex.
    pub fn forget(&self, id: &str) {
        let mut map = self.locks.write();
        if map.get(id).is_some_and(|lock| Arc::strong_count(lock) == 1) {
            map.remove(id);
        }
    }

    pub fn tracked(&self) -> usize {
        self.locks.read().len()
    }
}

impl Default for EntityLocks {
    fn default() -> Self {
        Self::new()
    }
}
