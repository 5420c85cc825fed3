//! Record repositories
//!
//! Every stateful component (registry, capability ledger, reputation ledger,
//! discovery task log, thread engine, adapter id mappings) receives its storage as
//! an injected [`Repository`], so tests run against isolated in-memory state and
//! deployments can swap in the persistent sled backend.

pub mod memory;
pub mod persistent;

use crate::error::StorageError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

pub use self::memory::MemoryRepository;
pub use self::persistent::{SledRepository, SledStore};

/// Id → record storage port.
pub trait Repository<V>: Send + Sync {
    fn get(&self, id: &str) -> Result<Option<V>, StorageError>;
    fn put(&self, id: &str, record: &V) -> Result<(), StorageError>;
    /// Returns whether a record was removed.
    fn delete(&self, id: &str) -> Result<bool, StorageError>;
    /// All records, ordered by id.
    fn list(&self) -> Result<Vec<V>, StorageError>;

    fn contains(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.get(id)?.is_some())
    }
}

/// Bounds every persisted record satisfies.
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

impl<T> Record for T where T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {}

/// Storage backend selector used by the facade to build repositories.
#[derive(Clone)]
pub enum StoreBackend {
    Memory,
    Sled(SledStore),
}

impl StoreBackend {
    /// Build a repository for one collection.
    pub fn repository<V: Record>(&self, collection: &str) -> Result<Arc<dyn Repository<V>>, StorageError> {
        match self {
            StoreBackend::Memory => Ok(Arc::new(MemoryRepository::<V>::new())),
            StoreBackend::Sled(store) => Ok(Arc::new(store.repository::<V>(collection)?)),
        }
    }
}
