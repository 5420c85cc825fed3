//! Persistent repository backend on sled.
//!
//! One sled tree per collection; values are JSON so records stay portable
//! between the core and its collaborators.

use super::{Record, Repository};
use crate::error::StorageError;
use std::marker::PhantomData;
use std::path::Path;

/// Handle to an open sled database.
#[derive(Clone)]
pub struct SledStore {
    db: sled::Db,
}

impl SledStore {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let db = sled::open(path)?;
        Ok(Self { db })
    }

    /// Open a collection as a typed repository.
    pub fn repository<V: Record>(&self, collection: &str) -> Result<SledRepository<V>, StorageError> {
        let tree = self.db.open_tree(collection)?;
        Ok(SledRepository {
            tree,
            _marker: PhantomData,
        })
    }

    pub fn flush(&self) -> Result<(), StorageError> {
        self.db.flush()?;
        Ok(())
    }
}

pub struct SledRepository<V> {
    tree: sled::Tree,
    _marker: PhantomData<fn() -> V>,
}

impl<V: Record> SledRepository<V> {
    fn decode(id: &str, bytes: &[u8]) -> Result<V, StorageError> {
        serde_json::from_slice(bytes).map_err(|e| StorageError::Decode {
            id: id.to_string(),
            reason: e.to_string(),
        })
    }
}

impl<V: Record> Repository<V> for SledRepository<V> {
    fn get(&self, id: &str) -> Result<Option<V>, StorageError> {
        match self.tree.get(id.as_bytes())? {
            Some(bytes) => Ok(Some(Self::decode(id, &bytes)?)),
            None => Ok(None),
        }
    }

    fn put(&self, id: &str, record: &V) -> Result<(), StorageError> {
        let bytes = serde_json::to_vec(record).map_err(|e| StorageError::Encode {
            id: id.to_string(),
            reason: e.to_string(),
        })?;
        self.tree.insert(id.as_bytes(), bytes)?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.tree.remove(id.as_bytes())?.is_some())
    }

    fn list(&self) -> Result<Vec<V>, StorageError> {
        let mut records = Vec::new();
        for entry in self.tree.iter() {
            let (key, value) = entry?;
            let id = String::from_utf8_lossy(&key).into_owned();
            match Self::decode(&id, &value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    tracing::warn!(collection = ?self.tree.name(), id = %id, error = %e, "Skipping undecodable record");
                }
            }
        }
        Ok(records)
    }
}
