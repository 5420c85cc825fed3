use super::Repository;
use crate::error::StorageError;
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// In-process repository. Ordered map so `list` is deterministic.
pub struct MemoryRepository<V> {
    records: RwLock<BTreeMap<String, V>>,
}

impl<V> MemoryRepository<V> {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(BTreeMap::new()),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl<V> Default for MemoryRepository<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send + Sync> Repository<V> for MemoryRepository<V> {
    fn get(&self, id: &str) -> Result<Option<V>, StorageError> {
        Ok(self.records.read().get(id).cloned())
    }

    fn put(&self, id: &str, record: &V) -> Result<(), StorageError> {
        self.records.write().insert(id.to_string(), record.clone());
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<bool, StorageError> {
        Ok(self.records.write().remove(id).is_some())
    }

    fn list(&self) -> Result<Vec<V>, StorageError> {
        Ok(self.records.read().values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_get_delete() {
        let repo = MemoryRepository::<String>::new();
        repo.put("b", &"two".to_string()).unwrap();
        repo.put("a", &"one".to_string()).unwrap();

        assert_eq!(repo.get("a").unwrap().as_deref(), Some("one"));
        assert_eq!(repo.list().unwrap(), vec!["one".to_string(), "two".to_string()]);
        assert!(repo.delete("a").unwrap());
        assert!(!repo.delete("a").unwrap());
        assert!(!repo.contains("a").unwrap());
        assert_eq!(repo.len(), 1);
    }
}
