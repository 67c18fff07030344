//! In-memory store
//!
//! HashMap behind a mutex. Batches commit under a single lock
//! acquisition, so concurrent readers never observe a half-applied
//! operation.

use parking_lot::Mutex;
use std::collections::HashMap;
use types::errors::StoreError;

use crate::store::Store;

/// Mutex-guarded map store for tests and single-process deployments
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: Mutex<HashMap<Vec<u8>, Vec<u8>>>,
}

impl MemoryStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.map.lock().len()
    }

    /// Check if the store holds no entries
    pub fn is_empty(&self) -> bool {
        self.map.lock().is_empty()
    }
}

impl Store for MemoryStore {
    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError> {
        self.map.lock().insert(key.to_vec(), value);
        Ok(())
    }

    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError> {
        Ok(self.map.lock().get(key).cloned())
    }

    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.map.lock().contains_key(key))
    }

    fn write_batch(&self, batch: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), StoreError> {
        let mut map = self.map.lock();
        for (key, value) in batch {
            map.insert(key, value);
        }
        Ok(())
    }
}
