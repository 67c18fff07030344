//! Key-value store contract
//!
//! The engine treats persistence as a byte-addressable map. One public
//! book operation may touch several entities (order, list, tree, book);
//! those writes go through `write_batch` so a transactional backend can
//! apply them all-or-nothing. Partial persistence of one operation is a
//! fatal inconsistency, never a recoverable state.

use types::errors::StoreError;

/// Byte-addressable persistent map
///
/// Implementations must be safe to share between books; the engine
/// serializes writes per book but not across books.
pub trait Store: Send + Sync {
    /// Persist `value` under `key`, overwriting any previous value
    fn put(&self, key: &[u8], value: Vec<u8>) -> Result<(), StoreError>;

    /// Fetch the value under `key`, or None when absent
    fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StoreError>;

    /// Check for presence without copying the value out
    fn contains(&self, key: &[u8]) -> Result<bool, StoreError> {
        Ok(self.get(key)?.is_some())
    }

    /// Apply all writes of one engine operation
    ///
    /// The default walks the batch with `put`; backends with a
    /// transactional primitive should override it so the batch commits
    /// atomically.
    fn write_batch(&self, batch: Vec<(Vec<u8>, Vec<u8>)>) -> Result<(), StoreError> {
        let total = batch.len();
        for (committed, (key, value)) in batch.into_iter().enumerate() {
            self.put(&key, value)
                .map_err(|_| StoreError::BatchFailed { committed, total })?;
        }
        Ok(())
    }
}
