use crate::core::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Read-modify-write step applied by [`RecordStore::update`].
///
/// Receives the current value (if any) and returns the replacement; `None`
/// removes the key.
pub type KeyUpdate = Box<dyn FnOnce(Option<&[u8]>) -> Result<Option<Vec<u8>>> + Send>;

/// Shared handle to a backing store, the "env" every entity operation runs against.
pub type SharedStore = Arc<dyn RecordStore>;

/// Key-value backing store - allows pluggable durable backends.
///
/// Every method is atomic for the single key it touches and nothing more:
/// there is no cross-key transaction.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Read a value
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Read several values, preserving the order of `keys`
    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        futures::future::try_join_all(keys.iter().map(|key| self.get(key))).await
    }

    /// Check whether a key is present
    async fn contains(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Unconditionally overwrite a value
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()>;

    /// Remove a key, returning whether it was present
    async fn delete(&self, key: &str) -> Result<bool>;

    /// List all entries whose key starts with `prefix`, ordered by key
    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>>;

    /// Atomically apply `apply` to the value stored at `key` and return the new value.
    ///
    /// No other write to the same key can interleave between the read and the
    /// write of one `update` call.
    async fn update(&self, key: &str, apply: KeyUpdate) -> Result<Option<Vec<u8>>>;
}
