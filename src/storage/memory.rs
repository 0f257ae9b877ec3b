use super::engine::{KeyUpdate, RecordStore};
use crate::core::Result;
use async_trait::async_trait;
use std::collections::BTreeMap;
use tokio::sync::RwLock;

/// Volatile store used by tests and by servers started without a data directory.
#[derive(Default)]
pub struct MemoryRecordStore {
    entries: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn keys(&self) -> Vec<String> {
        self.entries.read().await.keys().cloned().collect()
    }
}

pub(crate) fn scan_prefix(
    entries: &BTreeMap<String, Vec<u8>>,
    prefix: &str,
) -> Vec<(String, Vec<u8>)> {
    entries
        .range(prefix.to_string()..)
        .take_while(|(key, _)| key.starts_with(prefix))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn get_many(&self, keys: &[String]) -> Result<Vec<Option<Vec<u8>>>> {
        let entries = self.entries.read().await;
        Ok(keys.iter().map(|key| entries.get(key).cloned()).collect())
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        Ok(self.entries.write().await.remove(key).is_some())
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        Ok(scan_prefix(&*self.entries.read().await, prefix))
    }

    async fn update(&self, key: &str, apply: KeyUpdate) -> Result<Option<Vec<u8>>> {
        let mut entries = self.entries.write().await;
        let next = apply(entries.get(key).map(Vec::as_slice))?;
        match &next {
            Some(value) => {
                entries.insert(key.to_string(), value.clone());
            }
            None => {
                entries.remove(key);
            }
        }
        Ok(next)
    }
}
