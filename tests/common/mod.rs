//! Shared record types and store doubles for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use dataset_catalog::core::{Result, StoreError};
use dataset_catalog::entity::{EntityRecord, IndexedRecord};
use dataset_catalog::entity_record;
use dataset_catalog::storage::{KeyUpdate, MemoryRecordStore, RecordStore, SharedStore};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::Barrier;

// ============================================================================
// Test record
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberMeta {
    pub x: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<i64>,
}

entity_record! {
    #[serde(rename_all = "camelCase")]
    pub struct Member {
        pub id: String,
        pub name: String,
        pub visits: i64,
        pub meta: MemberMeta,
    }
}

impl EntityRecord for Member {
    const ENTITY_NAME: &'static str = "member";

    fn initial_state() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            visits: 0,
            meta: MemberMeta::default(),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl IndexedRecord for Member {
    const INDEX_NAME: &'static str = "members";

    fn seed_data() -> Vec<Self> {
        vec![member("u1", "Seeded")]
    }
}

pub fn member(id: &str, name: &str) -> Member {
    Member {
        id: id.to_string(),
        name: name.to_string(),
        visits: 0,
        meta: MemberMeta::default(),
    }
}

pub fn memory_store() -> SharedStore {
    Arc::new(MemoryRecordStore::new())
}

// ============================================================================
// GatedStore: holds the first N reads of one key at a barrier
// ============================================================================

/// Reads of `gated_key` complete against the inner store and then wait at a
/// barrier, so N concurrent callers all observe the same pre-write value.
pub struct GatedStore {
    inner: MemoryRecordStore,
    gated_key: String,
    barrier: Arc<Barrier>,
    remaining: AtomicUsize,
}

impl GatedStore {
    pub fn new(gated_key: impl Into<String>, parties: usize) -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            gated_key: gated_key.into(),
            barrier: Arc::new(Barrier::new(parties)),
            remaining: AtomicUsize::new(parties),
        }
    }

    fn take_gate(&self, key: &str) -> bool {
        key == self.gated_key
            && self
                .remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
                .is_ok()
    }
}

#[async_trait]
impl RecordStore for GatedStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let value = self.inner.get(key).await?;
        if self.take_gate(key) {
            self.barrier.wait().await;
        }
        Ok(value)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.inner.delete(key).await
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.inner.list_prefix(prefix).await
    }

    async fn update(&self, key: &str, apply: KeyUpdate) -> Result<Option<Vec<u8>>> {
        self.inner.update(key, apply).await
    }
}

// ============================================================================
// FaultyStore: fails writes to chosen keys
// ============================================================================

/// Writes (`put`, `delete`, `update`) to a failing key return
/// `StoreError::Unavailable`; reads always succeed.
#[derive(Default)]
pub struct FaultyStore {
    inner: MemoryRecordStore,
    failing: Mutex<HashSet<String>>,
}

impl FaultyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_writes_to(&self, key: &str) {
        self.failing.lock().unwrap().insert(key.to_string());
    }

    pub fn heal(&self) {
        self.failing.lock().unwrap().clear();
    }

    fn check(&self, key: &str) -> Result<()> {
        if self.failing.lock().unwrap().contains(key) {
            return Err(StoreError::unavailable(format!("injected write failure on '{key}'")));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for FaultyStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        self.inner.get(key).await
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<()> {
        self.check(key)?;
        self.inner.put(key, value).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        self.check(key)?;
        self.inner.delete(key).await
    }

    async fn list_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>> {
        self.inner.list_prefix(prefix).await
    }

    async fn update(&self, key: &str, apply: KeyUpdate) -> Result<Option<Vec<u8>>> {
        self.check(key)?;
        self.inner.update(key, apply).await
    }
}
