//! Per-type id index: one key holding the set of live ids.
//!
//! Every write goes through [`RecordStore::update`], so concurrent additions
//! are set unions on a single key and never lose or duplicate ids.

use crate::core::codec::{decode, encode};
use crate::core::Result;
use crate::storage::RecordStore;
use std::collections::BTreeSet;

pub type IdSet = BTreeSet<String>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdIndex {
    key: String,
}

impl IdIndex {
    pub fn new(index_name: impl Into<String>) -> Self {
        Self {
            key: index_name.into(),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn members(&self, store: &dyn RecordStore) -> Result<IdSet> {
        match store.get(&self.key).await? {
            Some(bytes) => decode(&self.key, &bytes),
            None => Ok(IdSet::new()),
        }
    }

    pub async fn contains(&self, store: &dyn RecordStore, id: &str) -> Result<bool> {
        Ok(self.members(store).await?.contains(id))
    }

    pub async fn add_all<I>(&self, store: &dyn RecordStore, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let additions: Vec<String> = ids.into_iter().collect();
        if additions.is_empty() {
            return Ok(());
        }
        let key = self.key.clone();
        store
            .update(
                &self.key,
                Box::new(move |current| {
                    let mut ids = read_set(&key, current)?;
                    ids.extend(additions);
                    encode(&key, &ids).map(Some)
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn add(&self, store: &dyn RecordStore, id: &str) -> Result<()> {
        self.add_all(store, [id.to_string()]).await
    }

    pub async fn remove_all<I>(&self, store: &dyn RecordStore, ids: I) -> Result<()>
    where
        I: IntoIterator<Item = String>,
    {
        let removals: Vec<String> = ids.into_iter().collect();
        if removals.is_empty() {
            return Ok(());
        }
        let key = self.key.clone();
        store
            .update(
                &self.key,
                Box::new(move |current| {
                    if current.is_none() {
                        return Ok(None);
                    }
                    let mut ids = read_set(&key, current)?;
                    for id in &removals {
                        ids.remove(id);
                    }
                    encode(&key, &ids).map(Some)
                }),
            )
            .await?;
        Ok(())
    }

    pub async fn remove(&self, store: &dyn RecordStore, id: &str) -> Result<()> {
        self.remove_all(store, [id.to_string()]).await
    }
}

fn read_set(key: &str, current: Option<&[u8]>) -> Result<IdSet> {
    match current {
        Some(bytes) => decode(key, bytes),
        None => Ok(IdSet::new()),
    }
}
