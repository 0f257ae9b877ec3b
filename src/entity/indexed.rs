use super::handle::Entity;
use super::index::{IdIndex, IdSet};
use super::record::{IndexedRecord, entity_key, entity_prefix};
use super::seed::{SeedMarker, SeedOutcome, SeedState};
use crate::core::codec::{decode, encode};
use crate::core::Result;
use crate::storage::SharedStore;
use std::ops::Deref;
use tracing::{Level, event};

/// Result of comparing stored record keys with the id index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Records present in the store but missing from the index.
    pub unindexed: Vec<String>,
    /// Ids in the index with no record behind them.
    pub phantom: Vec<String>,
}

impl IndexReport {
    pub fn is_consistent(&self) -> bool {
        self.unindexed.is_empty() && self.phantom.is_empty()
    }
}

/// An [`Entity`] whose type keeps a set of live ids so it can be listed.
///
/// `create` and `delete` touch two keys (record, then index) without a
/// transaction. A failure between the two writes leaves a record that `list`
/// does not see, or an index id without a record; nothing repairs that in the
/// background. [`IndexedEntity::inspect_index`] reports such drift and
/// [`IndexedEntity::repair_index`] fixes it on request.
pub struct IndexedEntity<T: IndexedRecord> {
    entity: Entity<T>,
}

impl<T: IndexedRecord> Clone for IndexedEntity<T> {
    fn clone(&self) -> Self {
        Self {
            entity: self.entity.clone(),
        }
    }
}

impl<T: IndexedRecord> Deref for IndexedEntity<T> {
    type Target = Entity<T>;

    fn deref(&self) -> &Self::Target {
        &self.entity
    }
}

impl<T: IndexedRecord> IndexedEntity<T> {
    pub fn new(store: SharedStore, id: impl Into<String>) -> Self {
        Self {
            entity: Entity::new(store, id),
        }
    }

    pub fn index() -> IdIndex {
        IdIndex::new(T::INDEX_NAME)
    }

    pub fn seed_marker() -> SeedMarker {
        SeedMarker::for_entity(T::ENTITY_NAME)
    }

    /// Writes the record, then adds its id to the index.
    pub async fn create(store: &SharedStore, value: T) -> Result<T> {
        let id = value.id().to_string();
        let saved = Entity::<T>::new(store.clone(), id.as_str()).save(value).await?;
        Self::index().add(store.as_ref(), &id).await?;
        Ok(saved)
    }

    /// All indexed records, ordered by id.
    ///
    /// Index ids whose record cannot be found are skipped rather than
    /// reported as default-valued rows.
    pub async fn list(store: &SharedStore) -> Result<Vec<T>> {
        let ids = Self::index().members(store.as_ref()).await?;
        let keys: Vec<String> = ids
            .iter()
            .map(|id| entity_key(T::ENTITY_NAME, id))
            .collect();
        let values = store.get_many(&keys).await?;

        let mut items = Vec::with_capacity(keys.len());
        for (key, value) in keys.iter().zip(values) {
            match value {
                Some(bytes) => items.push(decode::<T>(key, &bytes)?),
                None => event!(
                    Level::WARN,
                    index = T::INDEX_NAME,
                    key = %key,
                    "indexed id has no record, skipping"
                ),
            }
        }
        Ok(items)
    }

    /// Number of ids in the index.
    pub async fn count(store: &SharedStore) -> Result<usize> {
        Ok(Self::index().members(store.as_ref()).await?.len())
    }

    /// Removes the record and its index entry.
    ///
    /// The id is dropped from the index even when the record was already
    /// gone, which clears entries left behind by an interrupted `create`.
    /// Returns whether the record existed.
    pub async fn delete(store: &SharedStore, id: &str) -> Result<bool> {
        let existed = Entity::<T>::delete(store, id).await?;
        Self::index().remove(store.as_ref(), id).await?;
        Ok(existed)
    }

    /// Writes [`IndexedRecord::seed_data`] the first time it is called for
    /// this type and does nothing afterwards.
    ///
    /// Two concurrent first calls may both write the seed set. Seed ids are
    /// fixed and index writes are set unions, so the outcome is the same as a
    /// single call.
    pub async fn ensure_seed(store: &SharedStore) -> Result<SeedOutcome> {
        let marker = Self::seed_marker();
        if marker.state(store.as_ref()).await? == SeedState::Set {
            return Ok(SeedOutcome::AlreadySeeded);
        }

        let seed = T::seed_data();
        let writes = seed.iter().map(|item| {
            let key = entity_key(T::ENTITY_NAME, item.id());
            async move {
                let bytes = encode(&key, item)?;
                store.put(&key, bytes).await
            }
        });
        futures::future::try_join_all(writes).await?;
        Self::index()
            .add_all(store.as_ref(), seed.iter().map(|item| item.id().to_string()))
            .await?;
        marker.mark(store.as_ref()).await?;

        event!(
            Level::INFO,
            entity = T::ENTITY_NAME,
            records = seed.len(),
            "seed data written"
        );
        Ok(SeedOutcome::Seeded(seed.len()))
    }

    /// Compares record keys under `"<entity>:"` with the index.
    pub async fn inspect_index(store: &SharedStore) -> Result<IndexReport> {
        let indexed = Self::index().members(store.as_ref()).await?;
        let prefix = entity_prefix(T::ENTITY_NAME);
        let stored: IdSet = store
            .list_prefix(&prefix)
            .await?
            .into_iter()
            .map(|(key, _)| key[prefix.len()..].to_string())
            .collect();

        Ok(IndexReport {
            unindexed: stored.difference(&indexed).cloned().collect(),
            phantom: indexed.difference(&stored).cloned().collect(),
        })
    }

    /// Brings the index in line with the stored records and returns what was fixed.
    pub async fn repair_index(store: &SharedStore) -> Result<IndexReport> {
        let report = Self::inspect_index(store).await?;
        if report.is_consistent() {
            return Ok(report);
        }

        let index = Self::index();
        index
            .add_all(store.as_ref(), report.unindexed.iter().cloned())
            .await?;
        index
            .remove_all(store.as_ref(), report.phantom.iter().cloned())
            .await?;

        event!(
            Level::WARN,
            index = T::INDEX_NAME,
            unindexed = report.unindexed.len(),
            phantom = report.phantom.len(),
            "index repaired"
        );
        Ok(report)
    }
}
