use super::record::{EntityRecord, ShallowMerge, entity_key};
use crate::core::codec::{decode, encode};
use crate::core::Result;
use crate::storage::SharedStore;
use std::marker::PhantomData;

/// Single-record access bound to one computed key.
///
/// Reads fall back to [`EntityRecord::initial_state`] when the key is absent,
/// so "never created" and "deleted" look the same here; use [`Entity::exists`]
/// when the difference matters.
pub struct Entity<T: EntityRecord> {
    store: SharedStore,
    id: String,
    key: String,
    marker: PhantomData<fn() -> T>,
}

impl<T: EntityRecord> Clone for Entity<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            id: self.id.clone(),
            key: self.key.clone(),
            marker: PhantomData,
        }
    }
}

impl<T: EntityRecord> Entity<T> {
    pub fn new(store: SharedStore, id: impl Into<String>) -> Self {
        let id = id.into();
        let key = entity_key(T::ENTITY_NAME, &id);
        Self {
            store,
            id,
            key,
            marker: PhantomData,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub async fn exists(&self) -> Result<bool> {
        self.store.contains(&self.key).await
    }

    /// Stored value, or `None` when the key is absent.
    pub async fn try_get(&self) -> Result<Option<T>> {
        match self.store.get(&self.key).await? {
            Some(bytes) => decode(&self.key, &bytes).map(Some),
            None => Ok(None),
        }
    }

    pub async fn get_state(&self) -> Result<T> {
        Ok(self.try_get().await?.unwrap_or_else(T::initial_state))
    }

    /// Full overwrite. Last writer wins.
    pub async fn save(&self, value: T) -> Result<T> {
        self.store.put(&self.key, encode(&self.key, &value)?).await?;
        Ok(value)
    }

    /// Reads the current value, applies `transform`, writes the result.
    ///
    /// This is a plain read followed by a plain write: two concurrent calls on
    /// the same key can read the same value, and the later write silently
    /// discards the earlier one. Callers that need every transform applied must
    /// serialize access themselves.
    pub async fn mutate<F>(&self, transform: F) -> Result<T>
    where
        F: FnOnce(T) -> T + Send,
    {
        let current = self.get_state().await?;
        self.save(transform(current)).await
    }

    /// Removes the record key only; index maintenance lives in `IndexedEntity`.
    pub async fn delete(store: &SharedStore, id: &str) -> Result<bool> {
        store.delete(&entity_key(T::ENTITY_NAME, id)).await
    }
}

impl<T> Entity<T>
where
    T: EntityRecord + ShallowMerge,
{
    /// Overwrites the top-level fields present in `partial` and writes the result.
    ///
    /// Same read-then-write race as [`Entity::mutate`].
    pub async fn patch(&self, partial: T::Patch) -> Result<T> {
        let mut current = self.get_state().await?;
        current.merge(partial);
        self.save(current).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::models::{Role, User, UserPatch};
    use crate::storage::{MemoryRecordStore, RecordStore};
    use std::sync::Arc;

    fn user(id: &str) -> User {
        User {
            id: id.to_string(),
            name: "Grace".to_string(),
            email: "grace@example.com".to_string(),
            role: Role::Contributor,
        }
    }

    #[tokio::test]
    async fn absent_key_reads_as_initial_state() {
        let store: SharedStore = Arc::new(MemoryRecordStore::new());
        let handle = Entity::<User>::new(store, "u9");

        assert_eq!(handle.key(), "user:u9");
        assert!(!handle.exists().await.unwrap());
        assert_eq!(handle.try_get().await.unwrap(), None);
        assert_eq!(handle.get_state().await.unwrap(), User::initial_state());
    }

    #[tokio::test]
    async fn patch_and_mutate_write_through() {
        let store: SharedStore = Arc::new(MemoryRecordStore::new());
        let handle = Entity::<User>::new(store, "u1");
        handle.save(user("u1")).await.unwrap();

        let patched = handle
            .patch(UserPatch {
                role: Some(Role::Admin),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(patched.role, Role::Admin);
        assert_eq!(patched.email, "grace@example.com");

        let renamed = handle
            .mutate(|mut current| {
                current.name = "Grace H.".to_string();
                current
            })
            .await
            .unwrap();
        assert_eq!(handle.get_state().await.unwrap(), renamed);
    }

    #[tokio::test]
    async fn delete_removes_only_the_record_key() {
        let store: SharedStore = Arc::new(MemoryRecordStore::new());
        store.put("users", b"[\"u1\"]".to_vec()).await.unwrap();
        Entity::<User>::new(store.clone(), "u1")
            .save(user("u1"))
            .await
            .unwrap();

        assert!(Entity::<User>::delete(&store, "u1").await.unwrap());
        assert!(!Entity::<User>::delete(&store, "u1").await.unwrap());
        assert!(store.get("users").await.unwrap().is_some());
    }
}
