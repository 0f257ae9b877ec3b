//! Seed registry: one marker key per entity type.
//!
//! The marker lives in the backing store, not in process memory, so every
//! stateless invocation sees the same answer. It goes `Unset -> Set` once and
//! is never cleared.

use crate::core::codec::{decode, encode};
use crate::core::Result;
use crate::storage::RecordStore;

pub const SEED_MARKER_PREFIX: &str = "__seeded:";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedState {
    Unset,
    Set,
}

/// What one `ensure_seed` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    AlreadySeeded,
    /// Seed records were written by this call.
    Seeded(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedMarker {
    key: String,
}

impl SeedMarker {
    pub fn for_entity(entity_name: &str) -> Self {
        Self {
            key: format!("{SEED_MARKER_PREFIX}{entity_name}"),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub async fn state(&self, store: &dyn RecordStore) -> Result<SeedState> {
        let seeded = match store.get(&self.key).await? {
            Some(bytes) => decode::<bool>(&self.key, &bytes)?,
            None => false,
        };
        Ok(if seeded { SeedState::Set } else { SeedState::Unset })
    }

    pub async fn mark(&self, store: &dyn RecordStore) -> Result<()> {
        store.put(&self.key, encode(&self.key, &true)?).await
    }
}
