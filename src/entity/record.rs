use serde::{Serialize, de::DeserializeOwned};

/// A record type persisted under `"<ENTITY_NAME>:<id>"`.
pub trait EntityRecord: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Key prefix shared by every record of this type.
    const ENTITY_NAME: &'static str;

    /// Value read back for a key that is absent.
    fn initial_state() -> Self;

    fn id(&self) -> &str;
}

/// Field-by-field top-level merge of a partial value.
///
/// Nested structures carried by a patch replace the stored ones wholesale;
/// callers that want a nested merge have to pre-merge before patching.
pub trait ShallowMerge {
    type Patch: Send + 'static;

    fn merge(&mut self, patch: Self::Patch);
}

/// A record type that is also enumerable through a per-type id index.
pub trait IndexedRecord: EntityRecord {
    /// Key of the id set for this type.
    const INDEX_NAME: &'static str;

    /// Records written by the first `ensure_seed` for this type.
    fn seed_data() -> Vec<Self> {
        Vec::new()
    }
}

pub fn entity_prefix(entity_name: &str) -> String {
    format!("{entity_name}:")
}

pub fn entity_key(entity_name: &str, id: &str) -> String {
    format!("{entity_name}:{id}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_embed_the_entity_name() {
        assert_eq!(entity_key("user", "u1"), "user:u1");
        assert_ne!(entity_key("user", "x"), entity_key("dataset", "x"));
        assert!(entity_key("user", "x").starts_with(&entity_prefix("user")));
        assert!(!"users".starts_with(&entity_prefix("user")));
    }
}
