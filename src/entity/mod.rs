//! Indexed entity store layered over a [`RecordStore`](crate::storage::RecordStore).
//!
//! Persisted key layout:
//! - record: `"<entityName>:<id>"` -> JSON record
//! - index: `"<indexName>"` -> JSON array of ids (a set)
//! - seed marker: `"__seeded:<entityName>"` -> `true`

mod handle;
pub mod index;
mod indexed;
mod macros;
mod record;
pub mod seed;

pub use handle::Entity;
pub use index::{IdIndex, IdSet};
pub use indexed::{IndexReport, IndexedEntity};
pub use record::{EntityRecord, IndexedRecord, ShallowMerge, entity_key, entity_prefix};
pub use seed::{SeedMarker, SeedOutcome, SeedState};
