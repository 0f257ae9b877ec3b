pub mod engine;
pub mod memory;
pub mod persistence;

pub use engine::{KeyUpdate, RecordStore, SharedStore};
pub use memory::MemoryRecordStore;
pub use persistence::{DurabilityMode, FileRecordStore, FileStoreOptions};
