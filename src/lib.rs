// ============================================================================
// Dataset Catalog Library
// ============================================================================

pub mod catalog;
pub mod config;
pub mod core;
pub mod entity;
pub mod storage;
pub mod web;

// Re-export main types for convenience
pub use catalog::{CatalogError, CatalogIdentity, CatalogService};
pub use crate::core::{Result, StoreError};
pub use entity::{Entity, EntityRecord, IndexedEntity, IndexedRecord, ShallowMerge};
pub use storage::{FileRecordStore, MemoryRecordStore, RecordStore, SharedStore};
pub use web::{AppState, build_router};

#[doc(hidden)]
pub use paste;
