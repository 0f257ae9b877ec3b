//! Dataset catalog domain: users, datasets, access requests and the audit trail.

pub mod models;
mod seed_data;
mod service;

pub use models::{
    AccessRequest, AccessRequestPayload, AccessRequestWithDataset, AccessRequestWithRequestor,
    AccessStatus, AuditEntity, AuditLog, AuditLogWithUser, Dataset, DatasetUpdate, DownloadLink,
    Message, Metadata, MetadataPatch, NewDataset, NewUser, Role, User, UserPatch, Visibility,
};
pub use service::{CatalogError, CatalogIdentity, CatalogResult, CatalogService};
