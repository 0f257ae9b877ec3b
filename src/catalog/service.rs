use super::models::{
    AccessRequest, AccessRequestPatch, AccessRequestPayload, AccessRequestWithDataset,
    AccessRequestWithRequestor, AccessStatus, AuditEntity, AuditLog, AuditLogWithUser, Dataset,
    DatasetUpdate, DownloadLink, Message, NewDataset, NewUser, User, UserPatch,
};
use crate::core::StoreError;
use crate::entity::{IndexedEntity, SeedOutcome, ShallowMerge};
use crate::storage::SharedStore;
use chrono::Utc;
use serde_json::{Value as JsonValue, json};
use std::collections::HashMap;
use thiserror::Error;
use tracing::{Level, event};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type CatalogResult<T> = std::result::Result<T, CatalogError>;

/// Fixed identities standing in for an authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogIdentity {
    /// Requests access and downloads files.
    pub current_user_id: String,
    /// Author of administrative audit entries.
    pub admin_user_id: String,
    /// Owner assigned to newly created datasets.
    pub owner_user_id: String,
}

impl Default for CatalogIdentity {
    fn default() -> Self {
        Self {
            current_user_id: "user-4".to_string(),
            admin_user_id: "user-1".to_string(),
            owner_user_id: "user-2".to_string(),
        }
    }
}

#[derive(Clone)]
pub struct CatalogService {
    store: SharedStore,
    identity: CatalogIdentity,
}

impl CatalogService {
    pub fn new(store: SharedStore, identity: CatalogIdentity) -> Self {
        Self { store, identity }
    }

    pub fn store(&self) -> &SharedStore {
        &self.store
    }

    pub fn identity(&self) -> &CatalogIdentity {
        &self.identity
    }

    /// Seeds users and datasets if that has not happened yet.
    pub async fn ensure_seed(&self) -> CatalogResult<(SeedOutcome, SeedOutcome)> {
        let outcomes = tokio::try_join!(
            IndexedEntity::<User>::ensure_seed(&self.store),
            IndexedEntity::<Dataset>::ensure_seed(&self.store),
        )?;
        Ok(outcomes)
    }

    // ------------------------------------------------------------------
    // Datasets
    // ------------------------------------------------------------------

    pub async fn list_datasets(&self) -> CatalogResult<Vec<Dataset>> {
        Ok(IndexedEntity::<Dataset>::list(&self.store).await?)
    }

    pub async fn get_dataset(&self, id: &str) -> CatalogResult<Dataset> {
        let dataset = self.dataset_handle(id).await?;
        Ok(dataset.get_state().await?)
    }

    pub async fn create_dataset(&self, payload: NewDataset) -> CatalogResult<Dataset> {
        if payload.title.trim().is_empty() || payload.description.trim().is_empty() {
            return Err(CatalogError::Validation(
                "Title and description are required".to_string(),
            ));
        }

        let now = Utc::now();
        let dataset = Dataset {
            id: Uuid::new_v4().to_string(),
            title: payload.title,
            description: payload.description,
            owner_id: self.identity.owner_user_id.clone(),
            contributor_ids: Vec::new(),
            visibility: payload.visibility,
            metadata: payload.metadata,
            files: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        let created = IndexedEntity::create(&self.store, dataset).await?;

        self.record_audit(
            &self.identity.admin_user_id,
            "dataset_create",
            AuditEntity::Dataset,
            &created.id,
            json!({ "title": created.title }),
        )
        .await?;
        Ok(created)
    }

    /// Overwrites the fields present in `update`; metadata fields are merged
    /// into the stored metadata one by one.
    pub async fn update_dataset(&self, id: &str, update: DatasetUpdate) -> CatalogResult<Dataset> {
        let dataset = self.dataset_handle(id).await?;
        let changes = update.changed_fields();

        let updated = dataset
            .mutate(move |mut current| {
                if let Some(title) = update.title {
                    current.title = title;
                }
                if let Some(description) = update.description {
                    current.description = description;
                }
                if let Some(visibility) = update.visibility {
                    current.visibility = visibility;
                }
                if let Some(metadata) = update.metadata {
                    current.metadata.merge(metadata);
                }
                current.updated_at = Utc::now();
                current
            })
            .await?;

        self.record_audit(
            &self.identity.admin_user_id,
            "dataset_update",
            AuditEntity::Dataset,
            id,
            json!({ "changes": changes }),
        )
        .await?;
        Ok(updated)
    }

    pub async fn download_dataset(&self, id: &str) -> CatalogResult<DownloadLink> {
        self.dataset_handle(id).await?;
        self.record_audit(
            &self.identity.current_user_id,
            "file_download",
            AuditEntity::File,
            id,
            json!({ "datasetId": id }),
        )
        .await?;
        Ok(DownloadLink {
            url: format!("/mock-download/{id}.zip"),
        })
    }

    async fn dataset_handle(&self, id: &str) -> CatalogResult<IndexedEntity<Dataset>> {
        let dataset = IndexedEntity::<Dataset>::new(self.store.clone(), id);
        if !dataset.exists().await? {
            return Err(CatalogError::NotFound("Dataset not found".to_string()));
        }
        Ok(dataset)
    }

    // ------------------------------------------------------------------
    // Access requests
    // ------------------------------------------------------------------

    pub async fn request_access(
        &self,
        dataset_id: &str,
        payload: AccessRequestPayload,
    ) -> CatalogResult<Message> {
        if payload.purpose.trim().is_empty() || payload.organization.trim().is_empty() {
            return Err(CatalogError::Validation(
                "Purpose and organization are required".to_string(),
            ));
        }
        self.dataset_handle(dataset_id).await?;

        let request = AccessRequest {
            id: Uuid::new_v4().to_string(),
            dataset_id: dataset_id.to_string(),
            requestor_id: self.identity.current_user_id.clone(),
            status: AccessStatus::Pending,
            purpose: payload.purpose,
            organization: Some(payload.organization),
            expires_at: None,
            created_at: Utc::now().timestamp_millis(),
        };
        let created = IndexedEntity::create(&self.store, request).await?;

        self.record_audit(
            &created.requestor_id,
            "access_request_create",
            AuditEntity::Request,
            &created.id,
            json!({ "datasetId": dataset_id }),
        )
        .await?;
        Ok(Message::new("Request submitted successfully"))
    }

    /// Pending requests, each with the user who filed it.
    pub async fn pending_access_requests(&self) -> CatalogResult<Vec<AccessRequestWithRequestor>> {
        let (requests, users) = tokio::try_join!(
            IndexedEntity::<AccessRequest>::list(&self.store),
            IndexedEntity::<User>::list(&self.store),
        )?;
        let users_by_id: HashMap<String, User> =
            users.into_iter().map(|user| (user.id.clone(), user)).collect();

        Ok(requests
            .into_iter()
            .filter(|request| request.status == AccessStatus::Pending)
            .map(|request| AccessRequestWithRequestor {
                requestor: users_by_id.get(&request.requestor_id).cloned(),
                request,
            })
            .collect())
    }

    /// The current user's requests in any status, each with its dataset.
    pub async fn my_requests(&self) -> CatalogResult<Vec<AccessRequestWithDataset>> {
        let (requests, datasets) = tokio::try_join!(
            IndexedEntity::<AccessRequest>::list(&self.store),
            IndexedEntity::<Dataset>::list(&self.store),
        )?;
        let datasets_by_id: HashMap<String, Dataset> = datasets
            .into_iter()
            .map(|dataset| (dataset.id.clone(), dataset))
            .collect();

        Ok(requests
            .into_iter()
            .filter(|request| request.requestor_id == self.identity.current_user_id)
            .map(|request| AccessRequestWithDataset {
                dataset: datasets_by_id.get(&request.dataset_id).cloned(),
                request,
            })
            .collect())
    }

    pub async fn approve_request(&self, id: &str) -> CatalogResult<Message> {
        self.set_request_status(id, AccessStatus::Approved, "access_request_approve")
            .await?;
        Ok(Message::new("Request approved"))
    }

    pub async fn deny_request(&self, id: &str) -> CatalogResult<Message> {
        self.set_request_status(id, AccessStatus::Denied, "access_request_deny")
            .await?;
        Ok(Message::new("Request denied"))
    }

    async fn set_request_status(
        &self,
        id: &str,
        status: AccessStatus,
        action: &str,
    ) -> CatalogResult<AccessRequest> {
        let request = IndexedEntity::<AccessRequest>::new(self.store.clone(), id);
        if !request.exists().await? {
            return Err(CatalogError::NotFound("Request not found".to_string()));
        }

        let updated = request
            .patch(AccessRequestPatch {
                status: Some(status),
                ..Default::default()
            })
            .await?;

        self.record_audit(
            &self.identity.admin_user_id,
            action,
            AuditEntity::Request,
            id,
            json!({}),
        )
        .await?;
        Ok(updated)
    }

    // ------------------------------------------------------------------
    // Users
    // ------------------------------------------------------------------

    pub async fn list_users(&self) -> CatalogResult<Vec<User>> {
        Ok(IndexedEntity::<User>::list(&self.store).await?)
    }

    pub async fn create_user(&self, payload: NewUser) -> CatalogResult<User> {
        let role = match payload.role {
            Some(role) if !payload.name.trim().is_empty() && !payload.email.trim().is_empty() => {
                role
            }
            _ => {
                return Err(CatalogError::Validation(
                    "Name, email, and role are required".to_string(),
                ));
            }
        };

        let user = User {
            id: Uuid::new_v4().to_string(),
            name: payload.name,
            email: payload.email,
            role,
        };
        let created = IndexedEntity::create(&self.store, user).await?;

        self.record_audit(
            &self.identity.admin_user_id,
            "user_create",
            AuditEntity::User,
            &created.id,
            json!({ "email": created.email, "role": created.role }),
        )
        .await?;
        Ok(created)
    }

    /// Shallow-patches a user. The id in the stored record never changes.
    pub async fn update_user(&self, id: &str, mut patch: UserPatch) -> CatalogResult<User> {
        let user = IndexedEntity::<User>::new(self.store.clone(), id);
        if !user.exists().await? {
            return Err(CatalogError::NotFound("User not found".to_string()));
        }

        patch.id = None;
        let changes = patch.changed_fields();
        let updated = user.patch(patch).await?;

        self.record_audit(
            &self.identity.admin_user_id,
            "user_update",
            AuditEntity::User,
            id,
            json!({ "changes": changes }),
        )
        .await?;
        Ok(updated)
    }

    pub async fn delete_user(&self, id: &str) -> CatalogResult<Message> {
        if !IndexedEntity::<User>::delete(&self.store, id).await? {
            return Err(CatalogError::NotFound("User not found".to_string()));
        }

        self.record_audit(
            &self.identity.admin_user_id,
            "user_delete",
            AuditEntity::User,
            id,
            json!({}),
        )
        .await?;
        Ok(Message::new("User deleted"))
    }

    // ------------------------------------------------------------------
    // Audit trail
    // ------------------------------------------------------------------

    /// Every audit entry with its author, newest first.
    pub async fn audit_logs(&self) -> CatalogResult<Vec<AuditLogWithUser>> {
        let (logs, users) = tokio::try_join!(
            IndexedEntity::<AuditLog>::list(&self.store),
            IndexedEntity::<User>::list(&self.store),
        )?;
        let users_by_id: HashMap<String, User> =
            users.into_iter().map(|user| (user.id.clone(), user)).collect();

        let mut populated: Vec<AuditLogWithUser> = logs
            .into_iter()
            .map(|log| AuditLogWithUser {
                user: users_by_id.get(&log.user_id).cloned(),
                log,
            })
            .collect();
        populated.sort_by(|a, b| b.log.timestamp.cmp(&a.log.timestamp));
        Ok(populated)
    }

    async fn record_audit(
        &self,
        user_id: &str,
        action: &str,
        entity: AuditEntity,
        entity_id: &str,
        details: JsonValue,
    ) -> CatalogResult<AuditLog> {
        let log = AuditLog {
            id: Uuid::new_v4().to_string(),
            timestamp: Utc::now().timestamp_millis(),
            user_id: user_id.to_string(),
            action: action.to_string(),
            entity,
            entity_id: entity_id.to_string(),
            details,
        };
        let created = IndexedEntity::create(&self.store, log).await?;

        event!(
            Level::INFO,
            action = %created.action,
            entity_id = %created.entity_id,
            user_id = %created.user_id,
            "audit entry recorded"
        );
        Ok(created)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryRecordStore;
    use std::sync::Arc;

    fn service() -> CatalogService {
        CatalogService::new(Arc::new(MemoryRecordStore::new()), CatalogIdentity::default())
    }

    #[tokio::test]
    async fn create_dataset_requires_title_and_description() {
        let service = service();
        let err = service
            .create_dataset(NewDataset {
                title: "Only a title".to_string(),
                description: "   ".to_string(),
                visibility: Default::default(),
                metadata: Default::default(),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::Validation(_)));
        assert!(service.audit_logs().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_user_requires_a_role() {
        let service = service();
        let err = service
            .create_user(NewUser {
                name: "Eve".to_string(),
                email: "eve@example.com".to_string(),
                role: None,
            })
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Name, email, and role are required");
    }

    #[tokio::test]
    async fn update_user_keeps_the_stored_id() {
        let service = service();
        service.ensure_seed().await.unwrap();

        let patch: UserPatch =
            serde_json::from_value(json!({ "id": "user-99", "name": "Diana Prince" })).unwrap();
        let updated = service.update_user("user-4", patch).await.unwrap();

        assert_eq!(updated.id, "user-4");
        assert_eq!(updated.name, "Diana Prince");
        let logs = service.audit_logs().await.unwrap();
        assert_eq!(logs[0].log.details, json!({ "changes": ["name"] }));
    }

    #[tokio::test]
    async fn request_access_to_unknown_dataset_is_not_found() {
        let service = service();
        let err = service
            .request_access(
                "ds-missing",
                AccessRequestPayload {
                    purpose: "Research".to_string(),
                    organization: "University".to_string(),
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, CatalogError::NotFound(_)));
    }
}
