use super::seed_data;
use crate::entity::{EntityRecord, IndexedRecord};
use crate::entity_record;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Value as JsonValue, json};

// ============================================================================
// Users
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Role {
    Admin,
    #[serde(rename = "Data Owner")]
    DataOwner,
    Contributor,
    #[default]
    Viewer,
}

entity_record! {
    #[serde(rename_all = "camelCase")]
    pub struct User {
        pub id: String,
        pub name: String,
        pub email: String,
        pub role: Role,
    }
}

impl EntityRecord for User {
    const ENTITY_NAME: &'static str = "user";

    fn initial_state() -> Self {
        Self {
            id: String::new(),
            name: String::new(),
            email: String::new(),
            role: Role::Viewer,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl IndexedRecord for User {
    const INDEX_NAME: &'static str = "users";

    fn seed_data() -> Vec<Self> {
        seed_data::users()
    }
}

// ============================================================================
// Datasets
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Visibility {
    Public,
    #[default]
    Private,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum UpdateFrequency {
    #[default]
    OneTime,
    Daily,
    Weekly,
    Monthly,
    Quarterly,
    Annual,
}

/// ISO 8601 dates, kept as strings the way clients send them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoverageTime {
    pub start_date: String,
    pub end_date: String,
}

entity_record! {
    #[serde(default)]
    pub struct Metadata {
        pub keywords: Vec<String>,
        pub categories: Vec<String>,
        pub publisher: String,
        pub contact_email: String,
        pub coverage_geographic: String,
        pub coverage_time: CoverageTime,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub methodology: Option<String>,
        pub data_dictionary: String,
        pub license: String,
        pub update_frequency: UpdateFrequency,
        pub version: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub data_quality_notes: Option<String>,
    }
}

impl Default for Metadata {
    fn default() -> Self {
        Self {
            keywords: Vec::new(),
            categories: Vec::new(),
            publisher: String::new(),
            contact_email: String::new(),
            coverage_geographic: String::new(),
            coverage_time: CoverageTime::default(),
            methodology: None,
            data_dictionary: String::new(),
            license: String::new(),
            update_frequency: UpdateFrequency::OneTime,
            version: "1.0.0".to_string(),
            data_quality_notes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileFormat {
    #[serde(rename = "CSV")]
    Csv,
    #[serde(rename = "XLSX")]
    Xlsx,
    #[serde(rename = "JSON")]
    Json,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetFile {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub format: FileFormat,
}

entity_record! {
    #[serde(rename_all = "camelCase")]
    pub struct Dataset {
        pub id: String,
        pub title: String,
        pub description: String,
        pub owner_id: String,
        pub contributor_ids: Vec<String>,
        pub visibility: Visibility,
        pub metadata: Metadata,
        pub files: Vec<DatasetFile>,
        pub created_at: DateTime<Utc>,
        pub updated_at: DateTime<Utc>,
    }
}

impl EntityRecord for Dataset {
    const ENTITY_NAME: &'static str = "dataset";

    fn initial_state() -> Self {
        let now = Utc::now();
        Self {
            id: String::new(),
            title: String::new(),
            description: String::new(),
            owner_id: String::new(),
            contributor_ids: Vec::new(),
            visibility: Visibility::Private,
            metadata: Metadata::default(),
            files: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl IndexedRecord for Dataset {
    const INDEX_NAME: &'static str = "datasets";

    fn seed_data() -> Vec<Self> {
        seed_data::datasets()
    }
}

// ============================================================================
// Access requests
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AccessStatus {
    #[default]
    Pending,
    Approved,
    Denied,
}

entity_record! {
    #[serde(rename_all = "camelCase")]
    pub struct AccessRequest {
        pub id: String,
        pub dataset_id: String,
        pub requestor_id: String,
        pub status: AccessStatus,
        pub purpose: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub organization: Option<String>,
        /// Unix epoch milliseconds.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub expires_at: Option<i64>,
        /// Unix epoch milliseconds.
        pub created_at: i64,
    }
}

impl EntityRecord for AccessRequest {
    const ENTITY_NAME: &'static str = "accessRequest";

    fn initial_state() -> Self {
        Self {
            id: String::new(),
            dataset_id: String::new(),
            requestor_id: String::new(),
            status: AccessStatus::Pending,
            purpose: String::new(),
            organization: None,
            expires_at: None,
            created_at: 0,
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl IndexedRecord for AccessRequest {
    const INDEX_NAME: &'static str = "accessRequests";
}

// ============================================================================
// Audit trail
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AuditEntity {
    #[default]
    Dataset,
    User,
    Request,
    File,
}

entity_record! {
    #[serde(rename_all = "camelCase")]
    pub struct AuditLog {
        pub id: String,
        /// Unix epoch milliseconds.
        pub timestamp: i64,
        pub user_id: String,
        pub action: String,
        pub entity: AuditEntity,
        pub entity_id: String,
        pub details: JsonValue,
    }
}

impl EntityRecord for AuditLog {
    const ENTITY_NAME: &'static str = "auditLog";

    fn initial_state() -> Self {
        Self {
            id: String::new(),
            timestamp: 0,
            user_id: String::new(),
            action: String::new(),
            entity: AuditEntity::Dataset,
            entity_id: String::new(),
            details: json!({}),
        }
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl IndexedRecord for AuditLog {
    const INDEX_NAME: &'static str = "auditLogs";
}

// ============================================================================
// Request payloads
// ============================================================================

/// Body of a dataset creation; server-owned fields are filled in by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewDataset {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub visibility: Visibility,
    #[serde(default)]
    pub metadata: Metadata,
}

/// Partial dataset update. `metadata` is merged into the stored metadata
/// rather than replacing it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visibility: Option<Visibility>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<MetadataPatch>,
}

impl DatasetUpdate {
    pub fn changed_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if self.title.is_some() {
            fields.push("title");
        }
        if self.description.is_some() {
            fields.push("description");
        }
        if self.visibility.is_some() {
            fields.push("visibility");
        }
        if self.metadata.is_some() {
            fields.push("metadata");
        }
        fields
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRequestPayload {
    #[serde(default)]
    pub purpose: String,
    #[serde(default)]
    pub organization: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewUser {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Option<Role>,
}

// ============================================================================
// Response views
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessRequestWithRequestor {
    #[serde(flatten)]
    pub request: AccessRequest,
    pub requestor: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccessRequestWithDataset {
    #[serde(flatten)]
    pub request: AccessRequest,
    pub dataset: Option<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditLogWithUser {
    #[serde(flatten)]
    pub log: AuditLog,
    pub user: Option<User>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadLink {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
