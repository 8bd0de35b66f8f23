// ABOUTME: Entity row types and creation inputs
// ABOUTME: Structures map 1:1 onto the entity and child tables

use chrono::{DateTime, Utc};
use hireboard_core::{EntityRef, ModuleType, RecordStatus};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Common lifecycle columns shared by every entity table, read generically
/// by module type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: String,
    pub module: ModuleType,
    pub record_number: Option<i64>,
    pub display_name: String,
    pub status: RecordStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub archive_reason: Option<String>,
}

impl EntityRecord {
    /// Human-facing label, e.g. `organization #42 (Acme)`.
    pub fn label(&self) -> String {
        match self.record_number {
            Some(number) => format!("{} #{} ({})", self.module, number, self.display_name),
            None => format!("{} {} ({})", self.module, self.id, self.display_name),
        }
    }

    pub fn entity_ref(&self) -> EntityRef {
        EntityRef::new(self.module, self.id.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Organization {
    pub id: String,
    pub record_number: Option<i64>,
    pub display_name: String,
    pub website: Option<String>,
    pub custom_fields: Option<String>,
    pub status: RecordStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub archive_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationCreateInput {
    pub display_name: String,
    pub website: Option<String>,
    pub custom_fields: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HiringManager {
    pub id: String,
    pub record_number: Option<i64>,
    pub organization_id: Option<String>,
    pub display_name: String,
    pub email: Option<String>,
    pub custom_fields: Option<String>,
    pub status: RecordStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub archive_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HiringManagerCreateInput {
    pub organization_id: Option<String>,
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct JobSeeker {
    pub id: String,
    pub record_number: Option<i64>,
    pub display_name: String,
    pub email: Option<String>,
    pub custom_fields: Option<String>,
    pub status: RecordStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub archive_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSeekerCreateInput {
    pub display_name: String,
    pub email: Option<String>,
    pub custom_fields: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Lead {
    pub id: String,
    pub record_number: Option<i64>,
    pub organization_id: Option<String>,
    pub display_name: String,
    pub email: Option<String>,
    pub custom_fields: Option<String>,
    pub status: RecordStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub archive_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeadCreateInput {
    pub organization_id: Option<String>,
    pub display_name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Job {
    pub id: String,
    pub record_number: Option<i64>,
    pub organization_id: Option<String>,
    pub display_name: String,
    pub custom_fields: Option<String>,
    pub status: RecordStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub archive_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobCreateInput {
    pub organization_id: Option<String>,
    pub display_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Placement {
    pub id: String,
    pub record_number: Option<i64>,
    pub job_id: Option<String>,
    pub job_seeker_id: Option<String>,
    pub display_name: String,
    pub custom_fields: Option<String>,
    pub status: RecordStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub archive_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacementCreateInput {
    pub job_id: Option<String>,
    pub job_seeker_id: Option<String>,
    pub display_name: String,
}

/// CRM task. Tasks attach to other entities through the polymorphic
/// (entity_type, entity_id) pair; scheduling tasks instead reference their
/// target through the JSON payload so cleanup can complete them after the
/// target row is gone.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CrmTask {
    pub id: String,
    pub record_number: Option<i64>,
    pub entity_type: Option<String>,
    pub entity_id: Option<String>,
    pub display_name: String,
    pub payload: Option<String>,
    pub due_at: Option<DateTime<Utc>>,
    pub completed: bool,
    pub status: RecordStatus,
    pub archived_at: Option<DateTime<Utc>>,
    pub archive_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskCreateInput {
    pub entity: Option<EntityRef>,
    pub display_name: String,
    pub due_at: Option<DateTime<Utc>>,
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Note {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub author: Option<String>,
    pub body: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HistoryEntry {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub action: String,
    pub detail: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Document {
    pub id: String,
    pub entity_type: String,
    pub entity_id: String,
    pub file_name: String,
    pub content_type: Option<String>,
    pub storage_key: String,
    pub uploaded_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentCreateInput {
    pub file_name: String,
    pub content_type: Option<String>,
    pub storage_key: String,
    pub uploaded_by: Option<String>,
}
