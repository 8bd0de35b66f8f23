// ABOUTME: Transfer request row types and migration reporting
// ABOUTME: Status transitions: pending -> approved | denied

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransferStatus {
    Pending,
    Approved,
    Denied,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct TransferRequest {
    pub id: String,
    pub source_id: String,
    pub target_id: String,
    pub requested_by: String,
    pub reason: Option<String>,
    pub status: TransferStatus,
    pub denial_reason: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferRequestCreateInput {
    pub source_id: String,
    pub target_id: String,
    pub requested_by: String,
    pub reason: Option<String>,
}

/// Row counts moved by an approved transfer; reported in audit notes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct TransferSummary {
    pub notes: u64,
    pub documents: u64,
    pub tasks: u64,
    pub placements: u64,
    pub applications: usize,
}

#[derive(Debug, Serialize)]
pub struct TransferOutcome {
    pub request: TransferRequest,
    pub moved: TransferSummary,
}
