// ABOUTME: Delete-request row types, configuration, and sweep reporting
// ABOUTME: Status transitions: pending -> approved | denied | expired

use chrono::{DateTime, Utc};
use hireboard_core::{
    ModuleType, DEFAULT_DELETE_REQUEST_MAX_RETRIES, DEFAULT_DELETE_REQUEST_TTL_HOURS,
};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeleteRequestStatus {
    Pending,
    Approved,
    Denied,
    Expired,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum DeleteActionType {
    Standard,
    Transfer,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DeleteRequest {
    pub id: String,
    pub record_type: ModuleType,
    pub record_id: String,
    pub record_number: Option<i64>,
    pub requested_by: String,
    pub reason: String,
    pub action_type: DeleteActionType,
    pub dependency_summary: Option<String>,
    pub status: DeleteRequestStatus,
    pub denial_reason: Option<String>,
    pub reviewed_by: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    pub retry_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeleteRequest {
    /// Human-facing label for notification emails, e.g. `organization #42`.
    pub fn record_label(&self) -> String {
        match self.record_number {
            Some(number) => format!("{} #{}", self.record_type, number),
            None => format!("{} {}", self.record_type, self.record_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRequestCreateInput {
    pub record_type: ModuleType,
    pub record_id: String,
    pub requested_by: String,
    pub reason: String,
    pub action_type: Option<DeleteActionType>,
    pub dependency_summary: Option<String>,
}

#[derive(Debug, Clone)]
pub struct DeleteRequestConfig {
    /// Hours a pending request stays open before the expiry sweep replaces it.
    pub ttl_hours: i64,
    /// Re-issuance cap; past this an expired request gets no replacement.
    pub max_retries: i64,
    /// Recipient of approval-request notifications.
    pub reviewer_email: String,
}

impl Default for DeleteRequestConfig {
    fn default() -> Self {
        Self {
            ttl_hours: DEFAULT_DELETE_REQUEST_TTL_HOURS,
            max_retries: DEFAULT_DELETE_REQUEST_MAX_RETRIES,
            reviewer_email: "admin@localhost".to_string(),
        }
    }
}

impl DeleteRequestConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            ttl_hours: std::env::var("HIREBOARD_DELETE_REQUEST_TTL_HOURS")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.ttl_hours),
            max_retries: std::env::var("HIREBOARD_DELETE_REQUEST_MAX_RETRIES")
                .ok()
                .and_then(|value| value.parse().ok())
                .unwrap_or(defaults.max_retries),
            reviewer_email: std::env::var("HIREBOARD_REVIEWER_EMAIL")
                .unwrap_or(defaults.reviewer_email),
        }
    }
}

/// Outcome of one stale request during the expiry sweep.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ExpiryOutcome {
    /// Flipped to expired and replaced by a fresh pending request.
    Replaced {
        request_id: String,
        new_request_id: String,
        retry_count: i64,
    },
    /// Flipped to expired with no replacement; the chain terminates.
    RetryCapExhausted { request_id: String, retry_count: i64 },
    /// Another sweep run got there first; nothing to do.
    AlreadyHandled { request_id: String },
}

/// Returned by the expiry sweep; consumed for logging only.
#[derive(Debug, Default, Serialize)]
pub struct ExpirySweepReport {
    pub processed: usize,
    pub results: Vec<ExpiryOutcome>,
}
