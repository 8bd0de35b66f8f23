// ABOUTME: Transfer request storage and the atomic migration itself
// ABOUTME: Every child move and the source archival commit together or not at all

use std::sync::Arc;

use chrono::Utc;
use hireboard_core::{EntityRef, ModuleType, ARCHIVE_REASON_TRANSFER};
use hireboard_entities::{
    archive_on, get_record_on, insert_note_on, schedule_cleanup_on, JobSeeker,
};
use hireboard_notify::{messages, send_best_effort, Notifier};
use hireboard_storage::{StorageError, StorageResult};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::types::{
    TransferOutcome, TransferRequest, TransferRequestCreateInput, TransferSummary,
};

pub struct TransferStore {
    pool: SqlitePool,
    notifier: Arc<dyn Notifier>,
    reviewer_email: String,
}

impl TransferStore {
    pub fn new(pool: SqlitePool, notifier: Arc<dyn Notifier>, reviewer_email: String) -> Self {
        Self {
            pool,
            notifier,
            reviewer_email,
        }
    }

    /// File a job-seeker to job-seeker transfer for review.
    pub async fn request(
        &self,
        input: TransferRequestCreateInput,
    ) -> StorageResult<TransferRequest> {
        if input.source_id == input.target_id {
            return Err(StorageError::InvalidInput(
                "cannot transfer a record onto itself".to_string(),
            ));
        }

        let id = format!("tr-{}", nanoid::nanoid!());
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let source = get_record_on(&mut tx, ModuleType::JobSeeker, &input.source_id).await?;
        let target = get_record_on(&mut tx, ModuleType::JobSeeker, &input.target_id).await?;

        let pending: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM transfer_requests WHERE source_id = ? AND status = 'pending'",
        )
        .bind(&input.source_id)
        .fetch_one(&mut *tx)
        .await?;

        if pending > 0 {
            return Err(StorageError::Conflict(format!(
                "a pending transfer already exists for job seeker {}",
                input.source_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO transfer_requests (
                id, source_id, target_id, requested_by, reason, status,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, 'pending', ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.source_id)
        .bind(&input.target_id)
        .bind(&input.requested_by)
        .bind(&input.reason)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            let err = StorageError::from(err);
            if err.is_unique_violation() {
                StorageError::Conflict(format!(
                    "a pending transfer already exists for job seeker {}",
                    input.source_id
                ))
            } else {
                err
            }
        })?;

        tx.commit().await?;

        debug!("Transfer request {} created: {} -> {}", id, source.id, target.id);

        send_best_effort(
            self.notifier.as_ref(),
            messages::transfer_approval_request(
                &self.reviewer_email,
                &source.label(),
                &target.label(),
                &input.requested_by,
            ),
        )
        .await;

        self.get(&id).await
    }

    /// Approve a pending transfer and run the migration in one transaction:
    /// child rows are rewritten to the target, application history merged,
    /// audit notes added, and the source archived with reason `Transfer`.
    /// If any step fails nothing is moved and nothing is archived.
    pub async fn approve(&self, id: &str, reviewed_by: &str) -> StorageResult<TransferOutcome> {
        let request = self.get(id).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE transfer_requests \
             SET status = 'approved', reviewed_by = ?, reviewed_at = ?, updated_at = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(reviewed_by)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!(
                "transfer request {} was already processed",
                id
            )));
        }

        let source: JobSeeker = sqlx::query_as("SELECT * FROM job_seekers WHERE id = ?")
            .bind(&request.source_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                StorageError::NotFound(format!("job seeker {}", request.source_id))
            })?;
        let target: JobSeeker = sqlx::query_as("SELECT * FROM job_seekers WHERE id = ?")
            .bind(&request.target_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or_else(|| {
                StorageError::NotFound(format!("job seeker {}", request.target_id))
            })?;

        let mut moved = TransferSummary::default();

        // Polymorphic children move by rewriting entity_id
        moved.notes = sqlx::query(
            "UPDATE notes SET entity_id = ? WHERE entity_type = 'job_seeker' AND entity_id = ?",
        )
        .bind(&target.id)
        .bind(&source.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        moved.documents = sqlx::query(
            "UPDATE documents SET entity_id = ? WHERE entity_type = 'job_seeker' AND entity_id = ?",
        )
        .bind(&target.id)
        .bind(&source.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        moved.tasks = sqlx::query(
            "UPDATE tasks SET entity_id = ?, updated_at = ? \
             WHERE entity_type = 'job_seeker' AND entity_id = ?",
        )
        .bind(&target.id)
        .bind(now)
        .bind(&source.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        moved.placements = sqlx::query(
            "UPDATE placements SET job_seeker_id = ?, updated_at = ? WHERE job_seeker_id = ?",
        )
        .bind(&target.id)
        .bind(now)
        .bind(&source.id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        // Application history embedded in custom fields merges target-first
        let (merged_fields, moved_applications) = merge_applications(
            target.custom_fields.as_deref(),
            source.custom_fields.as_deref(),
        )?;
        moved.applications = moved_applications;

        sqlx::query("UPDATE job_seekers SET custom_fields = ?, updated_at = ? WHERE id = ?")
            .bind(&merged_fields)
            .bind(now)
            .bind(&target.id)
            .execute(&mut *tx)
            .await?;

        let source_ref = EntityRef::new(ModuleType::JobSeeker, source.id.clone());
        let target_ref = EntityRef::new(ModuleType::JobSeeker, target.id.clone());

        insert_note_on(
            &mut tx,
            &source_ref,
            Some(reviewed_by),
            &format!(
                "Transferred {} notes, {} documents, {} tasks, {} placements, {} applications to {}",
                moved.notes,
                moved.documents,
                moved.tasks,
                moved.placements,
                moved.applications,
                target.display_name
            ),
        )
        .await?;
        insert_note_on(
            &mut tx,
            &target_ref,
            Some(reviewed_by),
            &format!(
                "Received {} notes, {} documents, {} tasks, {} placements, {} applications from {}",
                moved.notes,
                moved.documents,
                moved.tasks,
                moved.placements,
                moved.applications,
                source.display_name
            ),
        )
        .await?;

        archive_on(&mut tx, ModuleType::JobSeeker, &source.id, ARCHIVE_REASON_TRANSFER).await?;
        schedule_cleanup_on(&mut tx, &source_ref).await?;

        tx.commit().await?;

        info!(
            "Transfer {} approved: {} -> {} ({} notes, {} documents, {} tasks, {} placements)",
            id, source.id, target.id, moved.notes, moved.documents, moved.tasks, moved.placements
        );

        send_best_effort(
            self.notifier.as_ref(),
            messages::transfer_approved(
                &request.requested_by,
                &source.display_name,
                &target.display_name,
                reviewed_by,
            ),
        )
        .await;

        Ok(TransferOutcome {
            request: self.get(id).await?,
            moved,
        })
    }

    /// Deny a pending transfer with a mandatory reason.
    pub async fn deny(
        &self,
        id: &str,
        reviewed_by: &str,
        denial_reason: &str,
    ) -> StorageResult<TransferRequest> {
        if denial_reason.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "a denial reason is required".to_string(),
            ));
        }

        let request = self.get(id).await?;
        let now = Utc::now();

        let result = sqlx::query(
            "UPDATE transfer_requests \
             SET status = 'denied', denial_reason = ?, reviewed_by = ?, reviewed_at = ?, \
                 updated_at = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(denial_reason)
        .bind(reviewed_by)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!(
                "transfer request {} was already processed",
                id
            )));
        }

        send_best_effort(
            self.notifier.as_ref(),
            messages::transfer_denied(
                &request.requested_by,
                &request.source_id,
                reviewed_by,
                denial_reason,
            ),
        )
        .await;

        self.get(id).await
    }

    pub async fn get(&self, id: &str) -> StorageResult<TransferRequest> {
        sqlx::query_as("SELECT * FROM transfer_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("transfer request {}", id)))
    }

    pub async fn list_for_source(&self, source_id: &str) -> StorageResult<Vec<TransferRequest>> {
        sqlx::query_as(
            "SELECT * FROM transfer_requests WHERE source_id = ? ORDER BY created_at DESC",
        )
        .bind(source_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }
}

/// Merge the `applications` arrays of two custom-field documents, keeping the
/// target's entries first and appending the source's after them. Other keys
/// of the target document are left untouched. Returns the merged document
/// and how many source entries moved.
fn merge_applications(
    target_fields: Option<&str>,
    source_fields: Option<&str>,
) -> StorageResult<(String, usize)> {
    let mut target = parse_fields(target_fields)?;
    let source = parse_fields(source_fields)?;

    let mut merged = target
        .get("applications")
        .and_then(serde_json::Value::as_array)
        .cloned()
        .unwrap_or_default();
    let source_applications = source
        .get("applications")
        .and_then(serde_json::Value::as_array)
        .cloned()
        .unwrap_or_default();

    let moved = source_applications.len();
    merged.extend(source_applications);

    if let serde_json::Value::Object(map) = &mut target {
        map.insert("applications".to_string(), serde_json::Value::Array(merged));
    }

    Ok((target.to_string(), moved))
}

fn parse_fields(fields: Option<&str>) -> StorageResult<serde_json::Value> {
    let value = match fields {
        Some(text) if !text.trim().is_empty() => serde_json::from_str(text)?,
        _ => serde_json::json!({}),
    };

    if value.is_object() {
        Ok(value)
    } else {
        Ok(serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use super::merge_applications;

    #[test]
    fn merge_keeps_target_entries_first() {
        let target = r#"{"applications": ["job-a"], "tier": "gold"}"#;
        let source = r#"{"applications": ["job-b", "job-c"]}"#;

        let (merged, moved) = merge_applications(Some(target), Some(source)).unwrap();
        let value: serde_json::Value = serde_json::from_str(&merged).unwrap();

        assert_eq!(moved, 2);
        assert_eq!(
            value["applications"],
            serde_json::json!(["job-a", "job-b", "job-c"])
        );
        // Unrelated target keys survive the merge
        assert_eq!(value["tier"], "gold");
    }

    #[test]
    fn merge_tolerates_missing_fields_on_both_sides() {
        let (merged, moved) = merge_applications(None, None).unwrap();
        let value: serde_json::Value = serde_json::from_str(&merged).unwrap();

        assert_eq!(moved, 0);
        assert_eq!(value["applications"], serde_json::json!([]));
    }
}
