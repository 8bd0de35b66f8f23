// ABOUTME: Delete-request storage and state machine using SQLite
// ABOUTME: Optimistic status guards give at-most-once processing across concurrent runs

use std::sync::Arc;

use chrono::{Duration, Utc};
use hireboard_core::{EntityRef, ModuleType, ARCHIVE_REASON_DELETION};
use hireboard_entities::{archive_on, get_record_on, insert_note_on, schedule_cleanup_on};
use hireboard_notify::{messages, send_best_effort, Notifier};
use hireboard_storage::{StorageError, StorageResult};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::types::{
    DeleteActionType, DeleteRequest, DeleteRequestConfig, DeleteRequestCreateInput,
    ExpiryOutcome, ExpirySweepReport,
};

pub struct DeleteRequestStore {
    pool: SqlitePool,
    config: DeleteRequestConfig,
    notifier: Arc<dyn Notifier>,
}

impl DeleteRequestStore {
    pub fn new(pool: SqlitePool, config: DeleteRequestConfig, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            pool,
            config,
            notifier,
        }
    }

    /// Submit a deletion request for review. At most one pending request may
    /// exist per record; a duplicate is rejected as a conflict whether it is
    /// caught by the pre-check or by the partial unique index under a race.
    pub async fn create(&self, input: DeleteRequestCreateInput) -> StorageResult<DeleteRequest> {
        let id = format!("dr-{}", nanoid::nanoid!());
        let now = Utc::now();
        let action_type = input.action_type.unwrap_or(DeleteActionType::Standard);

        debug!(
            "Creating delete request {} for {} {}",
            id, input.record_type, input.record_id
        );

        let mut tx = self.pool.begin().await?;

        // The target must exist; its display number is denormalized onto the
        // request so notifications outlive the record itself.
        let record = get_record_on(&mut tx, input.record_type, &input.record_id).await?;

        let pending: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM delete_requests \
             WHERE record_type = ? AND record_id = ? AND status = 'pending'",
        )
        .bind(input.record_type)
        .bind(&input.record_id)
        .fetch_one(&mut *tx)
        .await?;

        if pending > 0 {
            return Err(StorageError::Conflict(format!(
                "a pending delete request already exists for {} {}",
                input.record_type, input.record_id
            )));
        }

        sqlx::query(
            r#"
            INSERT INTO delete_requests (
                id, record_type, record_id, record_number, requested_by,
                reason, action_type, dependency_summary, status, retry_count,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(input.record_type)
        .bind(&input.record_id)
        .bind(record.record_number)
        .bind(&input.requested_by)
        .bind(&input.reason)
        .bind(action_type)
        .bind(&input.dependency_summary)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|err| {
            let err = StorageError::from(err);
            if err.is_unique_violation() {
                StorageError::Conflict(format!(
                    "a pending delete request already exists for {} {}",
                    input.record_type, input.record_id
                ))
            } else {
                err
            }
        })?;

        tx.commit().await?;

        let request = self.get(&id).await?;

        send_best_effort(
            self.notifier.as_ref(),
            messages::approval_request(
                &self.config.reviewer_email,
                &request.record_label(),
                &request.requested_by,
                &request.reason,
            ),
        )
        .await;

        Ok(request)
    }

    /// Approve a pending request: archive the target with reason `Deletion`
    /// and schedule its hard deletion. The hard delete itself happens in the
    /// cleanup sweep once the grace period elapses.
    pub async fn approve(&self, id: &str, reviewed_by: &str) -> StorageResult<DeleteRequest> {
        let request = self.get(id).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE delete_requests \
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
                "delete request {} was already processed",
                id
            )));
        }

        let entity = EntityRef::new(request.record_type, request.record_id.clone());
        archive_on(&mut tx, request.record_type, &request.record_id, ARCHIVE_REASON_DELETION)
            .await?;
        schedule_cleanup_on(&mut tx, &entity).await?;

        tx.commit().await?;

        info!("Delete request {} approved by {}", id, reviewed_by);

        send_best_effort(
            self.notifier.as_ref(),
            messages::request_approved(&request.requested_by, &request.record_label(), reviewed_by),
        )
        .await;

        self.get(id).await
    }

    /// Deny a pending request with a mandatory reason; an audit note lands on
    /// the target record.
    pub async fn deny(
        &self,
        id: &str,
        reviewed_by: &str,
        denial_reason: &str,
    ) -> StorageResult<DeleteRequest> {
        if denial_reason.trim().is_empty() {
            return Err(StorageError::InvalidInput(
                "a denial reason is required".to_string(),
            ));
        }

        let request = self.get(id).await?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE delete_requests \
             SET status = 'denied', denial_reason = ?, reviewed_by = ?, reviewed_at = ?, \
                 updated_at = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(denial_reason)
        .bind(reviewed_by)
        .bind(now)
        .bind(now)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::Conflict(format!(
                "delete request {} was already processed",
                id
            )));
        }

        let entity = EntityRef::new(request.record_type, request.record_id.clone());
        insert_note_on(
            &mut tx,
            &entity,
            Some(reviewed_by),
            &format!("Deletion request denied: {}", denial_reason),
        )
        .await?;

        tx.commit().await?;

        info!("Delete request {} denied by {}", id, reviewed_by);

        send_best_effort(
            self.notifier.as_ref(),
            messages::request_denied(
                &request.requested_by,
                &request.record_label(),
                reviewed_by,
                denial_reason,
            ),
        )
        .await;

        self.get(id).await
    }

    pub async fn get(&self, id: &str) -> StorageResult<DeleteRequest> {
        sqlx::query_as("SELECT * FROM delete_requests WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("delete request {}", id)))
    }

    /// All requests ever filed against one record, newest first.
    pub async fn get_by_record(
        &self,
        record_type: ModuleType,
        record_id: &str,
    ) -> StorageResult<Vec<DeleteRequest>> {
        sqlx::query_as(
            "SELECT * FROM delete_requests WHERE record_type = ? AND record_id = ? \
             ORDER BY created_at DESC",
        )
        .bind(record_type)
        .bind(record_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    /// Expire pending requests older than the TTL, re-issuing each as a fresh
    /// pending request until the retry cap is reached. Each request is
    /// processed in its own transaction; the `status = 'pending'` guard makes
    /// overlapping sweep runs skip rather than double-expire.
    pub async fn run_expiry_sweep(&self) -> StorageResult<ExpirySweepReport> {
        let cutoff = Utc::now() - Duration::hours(self.config.ttl_hours);

        let stale: Vec<DeleteRequest> = sqlx::query_as(
            "SELECT * FROM delete_requests WHERE status = 'pending' AND created_at <= ? \
             ORDER BY created_at",
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        let mut report = ExpirySweepReport::default();

        for request in stale {
            let outcome = self.expire_one(&request).await?;

            // Notification happens outside the transaction and never affects
            // the recorded outcome
            if let ExpiryOutcome::Replaced { retry_count, .. } = &outcome {
                send_best_effort(
                    self.notifier.as_ref(),
                    messages::approval_request_reissued(
                        &self.config.reviewer_email,
                        &request.record_label(),
                        &request.requested_by,
                        &request.reason,
                        *retry_count,
                    ),
                )
                .await;
            }

            report.processed += 1;
            report.results.push(outcome);
        }

        info!(
            "Delete request expiry sweep processed {} stale requests",
            report.processed
        );
        Ok(report)
    }

    async fn expire_one(&self, request: &DeleteRequest) -> StorageResult<ExpiryOutcome> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "UPDATE delete_requests SET status = 'expired', updated_at = ? \
             WHERE id = ? AND status = 'pending'",
        )
        .bind(now)
        .bind(&request.id)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            // Another sweep run already handled this request
            return Ok(ExpiryOutcome::AlreadyHandled {
                request_id: request.id.clone(),
            });
        }

        let retry_count = request.retry_count + 1;

        if retry_count > self.config.max_retries {
            tx.commit().await?;
            debug!(
                "Delete request {} hit the retry cap ({}); chain terminated",
                request.id, self.config.max_retries
            );
            return Ok(ExpiryOutcome::RetryCapExhausted {
                request_id: request.id.clone(),
                retry_count: request.retry_count,
            });
        }

        let new_id = format!("dr-{}", nanoid::nanoid!());
        sqlx::query(
            r#"
            INSERT INTO delete_requests (
                id, record_type, record_id, record_number, requested_by,
                reason, action_type, dependency_summary, status, retry_count,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, 'pending', ?, ?, ?)
            "#,
        )
        .bind(&new_id)
        .bind(request.record_type)
        .bind(&request.record_id)
        .bind(request.record_number)
        .bind(&request.requested_by)
        .bind(&request.reason)
        .bind(request.action_type)
        .bind(&request.dependency_summary)
        .bind(retry_count)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        debug!(
            "Delete request {} expired, replaced by {} (retry {})",
            request.id, new_id, retry_count
        );
        Ok(ExpiryOutcome::Replaced {
            request_id: request.id.clone(),
            new_request_id: new_id,
            retry_count,
        })
    }
}
