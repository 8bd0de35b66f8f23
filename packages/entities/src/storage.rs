// ABOUTME: Entity storage layer using SQLite
// ABOUTME: Creation allocates record numbers transactionally; hard deletes cascade and release

use chrono::Utc;
use hireboard_core::{EntityRef, ModuleType, CLEANUP_TASK_SUBJECT};
use hireboard_records::release;
use hireboard_storage::{StorageError, StorageResult};
use sqlx::{Row, SqliteConnection, SqlitePool};
use tracing::debug;

use crate::types::{
    CrmTask, Document, DocumentCreateInput, EntityRecord, HiringManager,
    HiringManagerCreateInput, HistoryEntry, Job, JobCreateInput, JobSeeker, JobSeekerCreateInput,
    Lead, LeadCreateInput, Note, Organization, OrganizationCreateInput, Placement,
    PlacementCreateInput, TaskCreateInput,
};

fn new_id(prefix: &str) -> String {
    format!("{}-{}", prefix, nanoid::nanoid!())
}

fn json_to_text(value: Option<&serde_json::Value>) -> StorageResult<Option<String>> {
    value
        .map(serde_json::to_string)
        .transpose()
        .map_err(StorageError::Json)
}

pub struct EntityStore {
    pool: SqlitePool,
}

impl EntityStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    // ==================== Creation ====================

    pub async fn create_organization(
        &self,
        input: OrganizationCreateInput,
    ) -> StorageResult<Organization> {
        let id = new_id(ModuleType::Organization.id_prefix());
        let now = Utc::now();
        let custom_fields = json_to_text(input.custom_fields.as_ref())?;

        debug!("Creating organization: {}", id);

        let mut tx = self.pool.begin().await?;
        let number = hireboard_records::allocate(&mut tx, ModuleType::Organization).await?;

        sqlx::query(
            r#"
            INSERT INTO organizations (
                id, record_number, display_name, website, custom_fields,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(number)
        .bind(&input.display_name)
        .bind(&input.website)
        .bind(&custom_fields)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_organization(&id).await
    }

    pub async fn create_hiring_manager(
        &self,
        input: HiringManagerCreateInput,
    ) -> StorageResult<HiringManager> {
        let id = new_id(ModuleType::HiringManager.id_prefix());
        let now = Utc::now();

        debug!("Creating hiring manager: {}", id);

        let mut tx = self.pool.begin().await?;
        let number = hireboard_records::allocate(&mut tx, ModuleType::HiringManager).await?;

        sqlx::query(
            r#"
            INSERT INTO hiring_managers (
                id, record_number, organization_id, display_name, email,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(number)
        .bind(&input.organization_id)
        .bind(&input.display_name)
        .bind(&input.email)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_hiring_manager(&id).await
    }

    pub async fn create_job_seeker(&self, input: JobSeekerCreateInput) -> StorageResult<JobSeeker> {
        let id = new_id(ModuleType::JobSeeker.id_prefix());
        let now = Utc::now();
        let custom_fields = json_to_text(input.custom_fields.as_ref())?;

        debug!("Creating job seeker: {}", id);

        let mut tx = self.pool.begin().await?;
        let number = hireboard_records::allocate(&mut tx, ModuleType::JobSeeker).await?;

        sqlx::query(
            r#"
            INSERT INTO job_seekers (
                id, record_number, display_name, email, custom_fields,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(number)
        .bind(&input.display_name)
        .bind(&input.email)
        .bind(&custom_fields)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_job_seeker(&id).await
    }

    pub async fn create_lead(&self, input: LeadCreateInput) -> StorageResult<Lead> {
        let id = new_id(ModuleType::Lead.id_prefix());
        let now = Utc::now();

        debug!("Creating lead: {}", id);

        let mut tx = self.pool.begin().await?;
        let number = hireboard_records::allocate(&mut tx, ModuleType::Lead).await?;

        sqlx::query(
            r#"
            INSERT INTO leads (
                id, record_number, organization_id, display_name, email,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(number)
        .bind(&input.organization_id)
        .bind(&input.display_name)
        .bind(&input.email)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_lead(&id).await
    }

    pub async fn create_job(&self, input: JobCreateInput) -> StorageResult<Job> {
        let id = new_id(ModuleType::Job.id_prefix());
        let now = Utc::now();

        debug!("Creating job: {}", id);

        let mut tx = self.pool.begin().await?;
        let number = hireboard_records::allocate(&mut tx, ModuleType::Job).await?;

        sqlx::query(
            r#"
            INSERT INTO jobs (
                id, record_number, organization_id, display_name,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(number)
        .bind(&input.organization_id)
        .bind(&input.display_name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_job(&id).await
    }

    pub async fn create_placement(&self, input: PlacementCreateInput) -> StorageResult<Placement> {
        let id = new_id(ModuleType::Placement.id_prefix());
        let now = Utc::now();

        debug!("Creating placement: {}", id);

        let mut tx = self.pool.begin().await?;
        let number = hireboard_records::allocate(&mut tx, ModuleType::Placement).await?;

        sqlx::query(
            r#"
            INSERT INTO placements (
                id, record_number, job_id, job_seeker_id, display_name,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(number)
        .bind(&input.job_id)
        .bind(&input.job_seeker_id)
        .bind(&input.display_name)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_placement(&id).await
    }

    pub async fn create_task(&self, input: TaskCreateInput) -> StorageResult<CrmTask> {
        let id = new_id(ModuleType::Task.id_prefix());
        let now = Utc::now();
        let payload = json_to_text(input.payload.as_ref())?;

        debug!("Creating task: {}", id);

        let mut tx = self.pool.begin().await?;
        let number = hireboard_records::allocate(&mut tx, ModuleType::Task).await?;

        sqlx::query(
            r#"
            INSERT INTO tasks (
                id, record_number, entity_type, entity_id, display_name,
                payload, due_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(number)
        .bind(input.entity.as_ref().map(|e| e.module.as_str()))
        .bind(input.entity.as_ref().map(|e| e.id.as_str()))
        .bind(&input.display_name)
        .bind(&payload)
        .bind(input.due_at)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_task(&id).await
    }

    // ==================== Typed getters ====================

    pub async fn get_organization(&self, id: &str) -> StorageResult<Organization> {
        sqlx::query_as("SELECT * FROM organizations WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("organization {}", id)))
    }

    pub async fn get_hiring_manager(&self, id: &str) -> StorageResult<HiringManager> {
        sqlx::query_as("SELECT * FROM hiring_managers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("hiring manager {}", id)))
    }

    pub async fn get_job_seeker(&self, id: &str) -> StorageResult<JobSeeker> {
        sqlx::query_as("SELECT * FROM job_seekers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("job seeker {}", id)))
    }

    pub async fn get_lead(&self, id: &str) -> StorageResult<Lead> {
        sqlx::query_as("SELECT * FROM leads WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("lead {}", id)))
    }

    pub async fn get_job(&self, id: &str) -> StorageResult<Job> {
        sqlx::query_as("SELECT * FROM jobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("job {}", id)))
    }

    pub async fn get_placement(&self, id: &str) -> StorageResult<Placement> {
        sqlx::query_as("SELECT * FROM placements WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("placement {}", id)))
    }

    pub async fn get_task(&self, id: &str) -> StorageResult<CrmTask> {
        sqlx::query_as("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("task {}", id)))
    }

    // ==================== Generic lifecycle ====================

    /// Read the lifecycle columns shared by every entity table.
    pub async fn get_record(&self, module: ModuleType, id: &str) -> StorageResult<EntityRecord> {
        let mut conn = self.pool.acquire().await?;
        get_record_on(&mut conn, module, id).await
    }

    /// Archive an active record: status flip plus `archived_at` stamp.
    /// Archiving a record that is already archived is a conflict.
    pub async fn archive(
        &self,
        module: ModuleType,
        id: &str,
        reason: &str,
    ) -> StorageResult<EntityRecord> {
        let mut tx = self.pool.begin().await?;
        archive_on(&mut tx, module, id, reason).await?;
        tx.commit().await?;

        self.get_record(module, id).await
    }

    // ==================== Polymorphic children ====================

    pub async fn add_note(
        &self,
        entity: &EntityRef,
        author: Option<&str>,
        body: &str,
    ) -> StorageResult<Note> {
        let mut conn = self.pool.acquire().await?;
        let id = insert_note_on(&mut conn, entity, author, body).await?;

        sqlx::query_as("SELECT * FROM notes WHERE id = ?")
            .bind(&id)
            .fetch_one(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)
    }

    pub async fn list_notes(&self, entity: &EntityRef) -> StorageResult<Vec<Note>> {
        sqlx::query_as(
            "SELECT * FROM notes WHERE entity_type = ? AND entity_id = ? ORDER BY created_at",
        )
        .bind(entity.module.as_str())
        .bind(&entity.id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    pub async fn add_history(
        &self,
        entity: &EntityRef,
        action: &str,
        detail: Option<&str>,
    ) -> StorageResult<HistoryEntry> {
        let id = new_id("hist");
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO history (id, entity_type, entity_id, action, detail, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(entity.module.as_str())
        .bind(&entity.id)
        .bind(action)
        .bind(detail)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query_as("SELECT * FROM history WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    pub async fn list_history(&self, entity: &EntityRef) -> StorageResult<Vec<HistoryEntry>> {
        sqlx::query_as(
            "SELECT * FROM history WHERE entity_type = ? AND entity_id = ? ORDER BY created_at",
        )
        .bind(entity.module.as_str())
        .bind(&entity.id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }

    pub async fn add_document(
        &self,
        entity: &EntityRef,
        input: DocumentCreateInput,
    ) -> StorageResult<Document> {
        let id = new_id("doc");
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO documents (
                id, entity_type, entity_id, file_name, content_type,
                storage_key, uploaded_by, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(entity.module.as_str())
        .bind(&entity.id)
        .bind(&input.file_name)
        .bind(&input.content_type)
        .bind(&input.storage_key)
        .bind(&input.uploaded_by)
        .bind(now)
        .execute(&self.pool)
        .await?;

        sqlx::query_as("SELECT * FROM documents WHERE id = ?")
            .bind(&id)
            .fetch_one(&self.pool)
            .await
            .map_err(StorageError::Sqlx)
    }

    pub async fn list_documents(&self, entity: &EntityRef) -> StorageResult<Vec<Document>> {
        sqlx::query_as(
            "SELECT * FROM documents WHERE entity_type = ? AND entity_id = ? ORDER BY created_at",
        )
        .bind(entity.module.as_str())
        .bind(&entity.id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)
    }
}

// ==================== Transaction-level operations ====================
//
// These run on a caller-owned connection so workflow packages can compose
// them into a single transaction with their own statements.

pub async fn get_record_on(
    conn: &mut SqliteConnection,
    module: ModuleType,
    id: &str,
) -> StorageResult<EntityRecord> {
    let query = format!(
        "SELECT id, record_number, display_name, status, archived_at, archive_reason FROM {} WHERE id = ?",
        module.table()
    );

    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("{} {}", module, id)))?;

    Ok(EntityRecord {
        id: row.try_get("id")?,
        module,
        record_number: row.try_get("record_number")?,
        display_name: row.try_get("display_name")?,
        status: row.try_get("status")?,
        archived_at: row.try_get("archived_at")?,
        archive_reason: row.try_get("archive_reason")?,
    })
}

/// Archive guarded on `status = 'Active'`; zero rows affected means the
/// record is missing or already archived and surfaces as an error rather
/// than silently succeeding.
pub async fn archive_on(
    conn: &mut SqliteConnection,
    module: ModuleType,
    id: &str,
    reason: &str,
) -> StorageResult<()> {
    let now = Utc::now();
    let query = format!(
        "UPDATE {} SET status = 'Archived', archived_at = ?, archive_reason = ?, updated_at = ? \
         WHERE id = ? AND status = 'Active'",
        module.table()
    );

    let result = sqlx::query(&query)
        .bind(now)
        .bind(reason)
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

    if result.rows_affected() == 0 {
        let exists: i64 = sqlx::query_scalar(&format!(
            "SELECT COUNT(*) FROM {} WHERE id = ?",
            module.table()
        ))
        .bind(id)
        .fetch_one(&mut *conn)
        .await?;

        if exists == 0 {
            return Err(StorageError::NotFound(format!("{} {}", module, id)));
        }
        return Err(StorageError::Conflict(format!(
            "{} {} is already archived",
            module, id
        )));
    }

    debug!("Archived {} {} (reason: {})", module, id, reason);
    Ok(())
}

pub async fn insert_note_on(
    conn: &mut SqliteConnection,
    entity: &EntityRef,
    author: Option<&str>,
    body: &str,
) -> StorageResult<String> {
    let id = new_id("note");
    let now = Utc::now();

    sqlx::query(
        r#"
        INSERT INTO notes (id, entity_type, entity_id, author, body, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(entity.module.as_str())
    .bind(&entity.id)
    .bind(author)
    .bind(body)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Delete every polymorphic child row (notes, history, documents) for one
/// entity. Cascading foreign keys cannot do this: the child tables are
/// shared across entity types and keyed by (entity_type, entity_id).
pub async fn delete_children_on(
    conn: &mut SqliteConnection,
    module: ModuleType,
    id: &str,
) -> StorageResult<()> {
    for table in ["notes", "history", "documents"] {
        sqlx::query(&format!(
            "DELETE FROM {} WHERE entity_type = ? AND entity_id = ?",
            table
        ))
        .bind(module.as_str())
        .bind(id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

/// Hard-delete one entity on the caller's transaction: children removed,
/// attached tasks and dependent placements cascaded, record numbers released
/// before each row delete. Returns how many record numbers were released.
pub async fn hard_delete_on(
    conn: &mut SqliteConnection,
    module: ModuleType,
    id: &str,
) -> StorageResult<usize> {
    let mut released = 0;

    delete_children_on(conn, module, id).await?;

    // Tasks attached to this entity go with it
    let attached_tasks: Vec<(String, Option<i64>)> =
        sqlx::query_as("SELECT id, record_number FROM tasks WHERE entity_type = ? AND entity_id = ?")
            .bind(module.as_str())
            .bind(id)
            .fetch_all(&mut *conn)
            .await?;

    for (task_id, number) in attached_tasks {
        delete_children_on(conn, ModuleType::Task, &task_id).await?;
        if let Some(number) = number {
            release(conn, ModuleType::Task, number).await?;
            released += 1;
        }
        sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(&task_id)
            .execute(&mut *conn)
            .await?;
    }

    // Placements referencing a deleted job or job seeker would dangle
    let placement_fk = match module {
        ModuleType::Job => Some("job_id"),
        ModuleType::JobSeeker => Some("job_seeker_id"),
        _ => None,
    };

    if let Some(fk) = placement_fk {
        let placements: Vec<(String, Option<i64>)> = sqlx::query_as(&format!(
            "SELECT id, record_number FROM placements WHERE {} = ?",
            fk
        ))
        .bind(id)
        .fetch_all(&mut *conn)
        .await?;

        for (placement_id, number) in placements {
            delete_children_on(conn, ModuleType::Placement, &placement_id).await?;
            if let Some(number) = number {
                release(conn, ModuleType::Placement, number).await?;
                released += 1;
            }
            sqlx::query("DELETE FROM placements WHERE id = ?")
                .bind(&placement_id)
                .execute(&mut *conn)
                .await?;
        }
    }

    // Release before the row delete; a crash in between leaves a row the
    // next sweep re-selects, and release is idempotent
    let number: Option<Option<i64>> = sqlx::query_scalar(&format!(
        "SELECT record_number FROM {} WHERE id = ?",
        module.table()
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(Some(number)) = number {
        release(conn, module, number).await?;
        released += 1;
    }

    sqlx::query(&format!("DELETE FROM {} WHERE id = ?", module.table()))
        .bind(id)
        .execute(&mut *conn)
        .await?;

    debug!("Hard-deleted {} {} ({} numbers released)", module, id, released);
    Ok(released)
}

/// Insert the bookkeeping task that records a pending hard deletion. The
/// target is referenced through the JSON payload, not (entity_type,
/// entity_id), so the task survives the target's deletion and can be marked
/// completed afterwards. Bookkeeping rows carry no display number.
pub async fn schedule_cleanup_on(
    conn: &mut SqliteConnection,
    entity: &EntityRef,
) -> StorageResult<String> {
    let id = new_id(ModuleType::Task.id_prefix());
    let now = Utc::now();
    let payload = serde_json::json!({
        "entity_type": entity.module.as_str(),
        "entity_id": entity.id,
    });

    sqlx::query(
        r#"
        INSERT INTO tasks (id, display_name, payload, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(CLEANUP_TASK_SUBJECT)
    .bind(payload.to_string())
    .bind(now)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(id)
}

/// Mark the scheduling tasks for `entity` completed, matched through the
/// entity reference embedded in their payload.
pub async fn complete_cleanup_tasks_on(
    conn: &mut SqliteConnection,
    entity: &EntityRef,
) -> StorageResult<u64> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        UPDATE tasks SET completed = 1, updated_at = ?
        WHERE completed = 0
          AND json_extract(payload, '$.entity_type') = ?
          AND json_extract(payload, '$.entity_id') = ?
        "#,
    )
    .bind(now)
    .bind(entity.module.as_str())
    .bind(&entity.id)
    .execute(&mut *conn)
    .await?;

    Ok(result.rows_affected())
}
