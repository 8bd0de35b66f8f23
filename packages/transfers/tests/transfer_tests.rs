// ABOUTME: Integration tests for the job seeker transfer workflow
// ABOUTME: Covers child migration, application merge ordering, and rollback atomicity

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use hireboard_core::{EntityRef, ModuleType, RecordStatus};
use hireboard_entities::{
    DocumentCreateInput, EntityStore, JobSeekerCreateInput, PlacementCreateInput, TaskCreateInput,
};
use hireboard_notify::{EmailMessage, Notifier, NotifyError};
use hireboard_storage::StorageError;
use hireboard_transfers::{TransferRequestCreateInput, TransferStatus, TransferStore};
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

#[derive(Default)]
struct RecordingNotifier {
    sent: Mutex<Vec<EmailMessage>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push(message.clone());
        Ok(())
    }
}

async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    hireboard_storage::MIGRATOR.run(&pool).await.unwrap();

    pool
}

fn test_store(pool: SqlitePool) -> TransferStore {
    TransferStore::new(
        pool,
        Arc::new(RecordingNotifier::default()),
        "reviewer@example.com".to_string(),
    )
}

async fn seed_seeker(store: &EntityStore, name: &str, applications: &[&str]) -> String {
    let custom_fields = if applications.is_empty() {
        None
    } else {
        Some(serde_json::json!({ "applications": applications }))
    };

    store
        .create_job_seeker(JobSeekerCreateInput {
            display_name: name.to_string(),
            email: None,
            custom_fields,
        })
        .await
        .unwrap()
        .id
}

fn transfer_input(source_id: &str, target_id: &str) -> TransferRequestCreateInput {
    TransferRequestCreateInput {
        source_id: source_id.to_string(),
        target_id: target_id.to_string(),
        requested_by: "ann@example.com".to_string(),
        reason: Some("duplicate profile".to_string()),
    }
}

#[tokio::test]
async fn test_self_transfer_is_rejected() {
    let pool = create_test_pool().await;
    let entities = EntityStore::new(pool.clone());
    let seeker = seed_seeker(&entities, "Jordan Diaz", &[]).await;
    let store = test_store(pool);

    let err = store
        .request(transfer_input(&seeker, &seeker))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidInput(_)));
}

#[tokio::test]
async fn test_only_one_pending_transfer_per_source() {
    let pool = create_test_pool().await;
    let entities = EntityStore::new(pool.clone());
    let source = seed_seeker(&entities, "Jordan Diaz", &[]).await;
    let target = seed_seeker(&entities, "J. Diaz", &[]).await;
    let store = test_store(pool);

    store.request(transfer_input(&source, &target)).await.unwrap();
    let err = store
        .request(transfer_input(&source, &target))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
async fn test_approve_moves_children_and_archives_source() {
    let pool = create_test_pool().await;
    let entities = EntityStore::new(pool.clone());
    let source = seed_seeker(&entities, "Jordan Diaz", &["job-old-1", "job-old-2"]).await;
    let target = seed_seeker(&entities, "J. Diaz", &["job-new-1"]).await;
    let source_ref = EntityRef::new(ModuleType::JobSeeker, source.clone());
    let target_ref = EntityRef::new(ModuleType::JobSeeker, target.clone());

    entities
        .add_note(&source_ref, Some("recruiter"), "Called about warehouse role")
        .await
        .unwrap();
    entities
        .add_document(
            &source_ref,
            DocumentCreateInput {
                file_name: "resume.pdf".to_string(),
                content_type: None,
                storage_key: "docs/1".to_string(),
                uploaded_by: None,
            },
        )
        .await
        .unwrap();
    entities
        .create_task(TaskCreateInput {
            entity: Some(source_ref.clone()),
            display_name: "Follow up".to_string(),
            due_at: None,
            payload: None,
        })
        .await
        .unwrap();
    entities
        .create_placement(PlacementCreateInput {
            job_id: None,
            job_seeker_id: Some(source.clone()),
            display_name: "Warehouse contract".to_string(),
        })
        .await
        .unwrap();

    let store = test_store(pool.clone());
    let request = store.request(transfer_input(&source, &target)).await.unwrap();
    let outcome = store.approve(&request.id, "boss@example.com").await.unwrap();

    assert_eq!(outcome.request.status, TransferStatus::Approved);
    assert_eq!(outcome.moved.notes, 1);
    assert_eq!(outcome.moved.documents, 1);
    assert_eq!(outcome.moved.tasks, 1);
    assert_eq!(outcome.moved.placements, 1);
    assert_eq!(outcome.moved.applications, 2);

    // Children now hang off the target (plus its received audit note)
    assert!(entities.list_documents(&target_ref).await.unwrap().len() == 1);
    let target_notes = entities.list_notes(&target_ref).await.unwrap();
    assert!(target_notes
        .iter()
        .any(|note| note.body == "Called about warehouse role"));
    assert!(target_notes.iter().any(|note| note.body.starts_with("Received")));

    // Applications merged target-first
    let merged = entities.get_job_seeker(&target).await.unwrap();
    let fields: serde_json::Value =
        serde_json::from_str(merged.custom_fields.as_deref().unwrap()).unwrap();
    assert_eq!(
        fields["applications"],
        serde_json::json!(["job-new-1", "job-old-1", "job-old-2"])
    );

    // Source archived with reason Transfer and scheduled for cleanup
    let source_record = entities.get_job_seeker(&source).await.unwrap();
    assert_eq!(source_record.status, RecordStatus::Archived);
    assert_eq!(source_record.archive_reason.as_deref(), Some("Transfer"));

    let scheduled: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM tasks WHERE json_extract(payload, '$.entity_id') = ?",
    )
    .bind(&source)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(scheduled, 1);
}

#[tokio::test]
async fn test_failed_transfer_moves_and_archives_nothing() {
    let pool = create_test_pool().await;
    let entities = EntityStore::new(pool.clone());
    let source = seed_seeker(&entities, "Jordan Diaz", &[]).await;
    let target = seed_seeker(&entities, "J. Diaz", &[]).await;
    let source_ref = EntityRef::new(ModuleType::JobSeeker, source.clone());

    entities
        .add_note(&source_ref, None, "source note")
        .await
        .unwrap();

    let store = test_store(pool.clone());
    let request = store.request(transfer_input(&source, &target)).await.unwrap();

    // Target vanishes between request and approval
    sqlx::query("DELETE FROM job_seekers WHERE id = ?")
        .bind(&target)
        .execute(&pool)
        .await
        .unwrap();

    let err = store
        .approve(&request.id, "boss@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));

    // Everything rolled back: note still on the source, source still active,
    // request still pending
    assert_eq!(entities.list_notes(&source_ref).await.unwrap().len(), 1);
    let source_record = entities.get_job_seeker(&source).await.unwrap();
    assert_eq!(source_record.status, RecordStatus::Active);
    let request = store.get(&request.id).await.unwrap();
    assert_eq!(request.status, TransferStatus::Pending);
}

#[tokio::test]
async fn test_approve_twice_is_a_conflict() {
    let pool = create_test_pool().await;
    let entities = EntityStore::new(pool.clone());
    let source = seed_seeker(&entities, "Jordan Diaz", &[]).await;
    let target = seed_seeker(&entities, "J. Diaz", &[]).await;
    let store = test_store(pool);

    let request = store.request(transfer_input(&source, &target)).await.unwrap();
    store.approve(&request.id, "boss@example.com").await.unwrap();

    let err = store
        .approve(&request.id, "boss@example.com")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Conflict(_)));
}

#[tokio::test]
async fn test_deny_requires_reason() {
    let pool = create_test_pool().await;
    let entities = EntityStore::new(pool.clone());
    let source = seed_seeker(&entities, "Jordan Diaz", &[]).await;
    let target = seed_seeker(&entities, "J. Diaz", &[]).await;
    let store = test_store(pool);

    let request = store.request(transfer_input(&source, &target)).await.unwrap();

    let err = store
        .deny(&request.id, "boss@example.com", "")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::InvalidInput(_)));

    let denied = store
        .deny(&request.id, "boss@example.com", "records are distinct people")
        .await
        .unwrap();
    assert_eq!(denied.status, TransferStatus::Denied);
    assert_eq!(
        denied.denial_reason.as_deref(),
        Some("records are distinct people")
    );
}
