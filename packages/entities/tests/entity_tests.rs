// ABOUTME: Integration tests for entity creation, archiving, and hard deletion
// ABOUTME: Verifies record number allocation, child cascades, and scheduling tasks

use hireboard_core::{EntityRef, ModuleType, RecordStatus};
use hireboard_entities::{
    complete_cleanup_tasks_on, hard_delete_on, schedule_cleanup_on, DocumentCreateInput,
    EntityStore, JobCreateInput, JobSeekerCreateInput, OrganizationCreateInput,
    PlacementCreateInput, TaskCreateInput,
};
use hireboard_records::pooled_numbers;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Helper to create an in-memory database with the full schema
async fn create_test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();

    hireboard_storage::MIGRATOR.run(&pool).await.unwrap();

    pool
}

#[tokio::test]
async fn test_create_allocates_record_number_in_same_transaction() {
    let pool = create_test_pool().await;
    let store = EntityStore::new(pool);

    let org = store
        .create_organization(OrganizationCreateInput {
            display_name: "Acme Staffing".to_string(),
            website: Some("https://acme.example".to_string()),
            custom_fields: None,
        })
        .await
        .unwrap();

    assert_eq!(org.record_number, Some(1));
    assert_eq!(org.status, RecordStatus::Active);
    assert!(org.id.starts_with("org-"));
    assert!(org.archived_at.is_none());
}

#[tokio::test]
async fn test_record_numbers_are_per_module() {
    let pool = create_test_pool().await;
    let store = EntityStore::new(pool);

    let org = store
        .create_organization(OrganizationCreateInput {
            display_name: "Acme".to_string(),
            website: None,
            custom_fields: None,
        })
        .await
        .unwrap();
    let job = store
        .create_job(JobCreateInput {
            organization_id: Some(org.id.clone()),
            display_name: "Forklift operator".to_string(),
        })
        .await
        .unwrap();
    let second_job = store
        .create_job(JobCreateInput {
            organization_id: Some(org.id.clone()),
            display_name: "Night shift lead".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(org.record_number, Some(1));
    assert_eq!(job.record_number, Some(1));
    assert_eq!(second_job.record_number, Some(2));
}

#[tokio::test]
async fn test_archive_stamps_timestamp_and_reason() {
    let pool = create_test_pool().await;
    let store = EntityStore::new(pool);

    let org = store
        .create_organization(OrganizationCreateInput {
            display_name: "Acme".to_string(),
            website: None,
            custom_fields: None,
        })
        .await
        .unwrap();

    let record = store
        .archive(ModuleType::Organization, &org.id, "Deletion")
        .await
        .unwrap();

    assert_eq!(record.status, RecordStatus::Archived);
    assert!(record.archived_at.is_some());
    assert_eq!(record.archive_reason.as_deref(), Some("Deletion"));
    // The record number stays reserved while archived
    assert_eq!(record.record_number, Some(1));
}

#[tokio::test]
async fn test_archive_twice_is_a_conflict() {
    let pool = create_test_pool().await;
    let store = EntityStore::new(pool);

    let org = store
        .create_organization(OrganizationCreateInput {
            display_name: "Acme".to_string(),
            website: None,
            custom_fields: None,
        })
        .await
        .unwrap();

    store
        .archive(ModuleType::Organization, &org.id, "Deletion")
        .await
        .unwrap();

    let err = store
        .archive(ModuleType::Organization, &org.id, "Deletion")
        .await
        .unwrap_err();
    assert!(matches!(err, hireboard_storage::StorageError::Conflict(_)));
}

#[tokio::test]
async fn test_archive_missing_record_is_not_found() {
    let pool = create_test_pool().await;
    let store = EntityStore::new(pool);

    let err = store
        .archive(ModuleType::Job, "job-missing", "Deletion")
        .await
        .unwrap_err();
    assert!(matches!(err, hireboard_storage::StorageError::NotFound(_)));
}

#[tokio::test]
async fn test_notes_and_documents_attach_to_entities() {
    let pool = create_test_pool().await;
    let store = EntityStore::new(pool);

    let seeker = store
        .create_job_seeker(JobSeekerCreateInput {
            display_name: "Jordan Diaz".to_string(),
            email: Some("jordan@example.com".to_string()),
            custom_fields: None,
        })
        .await
        .unwrap();
    let entity = EntityRef::new(ModuleType::JobSeeker, seeker.id.clone());

    store
        .add_note(&entity, Some("recruiter@example.com"), "Left voicemail")
        .await
        .unwrap();
    store
        .add_document(
            &entity,
            DocumentCreateInput {
                file_name: "resume.pdf".to_string(),
                content_type: Some("application/pdf".to_string()),
                storage_key: "docs/resume-1".to_string(),
                uploaded_by: Some("recruiter@example.com".to_string()),
            },
        )
        .await
        .unwrap();

    assert_eq!(store.list_notes(&entity).await.unwrap().len(), 1);
    assert_eq!(store.list_documents(&entity).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_hard_delete_cascades_children_and_releases_numbers() {
    let pool = create_test_pool().await;
    let store = EntityStore::new(pool.clone());

    let seeker = store
        .create_job_seeker(JobSeekerCreateInput {
            display_name: "Jordan Diaz".to_string(),
            email: None,
            custom_fields: None,
        })
        .await
        .unwrap();
    let entity = EntityRef::new(ModuleType::JobSeeker, seeker.id.clone());

    store.add_note(&entity, None, "note body").await.unwrap();
    store
        .add_history(&entity, "status_change", Some("Interviewing"))
        .await
        .unwrap();
    let task = store
        .create_task(TaskCreateInput {
            entity: Some(entity.clone()),
            display_name: "Follow up call".to_string(),
            due_at: None,
            payload: None,
        })
        .await
        .unwrap();
    let placement = store
        .create_placement(PlacementCreateInput {
            job_id: None,
            job_seeker_id: Some(seeker.id.clone()),
            display_name: "Warehouse contract".to_string(),
        })
        .await
        .unwrap();

    let mut tx = pool.begin().await.unwrap();
    let released = hard_delete_on(&mut tx, ModuleType::JobSeeker, &seeker.id)
        .await
        .unwrap();
    tx.commit().await.unwrap();

    // Seeker, attached task, dependent placement
    assert_eq!(released, 3);
    assert!(store.get_job_seeker(&seeker.id).await.is_err());
    assert!(store.get_task(&task.id).await.is_err());
    assert!(store.get_placement(&placement.id).await.is_err());
    assert!(store.list_notes(&entity).await.unwrap().is_empty());
    assert!(store.list_history(&entity).await.unwrap().is_empty());

    let mut conn = pool.acquire().await.unwrap();
    assert_eq!(
        pooled_numbers(&mut conn, ModuleType::JobSeeker).await.unwrap(),
        vec![seeker.record_number.unwrap()]
    );
    assert_eq!(
        pooled_numbers(&mut conn, ModuleType::Placement).await.unwrap(),
        vec![placement.record_number.unwrap()]
    );
    assert_eq!(
        pooled_numbers(&mut conn, ModuleType::Task).await.unwrap(),
        vec![task.record_number.unwrap()]
    );
}

#[tokio::test]
async fn test_cleanup_scheduling_tasks_survive_target_deletion() {
    let pool = create_test_pool().await;
    let store = EntityStore::new(pool.clone());

    let org = store
        .create_organization(OrganizationCreateInput {
            display_name: "Acme".to_string(),
            website: None,
            custom_fields: None,
        })
        .await
        .unwrap();
    let entity = EntityRef::new(ModuleType::Organization, org.id.clone());

    let mut tx = pool.begin().await.unwrap();
    let task_id = schedule_cleanup_on(&mut tx, &entity).await.unwrap();
    hard_delete_on(&mut tx, ModuleType::Organization, &org.id)
        .await
        .unwrap();
    let completed = complete_cleanup_tasks_on(&mut tx, &entity).await.unwrap();
    tx.commit().await.unwrap();

    assert_eq!(completed, 1);
    let task = store.get_task(&task_id).await.unwrap();
    assert!(task.completed);
}
