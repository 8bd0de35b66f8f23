// ABOUTME: The cleanup sweep invoked by an external scheduler
// ABOUTME: One transaction per invocation; organizations cascade before the flat passes

use chrono::{Duration, Utc};
use hireboard_core::{EntityRef, ModuleType, DEFAULT_GRACE_PERIOD_DAYS};
use hireboard_entities::{complete_cleanup_tasks_on, hard_delete_on};
use hireboard_storage::StorageResult;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct CleanupConfig {
    /// Days an archived record is retained before hard deletion.
    pub grace_period_days: i64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            grace_period_days: DEFAULT_GRACE_PERIOD_DAYS,
        }
    }
}

impl CleanupConfig {
    pub fn from_env() -> Self {
        let grace_period_days = std::env::var("HIREBOARD_GRACE_PERIOD_DAYS")
            .ok()
            .and_then(|value| value.parse().ok())
            .unwrap_or(DEFAULT_GRACE_PERIOD_DAYS);

        Self { grace_period_days }
    }
}

/// What one sweep invocation removed. Consumed for logging only.
#[derive(Debug, Default)]
pub struct CleanupReport {
    pub deleted: Vec<(ModuleType, String)>,
    pub released_numbers: usize,
}

/// Hard-delete every entity archived at least the grace period ago.
///
/// The whole invocation runs in one transaction: any error rolls everything
/// back, and the next scheduled run re-selects the same rows because the
/// `archived_at` predicate is stable. Selection is driven purely off archive
/// age; scheduling tasks are completed as bookkeeping but never filter it.
pub async fn run_archive_cleanup(
    pool: &SqlitePool,
    config: &CleanupConfig,
) -> StorageResult<CleanupReport> {
    let cutoff = Utc::now() - Duration::days(config.grace_period_days);
    let mut report = CleanupReport::default();

    let mut tx = pool.begin().await?;

    // Organizations cascade to their jobs, hiring managers, and leads, so
    // they go first; the flat passes below then see none of those children.
    let org_ids: Vec<String> = sqlx::query_scalar(
        "SELECT id FROM organizations WHERE status = 'Archived' AND archived_at <= ?",
    )
    .bind(cutoff)
    .fetch_all(&mut *tx)
    .await?;

    for org_id in org_ids {
        cleanup_organization(&mut tx, &org_id, &mut report).await?;
    }

    // Flat passes over the remaining modules
    for module in [
        ModuleType::HiringManager,
        ModuleType::JobSeeker,
        ModuleType::Job,
        ModuleType::Lead,
        ModuleType::Placement,
        ModuleType::Task,
    ] {
        let ids: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT id FROM {} WHERE status = 'Archived' AND archived_at <= ?",
            module.table()
        ))
        .bind(cutoff)
        .fetch_all(&mut *tx)
        .await?;

        for id in ids {
            report.released_numbers += hard_delete_on(&mut tx, module, &id).await?;
            complete_cleanup_tasks_on(&mut tx, &EntityRef::new(module, id.clone())).await?;
            report.deleted.push((module, id));
        }
    }

    tx.commit().await?;

    info!(
        "Archive cleanup removed {} entities, released {} record numbers",
        report.deleted.len(),
        report.released_numbers
    );
    Ok(report)
}

async fn cleanup_organization(
    tx: &mut Transaction<'_, Sqlite>,
    org_id: &str,
    report: &mut CleanupReport,
) -> StorageResult<()> {
    debug!("Cleaning up archived organization {}", org_id);

    for (module, fk) in [
        (ModuleType::Job, "organization_id"),
        (ModuleType::HiringManager, "organization_id"),
        (ModuleType::Lead, "organization_id"),
    ] {
        let child_ids: Vec<String> = sqlx::query_scalar(&format!(
            "SELECT id FROM {} WHERE {} = ?",
            module.table(),
            fk
        ))
        .bind(org_id)
        .fetch_all(&mut **tx)
        .await?;

        for child_id in child_ids {
            report.released_numbers += hard_delete_on(tx, module, &child_id).await?;
            complete_cleanup_tasks_on(tx, &EntityRef::new(module, child_id.clone())).await?;
            report.deleted.push((module, child_id));
        }
    }

    report.released_numbers += hard_delete_on(tx, ModuleType::Organization, org_id).await?;
    complete_cleanup_tasks_on(
        tx,
        &EntityRef::new(ModuleType::Organization, org_id.to_string()),
    )
    .await?;
    report.deleted.push((ModuleType::Organization, org_id.to_string()));

    Ok(())
}
