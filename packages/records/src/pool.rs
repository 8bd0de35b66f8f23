// ABOUTME: Allocate/release primitives over record_number_pool and module_sequences
// ABOUTME: Both run on the caller's open transaction; they never begin their own

use hireboard_core::ModuleType;
use hireboard_storage::{StorageError, StorageResult};
use sqlx::SqliteConnection;
use tracing::debug;

/// Allocate a record number for `module` on the caller's open transaction.
///
/// Claims the smallest pooled number in a single `DELETE … RETURNING`
/// statement, so two concurrent allocators can never receive the same value;
/// when the pool is empty the module sequence is advanced instead. The first
/// number a module ever issues is 1.
pub async fn allocate(conn: &mut SqliteConnection, module: ModuleType) -> StorageResult<i64> {
    let reused: Option<i64> = sqlx::query_scalar(
        r#"
        DELETE FROM record_number_pool
        WHERE module_type = ?
          AND number = (
              SELECT MIN(number) FROM record_number_pool WHERE module_type = ?
          )
        RETURNING number
        "#,
    )
    .bind(module)
    .bind(module)
    .fetch_optional(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    if let Some(number) = reused {
        debug!("Reusing record number {} for module {}", number, module);
        return Ok(number);
    }

    let next: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO module_sequences (module_type, value)
        VALUES (?, 1)
        ON CONFLICT (module_type) DO UPDATE SET value = value + 1
        RETURNING value
        "#,
    )
    .bind(module)
    .fetch_one(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    debug!("Issued new record number {} for module {}", next, module);
    Ok(next)
}

/// Return `number` to the pool for `module` on the caller's open transaction.
///
/// Idempotent: re-running a partially failed cleanup must not fail or
/// duplicate a pool entry, so a number already present is left untouched.
pub async fn release(
    conn: &mut SqliteConnection,
    module: ModuleType,
    number: i64,
) -> StorageResult<()> {
    sqlx::query(
        r#"
        INSERT INTO record_number_pool (module_type, number)
        VALUES (?, ?)
        ON CONFLICT (module_type, number) DO NOTHING
        "#,
    )
    .bind(module)
    .bind(number)
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    debug!("Released record number {} for module {}", number, module);
    Ok(())
}

/// Numbers currently available for reuse, smallest first.
pub async fn pooled_numbers(
    conn: &mut SqliteConnection,
    module: ModuleType,
) -> StorageResult<Vec<i64>> {
    let numbers = sqlx::query_scalar(
        "SELECT number FROM record_number_pool WHERE module_type = ? ORDER BY number",
    )
    .bind(module)
    .fetch_all(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    Ok(numbers)
}

/// Current sequence value for `module`; 0 when the module has never issued a
/// number from the sequence.
pub async fn sequence_value(
    conn: &mut SqliteConnection,
    module: ModuleType,
) -> StorageResult<i64> {
    let value: Option<i64> =
        sqlx::query_scalar("SELECT value FROM module_sequences WHERE module_type = ?")
            .bind(module)
            .fetch_optional(&mut *conn)
            .await
            .map_err(StorageError::Sqlx)?;

    Ok(value.unwrap_or(0))
}
