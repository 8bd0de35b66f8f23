// ABOUTME: Database connection management and schema initialization
// ABOUTME: Provides the shared SQLite pool used by all storage layers

use std::path::PathBuf;
use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::{StorageError, MIGRATOR};

/// Shared database handle.
#[derive(Clone)]
pub struct Db {
    pub pool: SqlitePool,
}

impl Db {
    /// Connect with the default on-disk database (`~/.hireboard/hireboard.db`).
    pub async fn connect() -> Result<Self, StorageError> {
        Self::connect_with_path(None).await
    }

    /// Connect with an optional custom database path, applying pragmas and
    /// running pending migrations.
    pub async fn connect_with_path(
        database_path: Option<PathBuf>,
    ) -> Result<Self, StorageError> {
        let database_path = database_path.unwrap_or_else(default_database_path);

        // Ensure parent directory exists
        if let Some(parent) = database_path.parent() {
            std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
        }

        debug!("Connecting to database: {}", database_path.display());

        let options = SqliteConnectOptions::new()
            .filename(&database_path)
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(10)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await
            .map_err(StorageError::Sqlx)?;

        configure(&pool).await?;

        info!("Database connection established");

        MIGRATOR.run(&pool).await.map_err(StorageError::Migration)?;

        debug!("Database migrations completed");

        Ok(Self { pool })
    }

    /// In-memory database with the full schema, for tests and tooling.
    ///
    /// Capped at one connection: every pooled connection to `:memory:` would
    /// otherwise open its own empty database.
    pub async fn connect_in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(StorageError::Sqlx)?;

        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(StorageError::Sqlx)?;

        sqlx::query("PRAGMA foreign_keys = ON")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;

        MIGRATOR.run(&pool).await.map_err(StorageError::Migration)?;

        Ok(Self { pool })
    }
}

fn default_database_path() -> PathBuf {
    // HOME first so tests can redirect the location
    let home = std::env::var("HOME").map(PathBuf::from).unwrap_or_default();
    home.join(".hireboard").join("hireboard.db")
}

async fn configure(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(pool)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(pool)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(pool)
        .await
        .map_err(StorageError::Sqlx)?;

    Ok(())
}
