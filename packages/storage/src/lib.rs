// ABOUTME: SQLite persistence layer for Hireboard
// ABOUTME: Connection bootstrap, schema migrations, and the shared StorageError type

pub mod db;

use hireboard_core::ParseModuleError;

pub use db::Db;

/// Schema migrator shared by the runtime bootstrap and every package's tests.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Record not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("Unknown module type: {0}")]
    InvalidModule(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

impl From<ParseModuleError> for StorageError {
    fn from(err: ParseModuleError) -> Self {
        StorageError::InvalidModule(err.0)
    }
}

impl StorageError {
    /// True when the underlying database rejected a write on a unique
    /// constraint; callers map this to a user-visible conflict.
    pub fn is_unique_violation(&self) -> bool {
        match self {
            StorageError::Sqlx(sqlx::Error::Database(db_err)) => db_err.is_unique_violation(),
            _ => false,
        }
    }
}
