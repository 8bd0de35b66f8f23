// ABOUTME: Core types and module registry for Hireboard
// ABOUTME: Foundational package shared by every storage and workflow package

pub mod constants;
pub mod types;

// Re-export main types
pub use types::{EntityRef, ModuleType, ParseModuleError, RecordStatus, ALL_MODULES};

// Re-export constants
pub use constants::{
    ARCHIVE_REASON_DELETION, ARCHIVE_REASON_TRANSFER, CLEANUP_TASK_SUBJECT,
    DEFAULT_DELETE_REQUEST_MAX_RETRIES, DEFAULT_DELETE_REQUEST_TTL_HOURS,
    DEFAULT_GRACE_PERIOD_DAYS,
};
