/// Days an archived record is retained before the cleanup sweep hard-deletes it
pub const DEFAULT_GRACE_PERIOD_DAYS: i64 = 7;

/// Hours a pending delete request stays open before the expiry sweep replaces it
pub const DEFAULT_DELETE_REQUEST_TTL_HOURS: i64 = 12;

/// Re-issuance cap for expired delete requests; past this the chain terminates
pub const DEFAULT_DELETE_REQUEST_MAX_RETRIES: i64 = 10;

/// Archive reason stamped by an approved delete request
pub const ARCHIVE_REASON_DELETION: &str = "Deletion";

/// Archive reason stamped on the source record of an approved transfer
pub const ARCHIVE_REASON_TRANSFER: &str = "Transfer";

/// Subject of the bookkeeping task inserted when a record is scheduled for hard deletion
pub const CLEANUP_TASK_SUBJECT: &str = "Scheduled deletion";
