// ABOUTME: Delete-request approval workflow
// ABOUTME: Pending requests expire after a TTL and are re-issued a bounded number of times

pub mod storage;
pub mod types;

pub use storage::DeleteRequestStore;
pub use types::{
    DeleteActionType, DeleteRequest, DeleteRequestConfig, DeleteRequestCreateInput,
    DeleteRequestStatus, ExpiryOutcome, ExpirySweepReport,
};
