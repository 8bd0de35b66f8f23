// ABOUTME: Job seeker transfer workflow
// ABOUTME: Approval-gated atomic migration of child records, then source archival

pub mod storage;
pub mod types;

pub use storage::TransferStore;
pub use types::{TransferOutcome, TransferRequest, TransferRequestCreateInput, TransferStatus, TransferSummary};
