// ABOUTME: Subject and body builders for the lifecycle notification emails
// ABOUTME: Callers pass display strings only; no storage types leak in here

use crate::EmailMessage;

/// Sent to the reviewer when a new deletion or transfer request is created.
pub fn approval_request(
    to: &str,
    record_label: &str,
    requested_by: &str,
    reason: &str,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Approval needed: delete {}", record_label),
        html_body: format!(
            "<p>{} requested permanent deletion of <strong>{}</strong>.</p>\
             <p>Reason: {}</p>\
             <p>Please approve or deny this request.</p>",
            requested_by, record_label, reason
        ),
    }
}

/// Sent to the reviewer when an expired request is re-issued.
pub fn approval_request_reissued(
    to: &str,
    record_label: &str,
    requested_by: &str,
    reason: &str,
    retry_count: i64,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Reminder: approval still needed for {}", record_label),
        html_body: format!(
            "<p>The deletion request for <strong>{}</strong> from {} expired \
             without a decision and has been re-issued (attempt {}).</p>\
             <p>Reason: {}</p>",
            record_label, requested_by, retry_count, reason
        ),
    }
}

/// Sent to the requester when their request is approved.
pub fn request_approved(to: &str, record_label: &str, reviewed_by: &str) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Deletion request approved: {}", record_label),
        html_body: format!(
            "<p>Your deletion request for <strong>{}</strong> was approved by {}.</p>\
             <p>The record has been archived and will be permanently removed \
             after the retention period.</p>",
            record_label, reviewed_by
        ),
    }
}

/// Sent to the requester when their request is denied.
pub fn request_denied(
    to: &str,
    record_label: &str,
    reviewed_by: &str,
    denial_reason: &str,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Deletion request denied: {}", record_label),
        html_body: format!(
            "<p>Your deletion request for <strong>{}</strong> was denied by {}.</p>\
             <p>Reason: {}</p>",
            record_label, reviewed_by, denial_reason
        ),
    }
}

/// Sent to the reviewer when a transfer request is created.
pub fn transfer_approval_request(
    to: &str,
    source_label: &str,
    target_label: &str,
    requested_by: &str,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Approval needed: transfer {}", source_label),
        html_body: format!(
            "<p>{} requested a transfer of all records from <strong>{}</strong> \
             to <strong>{}</strong>.</p>\
             <p>The source record will be archived once the transfer completes.</p>",
            requested_by, source_label, target_label
        ),
    }
}

/// Sent to the requester when their transfer is approved and completed.
pub fn transfer_approved(
    to: &str,
    source_name: &str,
    target_name: &str,
    reviewed_by: &str,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Transfer completed: {}", source_name),
        html_body: format!(
            "<p>{} approved the transfer from <strong>{}</strong> to \
             <strong>{}</strong>. The source record has been archived.</p>",
            reviewed_by, source_name, target_name
        ),
    }
}

/// Sent to the requester when their transfer is denied.
pub fn transfer_denied(
    to: &str,
    source_label: &str,
    reviewed_by: &str,
    denial_reason: &str,
) -> EmailMessage {
    EmailMessage {
        to: to.to_string(),
        subject: format!("Transfer request denied: {}", source_label),
        html_body: format!(
            "<p>Your transfer request for <strong>{}</strong> was denied by {}.</p>\
             <p>Reason: {}</p>",
            source_label, reviewed_by, denial_reason
        ),
    }
}
