// ABOUTME: Email notification collaborator for lifecycle workflows
// ABOUTME: Trait seam plus logging and HTTP mail-gateway implementations

pub mod messages;
pub mod notifier;

pub use notifier::{
    send_best_effort, EmailMessage, LoggingNotifier, Notifier, NotifyError, WebhookNotifier,
};
