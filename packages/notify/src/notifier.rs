// ABOUTME: Notifier trait and its transports
// ABOUTME: Delivery is best-effort; callers invoke it only after their transaction commits

use async_trait::async_trait;
use serde::Serialize;
use tracing::{info, warn};
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mail gateway rejected message with status {0}")]
    Gateway(u16),
    #[error("invalid gateway url: {0}")]
    InvalidUrl(#[from] url::ParseError),
}

/// An email to deliver. Body is pre-rendered HTML.
#[derive(Debug, Clone, Serialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

/// Injected delivery collaborator. Implementations must attempt delivery;
/// they are never allowed to fail a surrounding transaction, which is why
/// workflow code reaches them only through [`send_best_effort`] after commit.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError>;
}

/// Logs the message instead of delivering it. Default for local development
/// and tests.
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        info!(
            "Email to {}: {} ({} bytes)",
            message.to,
            message.subject,
            message.html_body.len()
        );
        Ok(())
    }
}

/// Posts messages as JSON to an HTTP mail gateway.
pub struct WebhookNotifier {
    client: reqwest::Client,
    endpoint: Url,
    bearer_token: Option<String>,
}

impl WebhookNotifier {
    pub fn new(endpoint: &str, bearer_token: Option<String>) -> Result<Self, NotifyError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: Url::parse(endpoint)?,
            bearer_token,
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, message: &EmailMessage) -> Result<(), NotifyError> {
        let mut request = self.client.post(self.endpoint.clone()).json(message);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        if !response.status().is_success() {
            return Err(NotifyError::Gateway(response.status().as_u16()));
        }

        Ok(())
    }
}

/// Attempt delivery and swallow any failure with a warning. Notification
/// outcomes must never propagate to the caller.
pub async fn send_best_effort(notifier: &dyn Notifier, message: EmailMessage) {
    if let Err(err) = notifier.send(&message).await {
        warn!(
            "Failed to deliver notification to {} ({}): {}",
            message.to, message.subject, err
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingNotifier;

    #[async_trait]
    impl Notifier for FailingNotifier {
        async fn send(&self, _message: &EmailMessage) -> Result<(), NotifyError> {
            Err(NotifyError::Gateway(503))
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: "reviewer@example.com".to_string(),
            subject: "subject".to_string(),
            html_body: "<p>body</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn best_effort_swallows_delivery_failures() {
        send_best_effort(&FailingNotifier, message()).await;
    }

    #[tokio::test]
    async fn logging_notifier_always_succeeds() {
        LoggingNotifier.send(&message()).await.unwrap();
    }
}
