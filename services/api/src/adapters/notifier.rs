//! services/api/src/adapters/notifier.rs
//!
//! Adapters for the `NotificationService` port. Connection request messages are
//! either written to the log (local development) or posted to a webhook that
//! owns the real mail delivery.

use async_trait::async_trait;
use serde::Serialize;
use skill_swap_core::ports::NotificationService;
use tracing::{error, info, warn};
use uuid::Uuid;

//=========================================================================================
// Message Rendering
//=========================================================================================

/// A rendered connection request notification.
#[derive(Debug, Clone, Serialize)]
pub struct ConnectionRequestMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    pub accept_url: String,
    pub reject_url: String,
    pub request_id: Uuid,
}

impl ConnectionRequestMessage {
    pub fn render(
        app_base_url: &str,
        to_email: &str,
        from_name: &str,
        to_name: &str,
        request_id: Uuid,
    ) -> Self {
        let base = app_base_url.trim_end_matches('/');
        let accept_url = format!("{}/accept-request/{}", base, request_id);
        let reject_url = format!("{}/reject-request/{}", base, request_id);
        let body = format!(
            "Hello {to_name},\n\n\
             {from_name} would like to connect with you for skill exchange!\n\
             They think you could help each other learn and grow together.\n\n\
             Accept: {accept_url}\n\
             Decline: {reject_url}\n"
        );
        Self {
            to: to_email.to_string(),
            subject: format!("{} wants to connect with you on Skill Swap!", from_name),
            body,
            accept_url,
            reject_url,
            request_id,
        }
    }
}

//=========================================================================================
// Log Notifier
//=========================================================================================

/// Writes notifications to the log instead of delivering them. Always succeeds.
#[derive(Clone)]
pub struct LogNotifier {
    app_base_url: String,
}

impl LogNotifier {
    pub fn new(app_base_url: impl Into<String>) -> Self {
        Self {
            app_base_url: app_base_url.into(),
        }
    }
}

#[async_trait]
impl NotificationService for LogNotifier {
    async fn notify_connection_request(
        &self,
        to_email: &str,
        from_name: &str,
        to_name: &str,
        request_id: Uuid,
    ) -> bool {
        let message = ConnectionRequestMessage::render(
            &self.app_base_url,
            to_email,
            from_name,
            to_name,
            request_id,
        );
        info!(
            to = %message.to,
            subject = %message.subject,
            accept_url = %message.accept_url,
            reject_url = %message.reject_url,
            "Connection request notification (not delivered, no webhook configured)"
        );
        true
    }
}

//=========================================================================================
// Webhook Notifier
//=========================================================================================

/// Posts each notification as JSON to a webhook.
#[derive(Clone)]
pub struct WebhookNotifier {
    client: reqwest::Client,
    webhook_url: String,
    app_base_url: String,
}

impl WebhookNotifier {
    pub fn new(
        client: reqwest::Client,
        webhook_url: impl Into<String>,
        app_base_url: impl Into<String>,
    ) -> Self {
        Self {
            client,
            webhook_url: webhook_url.into(),
            app_base_url: app_base_url.into(),
        }
    }
}

#[async_trait]
impl NotificationService for WebhookNotifier {
    async fn notify_connection_request(
        &self,
        to_email: &str,
        from_name: &str,
        to_name: &str,
        request_id: Uuid,
    ) -> bool {
        let message = ConnectionRequestMessage::render(
            &self.app_base_url,
            to_email,
            from_name,
            to_name,
            request_id,
        );
        match self.client.post(&self.webhook_url).json(&message).send().await {
            Ok(response) if response.status().is_success() => {
                info!(%request_id, "Connection request notification delivered");
                true
            }
            Ok(response) => {
                warn!(
                    %request_id,
                    status = %response.status(),
                    "Notification webhook rejected the message"
                );
                false
            }
            Err(e) => {
                error!(%request_id, "Failed to reach notification webhook: {}", e);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_builds_accept_and_reject_links() {
        let id = Uuid::new_v4();
        let message = ConnectionRequestMessage::render(
            "http://localhost:3000/",
            "bob@example.com",
            "Alice",
            "Bob",
            id,
        );
        assert_eq!(message.to, "bob@example.com");
        assert_eq!(message.subject, "Alice wants to connect with you on Skill Swap!");
        assert_eq!(
            message.accept_url,
            format!("http://localhost:3000/accept-request/{}", id)
        );
        assert_eq!(
            message.reject_url,
            format!("http://localhost:3000/reject-request/{}", id)
        );
        assert!(message.body.starts_with("Hello Bob,"));
    }

    #[tokio::test]
    async fn test_log_notifier_always_succeeds() {
        let notifier = LogNotifier::new("http://localhost:3000");
        assert!(
            notifier
                .notify_connection_request("bob@example.com", "Alice", "Bob", Uuid::new_v4())
                .await
        );
    }

    #[tokio::test]
    async fn test_unreachable_webhook_reports_failure() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(2))
            .build()
            .unwrap();
        let notifier = WebhookNotifier::new(
            client,
            "http://127.0.0.1:9/notify",
            "http://localhost:3000",
        );
        assert!(
            !notifier
                .notify_connection_request("bob@example.com", "Alice", "Bob", Uuid::new_v4())
                .await
        );
    }
}
