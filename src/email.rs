/// Outbound reset notification
///
/// The reset workflow hands a finished bearer token to a `ResetNotifier`
/// after the credential is persisted. Delivery is observable and retriable
/// on its own; a failure here never rolls back the credential.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::AppError;

#[async_trait]
pub trait ResetNotifier: Send + Sync {
    async fn send_reset(&self, recipient: &str, reset_token: &str) -> Result<(), AppError>;
}

/// HTTP mail relay client.
///
/// Posts `{to, subject, message}` to the relay's `/send-email` endpoint with
/// an `x-api-key` header.
#[derive(Clone)]
pub struct EmailClient {
    http_client: reqwest::Client,
    base_url: String,
    api_key: String,
    reset_link_base: String,
}

#[derive(Serialize)]
struct SendEmailRequest {
    to: String,
    subject: String,
    message: String,
}

impl EmailClient {
    pub fn new(
        base_url: String,
        api_key: String,
        reset_link_base: String,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            http_client,
            base_url,
            api_key,
            reset_link_base,
        }
    }
}

#[async_trait]
impl ResetNotifier for EmailClient {
    async fn send_reset(&self, recipient: &str, reset_token: &str) -> Result<(), AppError> {
        let url = format!("{}/send-email", self.base_url);
        let reset_link = format!("{}/reset?token={}", self.reset_link_base, reset_token);
        let request = SendEmailRequest {
            to: recipient.to_string(),
            subject: "Your password reset request".to_string(),
            message: format!(
                "<p>A password reset was requested for this address.</p>\
                 <p><a href=\"{}\">Reset your password</a></p>\
                 <p>The link is valid for 31 days and can be used once.</p>",
                reset_link
            ),
        };

        self.http_client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Email(format!("failed to reach mail relay: {}", e)))?
            .error_for_status()
            .map_err(|e| AppError::Email(format!("mail relay rejected request: {}", e)))?;

        Ok(())
    }
}

/// Notifier that records deliveries instead of sending them.
///
/// Used by tests (and useful for running without a relay): the recorded
/// token is how integration tests get hold of the reset bearer token.
#[derive(Default)]
pub struct RecordingNotifier {
    sent: std::sync::Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// (recipient, token) pairs in delivery order.
    pub fn deliveries(&self) -> Vec<(String, String)> {
        self.sent.lock().expect("notifier lock poisoned").clone()
    }
}

#[async_trait]
impl ResetNotifier for RecordingNotifier {
    async fn send_reset(&self, recipient: &str, reset_token: &str) -> Result<(), AppError> {
        self.sent
            .lock()
            .expect("notifier lock poisoned")
            .push((recipient.to_string(), reset_token.to_string()));
        Ok(())
    }
}
