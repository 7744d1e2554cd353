//! Notifier trait definition and shared error types.

use std::collections::HashMap;

use vigil_core::types::Recipient;

/// Errors that can occur during notification delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery failed for all {failed} recipients")]
    AllRecipientsFailed { failed: usize },
}

/// A rendered escalation ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    /// The rendered subject/title (event-type description).
    pub subject: String,
    /// The rendered body content.
    pub body: String,
    /// Audience resolved at fire time (superusers or members assigned to
    /// the failing location).
    pub recipients: Vec<Recipient>,
    /// Additional metadata (e.g., rule_id, location, window).
    pub metadata: HashMap<String, String>,
}

impl Notification {
    /// Convenience constructor without metadata.
    pub fn new(
        subject: impl Into<String>,
        body: impl Into<String>,
        recipients: Vec<Recipient>,
    ) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            recipients,
            metadata: HashMap::new(),
        }
    }
}

/// Trait for notification channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Test connectivity with a sample notification.
    async fn test(&self) -> Result<(), NotifyError> {
        let test_notification = Notification {
            subject: "[TEST] Compliance Escalation Test".to_string(),
            body: "This is a test escalation from the vigil compliance engine.".to_string(),
            recipients: Vec::new(),
            metadata: HashMap::from([("rule_id".to_string(), "test-rule".to_string())]),
        };
        self.send(&test_notification).await
    }

    /// Human-readable name for this channel (e.g., "webhook", "email").
    fn channel_name(&self) -> &str;
}

/// Result of dispatching a notification to a single channel.
#[derive(Debug)]
pub struct DispatchResult {
    pub channel: String,
    /// Location the escalation concerns (from metadata), if any.
    pub location: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
