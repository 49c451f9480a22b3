use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

/// An outbound notification to a beneficiary.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Notification {
    pub recipient_id: Uuid,
    pub title: String,
    pub body: String,
    pub category: NotificationCategory,
    pub severity: NotificationSeverity,
    pub action_url: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum NotificationCategory {
    RequestDecision,
    SystemMessage,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum NotificationSeverity {
    Info,
    Success,
    Warning,
}

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("Delivery failed: {0}")]
    Delivery(String),
}

/// Trait for outbound notification delivery. Delivery is fire-and-forget
/// from the caller's perspective: failures are logged, never propagated
/// into the approval flow.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError>;
}

/// Default notifier that writes notifications to the log. A real delivery
/// channel (push, email) plugs in behind the same trait.
#[derive(Debug, Default, Clone)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: Notification) -> Result<(), NotificationError> {
        info!(
            recipient_id = %notification.recipient_id,
            title = %notification.title,
            severity = ?notification.severity,
            "Notification dispatched"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn log_notifier_always_succeeds() {
        let notifier = LogNotifier;
        let result = notifier
            .send(Notification {
                recipient_id: Uuid::new_v4(),
                title: "Request approved".to_string(),
                body: "Your request was approved".to_string(),
                category: NotificationCategory::RequestDecision,
                severity: NotificationSeverity::Success,
                action_url: None,
                metadata: None,
                created_at: Utc::now(),
            })
            .await;
        assert!(result.is_ok());
    }
}
