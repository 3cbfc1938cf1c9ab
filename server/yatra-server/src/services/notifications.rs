//! Customer notifications
//!
//! Delivery goes through the `Notifier` trait. The shipped `LogNotifier`
//! records each message as a structured tracing event; no mail transport
//! is wired in.

use crate::error::ApiError;
use async_trait::async_trait;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationTemplate {
    BookingConfirmed,
    BillingGenerated,
    PaymentReceived,
}

impl NotificationTemplate {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationTemplate::BookingConfirmed => "booking_confirmed",
            NotificationTemplate::BillingGenerated => "billing_generated",
            NotificationTemplate::PaymentReceived => "payment_received",
        }
    }
}

impl fmt::Display for NotificationTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Notification {
    pub recipient: String,
    pub subject: String,
    pub template: NotificationTemplate,
    /// Template variables
    pub context: serde_json::Value,
}

impl Notification {
    #[must_use]
    pub fn new(
        recipient: impl Into<String>,
        template: NotificationTemplate,
        subject: impl Into<String>,
        context: serde_json::Value,
    ) -> Self {
        Self {
            recipient: recipient.into(),
            subject: subject.into(),
            template,
            context,
        }
    }
}

#[async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver a notification
    ///
    /// # Errors
    /// Transport failures.
    async fn send(&self, notification: &Notification) -> Result<(), ApiError>;
}

/// Notifier that writes every message to the log
#[derive(Debug, Clone)]
pub struct LogNotifier {
    email_enabled: bool,
    from_email: String,
}

impl LogNotifier {
    #[must_use]
    pub fn new(email_enabled: bool, from_email: String) -> Self {
        Self {
            email_enabled,
            from_email,
        }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), ApiError> {
        if !self.email_enabled {
            tracing::debug!(
                recipient = %notification.recipient,
                template = %notification.template,
                "Email delivery disabled; notification skipped"
            );
            return Ok(());
        }

        tracing::info!(
            from = %self.from_email,
            recipient = %notification.recipient,
            subject = %notification.subject,
            template = %notification.template,
            context = %notification.context,
            "Notification sent"
        );
        Ok(())
    }
}

/// Send without failing the calling request
pub async fn notify_quietly(notifier: &dyn Notifier, notification: Notification) {
    if let Err(e) = notifier.send(&notification).await {
        tracing::warn!(
            recipient = %notification.recipient,
            template = %notification.template,
            error = %e,
            "Notification delivery failed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct Recording(Mutex<Vec<NotificationTemplate>>);

    #[async_trait]
    impl Notifier for Recording {
        async fn send(&self, notification: &Notification) -> Result<(), ApiError> {
            if let Ok(mut sent) = self.0.lock() {
                sent.push(notification.template);
            }
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl Notifier for Failing {
        async fn send(&self, _notification: &Notification) -> Result<(), ApiError> {
            Err(ApiError::internal("smtp down"))
        }
    }

    fn sample() -> Notification {
        Notification::new(
            "asha@example.com",
            NotificationTemplate::BookingConfirmed,
            "Booking BK/2026-27/000001 confirmed",
            serde_json::json!({ "booking_number": "BK/2026-27/000001" }),
        )
    }

    #[tokio::test]
    async fn log_notifier_accepts_messages_enabled_or_not() {
        let enabled = LogNotifier::new(true, "noreply@yatrasathi.in".into());
        let disabled = LogNotifier::new(false, "noreply@yatrasathi.in".into());
        assert!(enabled.send(&sample()).await.is_ok());
        assert!(disabled.send(&sample()).await.is_ok());
    }

    #[tokio::test]
    async fn quiet_delivery_swallows_failures() {
        notify_quietly(&Failing, sample()).await;

        let recording = Arc::new(Recording::default());
        notify_quietly(recording.as_ref(), sample()).await;
        assert_eq!(
            recording.0.lock().unwrap().as_slice(),
            &[NotificationTemplate::BookingConfirmed]
        );
    }
}
