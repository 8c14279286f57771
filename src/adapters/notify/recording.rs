//! Recording notification adapters for tests and local runs.
//!
//! Capture every alert and email in memory. Failure can be switched on to
//! exercise the fire-and-forget paths.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{AlertPublisher, EmailSender, TemplatedEmail};

/// A captured alert.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedAlert {
    pub subject: String,
    pub message: String,
}

#[derive(Default)]
struct AlertState {
    alerts: Vec<RecordedAlert>,
    failing: bool,
}

/// In-memory AlertPublisher that records every publish.
#[derive(Default, Clone)]
pub struct RecordingAlertPublisher {
    inner: Arc<Mutex<AlertState>>,
}

impl RecordingAlertPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    /// A publisher whose every publish fails (after recording the attempt).
    pub fn failing() -> Self {
        let publisher = Self::new();
        publisher.state().failing = true;
        publisher
    }

    pub fn alerts(&self) -> Vec<RecordedAlert> {
        self.state().alerts.clone()
    }

    pub fn subjects(&self) -> Vec<String> {
        self.state().alerts.iter().map(|a| a.subject.clone()).collect()
    }

    fn state(&self) -> MutexGuard<'_, AlertState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl AlertPublisher for RecordingAlertPublisher {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), DomainError> {
        let mut state = self.state();
        state.alerts.push(RecordedAlert {
            subject: subject.to_string(),
            message: message.to_string(),
        });

        if state.failing {
            return Err(DomainError::new(ErrorCode::NotificationError, "topic unavailable"));
        }
        Ok(())
    }
}

#[derive(Default)]
struct EmailState {
    sent: Vec<TemplatedEmail>,
    failing: bool,
}

/// In-memory EmailSender that records every email.
#[derive(Default, Clone)]
pub struct RecordingEmailSender {
    inner: Arc<Mutex<EmailState>>,
}

impl RecordingEmailSender {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let sender = Self::new();
        sender.state().failing = true;
        sender
    }

    pub fn sent(&self) -> Vec<TemplatedEmail> {
        self.state().sent.clone()
    }

    fn state(&self) -> MutexGuard<'_, EmailState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl EmailSender for RecordingEmailSender {
    async fn send_templated(&self, email: &TemplatedEmail) -> Result<(), DomainError> {
        let mut state = self.state();
        state.sent.push(email.clone());

        if state.failing {
            return Err(DomainError::new(ErrorCode::NotificationError, "mail service unavailable"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_alerts_in_order() {
        let publisher = RecordingAlertPublisher::new();

        publisher.publish("first", "a").await.unwrap();
        publisher.publish("second", "b").await.unwrap();

        assert_eq!(publisher.subjects(), vec!["first", "second"]);
    }

    #[tokio::test]
    async fn failing_publisher_still_records_attempt() {
        let publisher = RecordingAlertPublisher::failing();

        assert!(publisher.publish("subject", "msg").await.is_err());
        assert_eq!(publisher.alerts().len(), 1);
    }

    #[tokio::test]
    async fn records_sent_email() {
        let sender = RecordingEmailSender::new();
        let email = TemplatedEmail::new("ada@example.com", "subscription_confirmation");

        sender.send_templated(&email).await.unwrap();

        assert_eq!(sender.sent(), vec![email]);
    }
}
