//! Redis-backed alert publisher.
//!
//! Publishes each alert as a JSON message on a pub/sub channel. Subscribers
//! (chat relays, pagers) fan it out; nothing is stored.

use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use serde::Serialize;

use crate::domain::foundation::{DomainError, ErrorCode, Timestamp};
use crate::ports::AlertPublisher;

/// Alert payload as published on the channel.
#[derive(Debug, Serialize)]
struct AlertMessage<'a> {
    subject: &'a str,
    message: &'a str,
    source: &'static str,
    published_at: Timestamp,
}

/// Redis PUBLISH implementation of the AlertPublisher port.
#[derive(Clone)]
pub struct RedisAlertPublisher {
    conn: MultiplexedConnection,
    channel: String,
}

impl RedisAlertPublisher {
    pub fn new(conn: MultiplexedConnection, channel: impl Into<String>) -> Self {
        Self {
            conn,
            channel: channel.into(),
        }
    }
}

fn encode_alert(subject: &str, message: &str, at: Timestamp) -> Result<String, DomainError> {
    serde_json::to_string(&AlertMessage {
        subject,
        message,
        source: "billing-reconciler",
        published_at: at,
    })
    .map_err(|e| DomainError::new(ErrorCode::InternalError, format!("Failed to encode alert: {}", e)))
}

#[async_trait]
impl AlertPublisher for RedisAlertPublisher {
    async fn publish(&self, subject: &str, message: &str) -> Result<(), DomainError> {
        let payload = encode_alert(subject, message, Timestamp::now())?;

        let mut conn = self.conn.clone();
        let receivers: i64 = conn
            .publish(&self.channel, payload)
            .await
            .map_err(|e: redis::RedisError| {
                DomainError::new(
                    ErrorCode::NotificationError,
                    format!("Failed to publish alert: {}", e),
                )
            })?;

        tracing::debug!(channel = %self.channel, subject, receivers, "Alert published");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alert_is_encoded_as_json_with_subject() {
        let at = Timestamp::from_unix_secs(1_704_067_200).unwrap();
        let payload = encode_alert("Stripe Webhook Success", "processed evt_1", at).unwrap();
        let value: serde_json::Value = serde_json::from_str(&payload).unwrap();

        assert_eq!(value["subject"], "Stripe Webhook Success");
        assert_eq!(value["message"], "processed evt_1");
        assert_eq!(value["source"], "billing-reconciler");
        assert_eq!(value["published_at"], "2024-01-01T00:00:00Z");
    }

    // Publishing requires a running Redis instance; covered by the
    // recording publisher in handler and integration tests.
}
