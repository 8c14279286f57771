//! Response bodies for the webhook endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::billing::HandleBillingWebhookResult;

/// Acknowledgement returned with 200.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub message: String,
    pub event_id: String,
    pub event_type: String,
    /// `reconciled` or `ignored`.
    pub outcome: String,
}

impl From<HandleBillingWebhookResult> for WebhookAck {
    fn from(result: HandleBillingWebhookResult) -> Self {
        let (event_id, event_type, outcome) = match result {
            HandleBillingWebhookResult::Reconciled {
                event_id,
                event_type,
                ..
            } => (event_id, event_type, "reconciled"),
            HandleBillingWebhookResult::Ignored {
                event_id,
                event_type,
            } => (event_id, event_type, "ignored"),
        };
        Self {
            message: "Webhook received".to_string(),
            event_id,
            event_type,
            outcome: outcome.to_string(),
        }
    }
}

/// Error body returned with 400.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error code for programmatic handling.
    pub error_code: String,
    /// Human-readable error message.
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error_code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_code: error_code.into(),
            message: message.into(),
        }
    }
}

/// Liveness body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
