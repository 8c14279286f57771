//! Error taxonomy for webhook reconciliation.
//!
//! The caller-visible contract is binary: 200 when an event was fully
//! reconciled (or intentionally ignored), 400 otherwise so Stripe redelivers.

use http::StatusCode;
use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};

/// Reasons an inbound payload is not accepted as a genuine Stripe event.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthenticityError {
    #[error("Missing Stripe-Signature header")]
    MissingHeader,

    #[error("Malformed Stripe-Signature header: {0}")]
    MalformedHeader(String),

    #[error("Signature mismatch")]
    SignatureMismatch,

    #[error("Signed timestamp older than tolerance")]
    TimestampOutOfRange,

    #[error("Signed timestamp in the future")]
    TimestampInFuture,

    #[error("Payload is not a Stripe event: {0}")]
    UnparseablePayload(String),
}

/// Errors raised while reconciling a verified event.
#[derive(Debug, Error)]
pub enum ReconcileError {
    #[error("Webhook authenticity check failed: {0}")]
    Authenticity(#[from] AuthenticityError),

    /// Price id has no plan record. Never surfaced: the resolver falls back
    /// to the unsubscribed group and only logs this.
    #[error("No plan matches price '{price_id}'")]
    UnresolvedPlan { price_id: String },

    #[error("No user record for {lookup}")]
    RecordNotFound { lookup: String },

    #[error("{event_type} payload invalid: {reason}")]
    InvalidPayload { event_type: String, reason: String },

    #[error("{service} call failed: {message}")]
    ExternalService {
        service: &'static str,
        message: String,
    },
}

impl ReconcileError {
    pub fn invalid_payload(event_type: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPayload {
            event_type: event_type.into(),
            reason: reason.into(),
        }
    }

    pub fn external(service: &'static str, err: impl std::fmt::Display) -> Self {
        Self::ExternalService {
            service,
            message: err.to_string(),
        }
    }

    /// Whether a later redelivery of the same event might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ReconcileError::ExternalService { .. } | ReconcileError::RecordNotFound { .. }
        )
    }

    /// Every failure answers 400 so the provider retries or flags the event.
    pub fn status_code(&self) -> StatusCode {
        StatusCode::BAD_REQUEST
    }

    /// Failures that reject the payload itself rather than its processing.
    pub fn is_authenticity_failure(&self) -> bool {
        matches!(self, ReconcileError::Authenticity(_))
    }
}

impl From<DomainError> for ReconcileError {
    fn from(err: DomainError) -> Self {
        match err.code {
            ErrorCode::RecordNotFound => ReconcileError::RecordNotFound {
                lookup: err
                    .details
                    .get("user_id")
                    .map(|id| format!("user {}", id))
                    .unwrap_or(err.message),
            },
            ErrorCode::DatabaseError | ErrorCode::CacheError => {
                ReconcileError::external("record store", err)
            }
            ErrorCode::IdentityServiceError => ReconcileError::external("identity service", err),
            ErrorCode::NotificationError => ReconcileError::external("notification topic", err),
            _ => ReconcileError::external("internal", err),
        }
    }
}
