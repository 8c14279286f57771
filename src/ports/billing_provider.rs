//! Billing provider port for reading subscription details.
//!
//! Webhook payloads carry ids only; checkout reconciliation reads the
//! referenced subscription, payment method and invoice through this port.
//!
//! # Design
//!
//! - **Read-only**: the reconciler never mutates provider state
//! - **Injected**: one client instance is shared via `Arc<dyn BillingProvider>`
//! - **Not found is not an error**: lookups return `Ok(None)`

use crate::domain::billing::PaymentMethodSummary;
use crate::domain::foundation::{DomainError, ErrorCode};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Port for billing provider lookups.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    /// Get subscription by provider ID.
    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProviderSubscription>, BillingProviderError>;

    /// Get the display summary of a payment method.
    async fn retrieve_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<Option<PaymentMethodSummary>, BillingProviderError>;

    /// Get invoice by provider ID.
    async fn retrieve_invoice(
        &self,
        invoice_id: &str,
    ) -> Result<Option<ProviderInvoice>, BillingProviderError>;
}

/// Subscription in the billing system, flattened to the fields we use.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderSubscription {
    /// Provider's subscription ID.
    pub id: String,

    /// Provider's customer ID.
    pub customer_id: Option<String>,

    /// Raw provider status.
    pub status: Option<String>,

    /// Price of the first subscription item.
    pub price_id: Option<String>,

    /// Product of the first subscription item.
    pub product_id: Option<String>,

    pub default_payment_method: Option<String>,

    /// Current billing period end (Unix timestamp).
    pub current_period_end: Option<i64>,

    pub cancel_at_period_end: bool,
}

/// Invoice in the billing system.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInvoice {
    pub id: String,
    pub invoice_pdf: Option<String>,
}

/// Errors from billing provider operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingProviderError {
    /// Error code for categorization.
    pub code: BillingProviderErrorCode,

    /// Human-readable message.
    pub message: String,

    /// Provider's error code (if available).
    pub provider_code: Option<String>,

    /// Whether the operation can be retried.
    pub retryable: bool,
}

impl BillingProviderError {
    /// Create a new billing provider error.
    pub fn new(code: BillingProviderErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            provider_code: None,
            retryable: code.is_retryable(),
        }
    }

    /// Create with provider code.
    pub fn with_provider_code(mut self, code: impl Into<String>) -> Self {
        self.provider_code = Some(code.into());
        self
    }

    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        Self::new(BillingProviderErrorCode::NetworkError, message)
    }

    /// Create an authentication error.
    pub fn authentication(message: impl Into<String>) -> Self {
        Self::new(BillingProviderErrorCode::AuthenticationError, message)
    }

    /// Create a not found error.
    pub fn not_found(resource: &str) -> Self {
        Self::new(
            BillingProviderErrorCode::NotFound,
            format!("{} not found", resource),
        )
    }
}

impl std::fmt::Display for BillingProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for BillingProviderError {}

impl From<BillingProviderError> for DomainError {
    fn from(err: BillingProviderError) -> Self {
        let code = match err.code {
            BillingProviderErrorCode::NotFound => ErrorCode::RecordNotFound,
            _ => ErrorCode::ExternalServiceError,
        };

        DomainError::new(code, err.message)
    }
}

/// Billing provider error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingProviderErrorCode {
    /// Network connectivity issue or timeout.
    NetworkError,

    /// API authentication failed.
    AuthenticationError,

    /// Resource not found.
    NotFound,

    /// Rate limit exceeded.
    RateLimitExceeded,

    /// Response body did not match the expected shape.
    InvalidResponse,

    /// Provider API error.
    ProviderError,
}

impl BillingProviderErrorCode {
    /// Check if this error type is typically retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BillingProviderErrorCode::NetworkError
                | BillingProviderErrorCode::RateLimitExceeded
                | BillingProviderErrorCode::ProviderError
        )
    }
}

impl std::fmt::Display for BillingProviderErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BillingProviderErrorCode::NetworkError => "network_error",
            BillingProviderErrorCode::AuthenticationError => "authentication_error",
            BillingProviderErrorCode::NotFound => "not_found",
            BillingProviderErrorCode::RateLimitExceeded => "rate_limit_exceeded",
            BillingProviderErrorCode::InvalidResponse => "invalid_response",
            BillingProviderErrorCode::ProviderError => "provider_error",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn billing_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn BillingProvider) {}
    }

    #[test]
    fn billing_provider_error_retryable() {
        assert!(BillingProviderErrorCode::NetworkError.is_retryable());
        assert!(BillingProviderErrorCode::RateLimitExceeded.is_retryable());

        assert!(!BillingProviderErrorCode::AuthenticationError.is_retryable());
        assert!(!BillingProviderErrorCode::NotFound.is_retryable());
    }

    #[test]
    fn billing_provider_error_display() {
        let err = BillingProviderError::network("connection reset")
            .with_provider_code("api_connection_error");
        assert!(err.to_string().contains("network_error"));
        assert!(err.to_string().contains("connection reset"));
        assert!(err.retryable);
    }

    #[test]
    fn billing_provider_error_converts_to_domain_error() {
        let domain_err: DomainError = BillingProviderError::network("timeout").into();
        assert_eq!(domain_err.code, ErrorCode::ExternalServiceError);
        assert!(domain_err.message.contains("timeout"));
    }
}
