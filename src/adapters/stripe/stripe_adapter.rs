//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` port over the Stripe REST API.
//! Only retrieve endpoints are used; the reconciler never mutates
//! provider state.
//!
//! # Configuration
//!
//! ```ignore
//! let config = StripeConfig::new(api_key).with_timeout(Duration::from_secs(10));
//! let adapter = StripeBillingAdapter::new(config)?;
//! ```

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;

use crate::domain::billing::PaymentMethodSummary;
use crate::ports::{
    BillingProvider, BillingProviderError, BillingProviderErrorCode, ProviderInvoice,
    ProviderSubscription,
};

use super::api_types::{StripeErrorEnvelope, StripeInvoice, StripePaymentMethod, StripeSubscription};

/// Default Stripe API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.stripe.com";

/// Default client-side request timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Stripe API configuration.
#[derive(Clone)]
pub struct StripeConfig {
    /// Stripe secret API key (sk_live_... or sk_test_...).
    api_key: SecretString,

    /// Base URL for Stripe API (default: https://api.stripe.com).
    api_base_url: String,

    timeout: Duration,
}

impl StripeConfig {
    /// Create a new Stripe configuration.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: SecretString::new(api_key.into()),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    /// Set a custom API base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Stripe billing provider adapter.
///
/// One instance is built at startup and shared behind `Arc<dyn BillingProvider>`.
pub struct StripeBillingAdapter {
    config: StripeConfig,
    http_client: reqwest::Client,
}

impl StripeBillingAdapter {
    /// Create a new Stripe adapter with the given configuration.
    pub fn new(config: StripeConfig) -> Result<Self, BillingProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BillingProviderError::network(e.to_string()))?;

        Ok(Self {
            config,
            http_client,
        })
    }

    /// GET a Stripe object, mapping 404 to `None`.
    async fn retrieve<T: DeserializeOwned>(
        &self,
        resource: &str,
        id: &str,
    ) -> Result<Option<T>, BillingProviderError> {
        let url = format!("{}/v1/{}/{}", self.config.api_base_url, resource, id);

        let response = self
            .http_client
            .get(&url)
            .basic_auth(self.config.api_key.expose_secret(), Option::<&str>::None)
            .send()
            .await
            .map_err(|e| {
                tracing::warn!(resource, id, error = %e, "Stripe request failed");
                BillingProviderError::network(e.to_string())
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(resource, id, "Stripe object not found");
            return Ok(None);
        }

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(error_from_response(status, &error_text));
        }

        let object = response.json::<T>().await.map_err(|e| {
            BillingProviderError::new(
                BillingProviderErrorCode::InvalidResponse,
                format!("Failed to parse Stripe response: {}", e),
            )
        })?;

        Ok(Some(object))
    }
}

/// Maps a non-success Stripe response to a provider error.
fn error_from_response(status: reqwest::StatusCode, body: &str) -> BillingProviderError {
    let api_error = serde_json::from_str::<StripeErrorEnvelope>(body).ok().map(|e| e.error);
    let message = api_error
        .as_ref()
        .and_then(|e| e.message.clone())
        .unwrap_or_else(|| body.to_string());

    let code = match status {
        reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
            BillingProviderErrorCode::AuthenticationError
        }
        reqwest::StatusCode::TOO_MANY_REQUESTS => BillingProviderErrorCode::RateLimitExceeded,
        _ => BillingProviderErrorCode::ProviderError,
    };

    let error = BillingProviderError::new(code, format!("Stripe API error ({}): {}", status, message));
    match api_error.and_then(|e| e.code.or(e.error_type)) {
        Some(provider_code) => error.with_provider_code(provider_code),
        None => error,
    }
}

#[async_trait]
impl BillingProvider for StripeBillingAdapter {
    async fn retrieve_subscription(
        &self,
        subscription_id: &str,
    ) -> Result<Option<ProviderSubscription>, BillingProviderError> {
        let sub: Option<StripeSubscription> =
            self.retrieve("subscriptions", subscription_id).await?;
        Ok(sub.map(ProviderSubscription::from))
    }

    async fn retrieve_payment_method(
        &self,
        payment_method_id: &str,
    ) -> Result<Option<PaymentMethodSummary>, BillingProviderError> {
        let pm: Option<StripePaymentMethod> =
            self.retrieve("payment_methods", payment_method_id).await?;
        Ok(pm.map(PaymentMethodSummary::from))
    }

    async fn retrieve_invoice(
        &self,
        invoice_id: &str,
    ) -> Result<Option<ProviderInvoice>, BillingProviderError> {
        let invoice: Option<StripeInvoice> = self.retrieve("invoices", invoice_id).await?;
        Ok(invoice.map(ProviderInvoice::from))
    }
}
