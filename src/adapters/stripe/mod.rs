//! Stripe billing provider adapter.
//!
//! Implements the `BillingProvider` port over the Stripe REST API:
//! - Subscription retrieval (price, product, default payment method)
//! - Payment method summary for display
//! - Invoice PDF link
//!
//! Webhook signature verification lives in the domain
//! (`StripeWebhookVerifier`) since it needs no I/O.
//!
//! # Security
//!
//! - The secret API key is held in `secrecy::SecretString`
//! - Requests carry a client-side timeout

mod api_types;
mod mock_billing_provider;
mod stripe_adapter;

pub use api_types::{
    Expandable, StripeInvoice, StripePaymentMethod, StripePrice, StripeSubscription,
    StripeSubscriptionItem, StripeSubscriptionItems,
};
pub use mock_billing_provider::{MethodCall, MockBillingProvider};
pub use stripe_adapter::{StripeBillingAdapter, StripeConfig, DEFAULT_API_BASE_URL};
