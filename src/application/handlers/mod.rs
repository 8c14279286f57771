//! Application handlers.
//!
//! Command handlers that orchestrate domain operations across ports.

pub mod billing;

pub use billing::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler, HandleBillingWebhookResult,
    ReconcileSubscriptionCommand, ReconcileSubscriptionHandler, ReconcileSubscriptionResult,
};
