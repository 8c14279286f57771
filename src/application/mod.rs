//! Application layer - Commands and Handlers.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! Webhook deliveries enter through `HandleBillingWebhookHandler`, which
//! verifies and dispatches to `ReconcileSubscriptionHandler`.

pub mod handlers;

pub use handlers::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler, HandleBillingWebhookResult,
    ReconcileSubscriptionCommand, ReconcileSubscriptionHandler, ReconcileSubscriptionResult,
};
