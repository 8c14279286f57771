//! Billing handlers.
//!
//! ## Commands
//! - Handling a raw billing webhook delivery
//! - Reconciling one typed billing event against a user record
//!
//! Supporting services: plan resolution, identity group sync, per-customer
//! locks and notifications.

mod group_sync;
mod handle_billing_webhook;
mod notifications;
mod plan_resolver;
mod reconcile_subscription;
mod user_locks;

pub use group_sync::{GroupSyncReport, GroupSynchronizer};
pub use handle_billing_webhook::{
    HandleBillingWebhookCommand, HandleBillingWebhookHandler, HandleBillingWebhookResult,
};
pub use notifications::{AlertSubjects, ConfirmationDetails, NotificationSettings, Notifier};
pub use plan_resolver::PlanResolver;
pub use reconcile_subscription::{
    ReconcileSubscriptionCommand, ReconcileSubscriptionHandler, ReconcileSubscriptionResult,
};
pub use user_locks::UserLocks;
