//! Billing module - Stripe subscription reconciliation.
//!
//! # Module Organization
//!
//! - `stripe_event` / `webhook_verifier` - Authenticated event envelope
//! - `billing_event` - Typed event variants validated at the boundary
//! - `subscription_record` / `plan` / `plan_group` - Persisted state and catalog
//! - `reconciler` - Pure transition rules for each handled event

mod amount;
mod billing_event;
mod plan;
mod plan_group;
mod reconcile_errors;
mod reconciler;
mod stripe_event;
mod subscription_record;
mod subscription_status;
mod webhook_verifier;

pub use amount::from_minor_units;
pub use billing_event::{
    BillingEvent, CheckoutCompleted, InvoiceFailed, SubscriptionChange,
    CHECKOUT_SESSION_COMPLETED, CUSTOMER_SUBSCRIPTION_DELETED, CUSTOMER_SUBSCRIPTION_UPDATED,
    INVOICE_PAYMENT_FAILED,
};
pub use plan::PlanRecord;
pub use plan_group::{PlanGroup, ALL_GROUPS, SUBSCRIPTION_GROUPS};
pub use reconcile_errors::{AuthenticityError, ReconcileError};
pub use reconciler::{
    CheckoutEnrichment, ReconcilePlan, ReconcilePolicy, SubscriptionReconciler, Transition,
};
pub use stripe_event::{StripeEvent, StripeEventData};
pub use subscription_record::{PaymentMethodSummary, UserSubscriptionRecord};
pub use subscription_status::{is_scheduled_cancel, SubscriptionStatus};
pub use webhook_verifier::{sign_payload, SignatureHeader, StripeWebhookVerifier, DEFAULT_TOLERANCE_SECS};

#[cfg(test)]
pub use stripe_event::StripeEventBuilder;
