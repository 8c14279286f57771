//! Typed billing events.
//!
//! A verified [`StripeEvent`] envelope is classified by its declared type and
//! its object validated into one variant. Required fields missing from the
//! object fail here, before any state is read or written.

use serde::Deserialize;

use super::reconcile_errors::ReconcileError;
use super::stripe_event::StripeEvent;
use super::subscription_status::SubscriptionStatus;
use crate::domain::foundation::Timestamp;

pub const CHECKOUT_SESSION_COMPLETED: &str = "checkout.session.completed";
pub const CUSTOMER_SUBSCRIPTION_DELETED: &str = "customer.subscription.deleted";
pub const CUSTOMER_SUBSCRIPTION_UPDATED: &str = "customer.subscription.updated";
pub const INVOICE_PAYMENT_FAILED: &str = "invoice.payment_failed";

/// One verified billing event.
#[derive(Debug, Clone, PartialEq)]
pub enum BillingEvent {
    CheckoutSessionCompleted(CheckoutCompleted),
    SubscriptionDeleted(SubscriptionChange),
    SubscriptionUpdated(SubscriptionChange),
    InvoicePaymentFailed(InvoiceFailed),
    /// Any type this service does not reconcile; acknowledged and ignored.
    Unhandled { event_type: String },
}

/// Completed checkout session.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutCompleted {
    pub session_id: String,
    /// Absent for sessions created without a customer; the email locates the user.
    pub customer_id: Option<String>,
    pub subscription_id: Option<String>,
    pub customer_email: Option<String>,
    pub invoice_id: Option<String>,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub payment_status: Option<String>,
}

/// Subscription object carried by `customer.subscription.*` events.
#[derive(Debug, Clone, PartialEq)]
pub struct SubscriptionChange {
    pub subscription_id: String,
    pub customer_id: String,
    /// `None` when the provider omitted the status.
    pub status: Option<SubscriptionStatus>,
    pub cancel_at_period_end: bool,
    pub cancel_at: Option<Timestamp>,
    pub canceled_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,
}

impl SubscriptionChange {
    /// A deletion still reporting active with cancel-at-period-end is the
    /// expected terminal notice of an already scheduled cancellation.
    pub fn is_pending_scheduled_cancel(&self) -> bool {
        matches!(self.status, Some(SubscriptionStatus::Active)) && self.cancel_at_period_end
    }
}

/// Failed invoice payment.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceFailed {
    pub invoice_id: String,
    pub customer_id: String,
    pub subscription_id: Option<String>,
    pub attempt_count: Option<u32>,
}

// ════════════════════════════════════════════════════════════════════════════════
// Wire shapes
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Deserialize)]
struct CheckoutSessionObject {
    id: String,
    #[serde(default)]
    customer: Option<String>,
    #[serde(default)]
    subscription: Option<String>,
    #[serde(default)]
    customer_details: Option<CustomerDetails>,
    #[serde(default)]
    customer_email: Option<String>,
    #[serde(default)]
    invoice: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CustomerDetails {
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SubscriptionObject {
    id: String,
    customer: String,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    cancel_at_period_end: Option<bool>,
    #[serde(default)]
    cancel_at: Option<i64>,
    #[serde(default)]
    canceled_at: Option<i64>,
    #[serde(default)]
    ended_at: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct InvoiceObject {
    id: String,
    customer: String,
    #[serde(default)]
    subscription: Option<String>,
    #[serde(default)]
    attempt_count: Option<u32>,
}

impl BillingEvent {
    /// Classifies and validates a verified envelope.
    pub fn from_stripe(event: &StripeEvent) -> Result<Self, ReconcileError> {
        let invalid = |e: serde_json::Error| ReconcileError::invalid_payload(&event.event_type, e.to_string());

        match event.event_type.as_str() {
            CHECKOUT_SESSION_COMPLETED => {
                let session: CheckoutSessionObject = event.deserialize_object().map_err(invalid)?;
                let customer_email = session
                    .customer_details
                    .and_then(|d| d.email)
                    .or(session.customer_email)
                    .filter(|e| !e.trim().is_empty());
                let customer_id = session.customer.filter(|c| !c.trim().is_empty());
                if customer_id.is_none() && customer_email.is_none() {
                    return Err(ReconcileError::invalid_payload(
                        &event.event_type,
                        "neither `customer` nor a customer email",
                    ));
                }

                Ok(BillingEvent::CheckoutSessionCompleted(CheckoutCompleted {
                    session_id: session.id,
                    customer_id,
                    subscription_id: session.subscription,
                    customer_email,
                    invoice_id: session.invoice,
                    amount_total: session.amount_total,
                    currency: session.currency,
                    payment_status: session.payment_status,
                }))
            }
            CUSTOMER_SUBSCRIPTION_DELETED | CUSTOMER_SUBSCRIPTION_UPDATED => {
                let sub: SubscriptionObject = event.deserialize_object().map_err(invalid)?;
                let change = SubscriptionChange {
                    subscription_id: sub.id,
                    customer_id: non_empty(sub.customer, &event.event_type, "customer")?,
                    status: sub.status.as_deref().map(SubscriptionStatus::from_provider),
                    cancel_at_period_end: sub.cancel_at_period_end.unwrap_or(false),
                    cancel_at: Timestamp::from_optional_unix(sub.cancel_at),
                    canceled_at: Timestamp::from_optional_unix(sub.canceled_at),
                    ended_at: Timestamp::from_optional_unix(sub.ended_at),
                };

                if event.event_type == CUSTOMER_SUBSCRIPTION_DELETED {
                    Ok(BillingEvent::SubscriptionDeleted(change))
                } else {
                    Ok(BillingEvent::SubscriptionUpdated(change))
                }
            }
            INVOICE_PAYMENT_FAILED => {
                let invoice: InvoiceObject = event.deserialize_object().map_err(invalid)?;
                Ok(BillingEvent::InvoicePaymentFailed(InvoiceFailed {
                    invoice_id: invoice.id,
                    customer_id: non_empty(invoice.customer, &event.event_type, "customer")?,
                    subscription_id: invoice.subscription,
                    attempt_count: invoice.attempt_count,
                }))
            }
            other => Ok(BillingEvent::Unhandled {
                event_type: other.to_string(),
            }),
        }
    }

    pub fn event_type(&self) -> &str {
        match self {
            BillingEvent::CheckoutSessionCompleted(_) => CHECKOUT_SESSION_COMPLETED,
            BillingEvent::SubscriptionDeleted(_) => CUSTOMER_SUBSCRIPTION_DELETED,
            BillingEvent::SubscriptionUpdated(_) => CUSTOMER_SUBSCRIPTION_UPDATED,
            BillingEvent::InvoicePaymentFailed(_) => INVOICE_PAYMENT_FAILED,
            BillingEvent::Unhandled { event_type } => event_type,
        }
    }

    /// Customer the event refers to, if it is a handled type that names one.
    pub fn customer_id(&self) -> Option<&str> {
        match self {
            BillingEvent::CheckoutSessionCompleted(c) => c.customer_id.as_deref(),
            BillingEvent::SubscriptionDeleted(s) | BillingEvent::SubscriptionUpdated(s) => {
                Some(&s.customer_id)
            }
            BillingEvent::InvoicePaymentFailed(i) => Some(&i.customer_id),
            BillingEvent::Unhandled { .. } => None,
        }
    }

    /// Key serializing work for one user: the customer id, or the checkout
    /// email when the session carries no customer.
    pub fn serialization_key(&self) -> Option<String> {
        if let Some(customer_id) = self.customer_id() {
            return Some(customer_id.to_string());
        }
        match self {
            BillingEvent::CheckoutSessionCompleted(c) => c
                .customer_email
                .as_deref()
                .map(|email| format!("email:{}", email.trim().to_lowercase())),
            _ => None,
        }
    }
}

fn non_empty(value: String, event_type: &str, field: &str) -> Result<String, ReconcileError> {
    if value.trim().is_empty() {
        return Err(ReconcileError::invalid_payload(
            event_type,
            format!("empty field `{}`", field),
        ));
    }
    Ok(value)
}
