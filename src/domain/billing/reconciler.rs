//! Subscription state reconciler.
//!
//! Pure transition function: given the current record and a typed event it
//! computes the next record and the access group to sync to. Every field is
//! set to an absolute value so re-applying an event converges to the same
//! record. Side effects are executed by the application layer.
//!
//! ```text
//! unsubscribed ──checkout──▶ active ──updated(cape)──▶ active+scheduled_cancel
//!      ▲                       │  ╲                             │
//!      │                  failed    updated/deleted         deleted
//!      │                       ▼       ▼                        ▼
//!      └──────────────── past_due   canceled ◀──────────────────┘
//! ```

use rust_decimal::Decimal;

use super::amount::from_minor_units;
use super::billing_event::{CheckoutCompleted, SubscriptionChange};
use super::plan::PlanRecord;
use super::plan_group::PlanGroup;
use super::subscription_record::{PaymentMethodSummary, UserSubscriptionRecord};
use super::subscription_status::SubscriptionStatus;

/// Tunables for the rules that are a business decision rather than a fact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcilePolicy {
    /// Keep the paid plan when `customer.subscription.updated` reports a
    /// healthy subscription (active, no cancel-at-period-end). Off keeps the
    /// historical downgrade-pending-confirmation behavior.
    pub preserve_plan_on_healthy_update: bool,
}

/// Data gathered from the provider and plan catalog for a checkout.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CheckoutEnrichment {
    pub product_id: Option<String>,
    pub price_id: Option<String>,
    pub payment_id: Option<String>,
    pub plan: Option<PlanRecord>,
    pub invoice_pdf_link: Option<String>,
    pub payment_method_summary: Option<PaymentMethodSummary>,
}

/// What a transition did, for logs and alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Activated(PlanGroup),
    MarkedPastDue,
    Terminated,
    /// Deletion notice for a cancellation that is already scheduled.
    ScheduledCancelNoOp,
    ScheduledCancel,
    Downgraded,
    PlanPreserved,
}

/// Outcome of one reconciliation step.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconcilePlan {
    /// Next record state; `None` means nothing is written.
    pub next: Option<UserSubscriptionRecord>,
    /// Group to converge the identity system to; `None` means leave it alone.
    pub group_sync: Option<PlanGroup>,
    pub transition: Transition,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.next.is_none() && self.group_sync.is_none()
    }
}

/// The subscription state machine.
#[derive(Debug, Clone, Copy, Default)]
pub struct SubscriptionReconciler {
    policy: ReconcilePolicy,
}

impl SubscriptionReconciler {
    pub fn new(policy: ReconcilePolicy) -> Self {
        Self { policy }
    }

    /// The only transition that grants a paid group.
    pub fn checkout_completed(
        &self,
        current: &UserSubscriptionRecord,
        event: &CheckoutCompleted,
        enrichment: CheckoutEnrichment,
    ) -> ReconcilePlan {
        let group = enrichment
            .plan
            .as_ref()
            .map(|p| p.plan_group)
            .unwrap_or(PlanGroup::Unsubscribed);

        let mut next = current.clone();
        if let Some(customer_id) = &event.customer_id {
            next.billing_customer_id = Some(customer_id.clone());
        }
        next.billing_subscription_id = event.subscription_id.clone();
        next.set_status(SubscriptionStatus::Active, false);
        next.plan_opted = group;
        next.plan_id = enrichment.plan.as_ref().map(|p| p.plan_id.clone());
        next.cancel_at = None;
        next.canceled_at = None;
        next.ended_at = None;
        next.invoice = event.invoice_id.clone();
        next.invoice_pdf_link = enrichment.invoice_pdf_link;
        next.amount_total = checkout_amount(event);
        next.currency = event.currency.clone();
        next.payment_status = event.payment_status.clone();
        next.product_id = enrichment.product_id;
        next.price_id = enrichment.price_id;
        next.payment_id = enrichment.payment_id;
        next.payment_method_summary = enrichment.payment_method_summary;
        next.grant_single_group(group);

        ReconcilePlan {
            next: Some(next),
            group_sync: Some(group),
            transition: Transition::Activated(group),
        }
    }

    /// Soft failure: status only, access untouched.
    pub fn invoice_payment_failed(&self, current: &UserSubscriptionRecord) -> ReconcilePlan {
        let mut next = current.clone();
        let cancel_at_period_end = current.cancel_at_period_end;
        next.set_status(SubscriptionStatus::PastDue, cancel_at_period_end);

        ReconcilePlan {
            next: Some(next),
            group_sync: None,
            transition: Transition::MarkedPastDue,
        }
    }

    pub fn subscription_deleted(
        &self,
        current: &UserSubscriptionRecord,
        change: &SubscriptionChange,
    ) -> ReconcilePlan {
        if change.is_pending_scheduled_cancel() {
            return ReconcilePlan {
                next: None,
                group_sync: None,
                transition: Transition::ScheduledCancelNoOp,
            };
        }

        let status = change.status.clone().unwrap_or(SubscriptionStatus::Canceled);

        let mut next = current.clone();
        next.set_status(status, change.cancel_at_period_end);
        next.plan_opted = PlanGroup::Unsubscribed;
        next.cancel_at = change.cancel_at;
        next.canceled_at = change.canceled_at;
        next.grant_single_group(PlanGroup::Unsubscribed);

        ReconcilePlan {
            next: Some(next),
            group_sync: Some(PlanGroup::Unsubscribed),
            transition: Transition::Terminated,
        }
    }

    /// Never grants a paid group; only checkout does.
    pub fn subscription_updated(
        &self,
        current: &UserSubscriptionRecord,
        change: &SubscriptionChange,
    ) -> ReconcilePlan {
        let status = change
            .status
            .clone()
            .or_else(|| current.subscription_status.clone())
            .unwrap_or(SubscriptionStatus::Canceled);
        let healthy = status.is_active() && !change.cancel_at_period_end;

        let mut next = current.clone();
        next.set_status(status, change.cancel_at_period_end);
        next.cancel_at = change.cancel_at;
        next.canceled_at = change.canceled_at;
        next.ended_at = change.ended_at;

        if next.scheduled_cancel {
            next.plan_opted = PlanGroup::Unsubscribed;
            return ReconcilePlan {
                next: Some(next),
                group_sync: None,
                transition: Transition::ScheduledCancel,
            };
        }

        if healthy && self.policy.preserve_plan_on_healthy_update {
            return ReconcilePlan {
                next: Some(next),
                group_sync: None,
                transition: Transition::PlanPreserved,
            };
        }

        next.plan_opted = PlanGroup::Unsubscribed;
        next.grant_single_group(PlanGroup::Unsubscribed);
        ReconcilePlan {
            next: Some(next),
            group_sync: Some(PlanGroup::Unsubscribed),
            transition: Transition::Downgraded,
        }
    }
}

fn checkout_amount(event: &CheckoutCompleted) -> Option<Decimal> {
    event
        .amount_total
        .map(|amount| from_minor_units(amount, event.currency.as_deref()))
}
