//! ReconcileSubscriptionHandler - Applies one verified billing event to a user.
//!
//! Runs as a saga: the reconciler computes a [`ReconcilePlan`], then the
//! handler persists the record, converges identity groups and notifies.
//! Every step writes absolute values, so a redelivery of the same event
//! re-runs the whole saga to the same end state.

use std::sync::Arc;

use crate::domain::billing::{
    BillingEvent, CheckoutCompleted, CheckoutEnrichment, InvoiceFailed, PlanGroup,
    ReconcileError, ReconcilePlan, ReconcilePolicy, SubscriptionChange, SubscriptionReconciler,
    Transition, UserSubscriptionRecord,
};
use crate::domain::foundation::{Timestamp, UserId};
use crate::ports::{BillingProvider, IdentityGroups, PlanCatalog, UserRecordStore};

use super::group_sync::{GroupSyncReport, GroupSynchronizer};
use super::notifications::{ConfirmationDetails, Notifier};
use super::plan_resolver::PlanResolver;
use super::user_locks::UserLocks;

/// Command to reconcile one typed billing event.
#[derive(Debug, Clone)]
pub struct ReconcileSubscriptionCommand {
    /// Provider event id, for logs.
    pub event_id: String,
    pub event: BillingEvent,
}

/// Result of a reconciliation.
#[derive(Debug, Clone)]
pub struct ReconcileSubscriptionResult {
    pub user_id: UserId,
    pub transition: Transition,
    /// False when the computed record equals the stored one.
    pub persisted: bool,
    pub group_sync: Option<GroupSyncReport>,
}

/// Handler for reconciling subscription state from billing events.
pub struct ReconcileSubscriptionHandler {
    users: Arc<dyn UserRecordStore>,
    billing: Arc<dyn BillingProvider>,
    plans: PlanResolver,
    groups: GroupSynchronizer,
    notifier: Arc<Notifier>,
    reconciler: SubscriptionReconciler,
    locks: Arc<UserLocks>,
}

impl ReconcileSubscriptionHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        users: Arc<dyn UserRecordStore>,
        billing: Arc<dyn BillingProvider>,
        catalog: Arc<dyn PlanCatalog>,
        identity: Arc<dyn IdentityGroups>,
        notifier: Arc<Notifier>,
        policy: ReconcilePolicy,
        locks: Arc<UserLocks>,
    ) -> Self {
        Self {
            users,
            billing,
            plans: PlanResolver::new(catalog),
            groups: GroupSynchronizer::new(identity),
            notifier,
            reconciler: SubscriptionReconciler::new(policy),
            locks,
        }
    }

    pub async fn handle(
        &self,
        cmd: ReconcileSubscriptionCommand,
    ) -> Result<ReconcileSubscriptionResult, ReconcileError> {
        let lock_key = cmd.event.serialization_key().ok_or_else(|| {
            ReconcileError::invalid_payload(cmd.event.event_type(), "event type is not reconciled")
        })?;

        // Customer ids map 1:1 to users, so locking before lookup is safe.
        let _guard = self.locks.acquire(&lock_key).await;

        tracing::debug!(
            event_id = %cmd.event_id,
            event_type = cmd.event.event_type(),
            lock_key = %lock_key,
            "Reconciling billing event"
        );

        match &cmd.event {
            BillingEvent::CheckoutSessionCompleted(checkout) => {
                self.handle_checkout_completed(checkout).await
            }
            BillingEvent::InvoicePaymentFailed(invoice) => {
                self.handle_invoice_payment_failed(invoice).await
            }
            BillingEvent::SubscriptionDeleted(change) => {
                self.handle_subscription_deleted(change).await
            }
            BillingEvent::SubscriptionUpdated(change) => {
                self.handle_subscription_updated(change).await
            }
            BillingEvent::Unhandled { event_type } => Err(ReconcileError::invalid_payload(
                event_type.as_str(),
                "event type is not reconciled",
            )),
        }
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Per-event flows
    // ════════════════════════════════════════════════════════════════════════════

    async fn handle_checkout_completed(
        &self,
        checkout: &CheckoutCompleted,
    ) -> Result<ReconcileSubscriptionResult, ReconcileError> {
        let current = self.locate_for_checkout(checkout).await?;
        let (enrichment, next_renewal) = self.enrich_checkout(checkout).await?;

        let plan_name = enrichment
            .plan
            .as_ref()
            .map(|p| p.display_name().to_string());
        let plan = self.reconciler.checkout_completed(&current, checkout, enrichment);
        let next = plan.next.clone();
        let result = self.execute(&current, plan).await?;

        let group = match result.transition {
            Transition::Activated(group) => group,
            _ => PlanGroup::Unsubscribed,
        };
        self.notifier
            .alert(
                &self.notifier.subjects().success,
                &format!(
                    "checkout.session.completed processed for userId={}, customerId={}, subscriptionId={}, planOpted={}",
                    current.user_id,
                    checkout.customer_id.as_deref().unwrap_or(""),
                    checkout.subscription_id.as_deref().unwrap_or(""),
                    group,
                ),
            )
            .await;

        let destination = checkout
            .customer_email
            .clone()
            .or_else(|| current.email.clone());
        match (group.is_subscription(), destination) {
            (true, Some(destination)) => {
                let next = next.unwrap_or_else(|| current.clone());
                let user_name = next
                    .identity_username
                    .clone()
                    .unwrap_or_else(|| destination.clone());
                self.notifier
                    .send_confirmation(ConfirmationDetails {
                        destination,
                        user_name,
                        plan_name: plan_name.unwrap_or_else(|| group.to_string()),
                        amount: next.amount_total,
                        currency: next.currency.clone(),
                        next_renewal,
                        invoice_link: next.invoice_pdf_link.clone(),
                    })
                    .await;
            }
            (true, None) => {
                tracing::warn!(user_id = %current.user_id, "No email on record, skipping confirmation");
            }
            (false, _) => {}
        }

        Ok(result)
    }

    async fn handle_invoice_payment_failed(
        &self,
        invoice: &InvoiceFailed,
    ) -> Result<ReconcileSubscriptionResult, ReconcileError> {
        let current = self.locate(&invoice.customer_id).await?;
        let plan = self.reconciler.invoice_payment_failed(&current);
        let result = self.execute(&current, plan).await?;

        tracing::warn!(
            user_id = %current.user_id,
            invoice_id = %invoice.invoice_id,
            attempt_count = ?invoice.attempt_count,
            "Invoice payment failed, subscription past due"
        );
        self.notifier
            .alert(
                &self.notifier.subjects().success,
                &format!(
                    "invoice.payment_failed processed for userId={}, customerId={}, invoiceId={}",
                    current.user_id, invoice.customer_id, invoice.invoice_id,
                ),
            )
            .await;

        Ok(result)
    }

    async fn handle_subscription_deleted(
        &self,
        change: &SubscriptionChange,
    ) -> Result<ReconcileSubscriptionResult, ReconcileError> {
        let current = self.locate(&change.customer_id).await?;
        let plan = self.reconciler.subscription_deleted(&current, change);
        if plan.is_noop() {
            tracing::info!(
                user_id = %current.user_id,
                subscription_id = %change.subscription_id,
                "Deletion of a scheduled cancellation, nothing to do"
            );
        }
        let result = self.execute(&current, plan).await?;

        self.notifier
            .alert(
                &self.notifier.subjects().subscription_deleted,
                &format!(
                    "customer.subscription.deleted for customerId={}, userId={}, transition={:?}",
                    change.customer_id, current.user_id, result.transition,
                ),
            )
            .await;

        Ok(result)
    }

    async fn handle_subscription_updated(
        &self,
        change: &SubscriptionChange,
    ) -> Result<ReconcileSubscriptionResult, ReconcileError> {
        let current = self.locate(&change.customer_id).await?;
        let plan = self.reconciler.subscription_updated(&current, change);
        let result = self.execute(&current, plan).await?;

        self.notifier
            .alert(
                &self.notifier.subjects().success,
                &format!(
                    "customer.subscription.updated processed for userId={}, customerId={}, status={}, transition={:?}",
                    current.user_id,
                    change.customer_id,
                    change.status.as_ref().map(|s| s.as_str()).unwrap_or("unknown"),
                    result.transition,
                ),
            )
            .await;

        Ok(result)
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Saga steps
    // ════════════════════════════════════════════════════════════════════════════

    /// Persist, then sync groups. Notification is left to the caller.
    async fn execute(
        &self,
        current: &UserSubscriptionRecord,
        plan: ReconcilePlan,
    ) -> Result<ReconcileSubscriptionResult, ReconcileError> {
        let ReconcilePlan {
            next,
            group_sync,
            transition,
        } = plan;

        let persisted = match next {
            Some(next) if next != *current => {
                self.users.update_subscription(&next).await?;
                tracing::info!(
                    user_id = %next.user_id,
                    status = next.status_label(),
                    plan_opted = %next.plan_opted,
                    scheduled_cancel = next.scheduled_cancel,
                    "Subscription record updated"
                );
                true
            }
            Some(_) => {
                tracing::debug!(user_id = %current.user_id, "Record already converged");
                false
            }
            None => false,
        };

        let group_sync = match (group_sync, current.identity_handle()) {
            (Some(target), Some(handle)) => Some(self.groups.sync(handle, target).await),
            (Some(target), None) => {
                tracing::warn!(
                    user_id = %current.user_id,
                    group = %target,
                    "No identity handle on record, skipping group sync"
                );
                None
            }
            (None, _) => None,
        };

        Ok(ReconcileSubscriptionResult {
            user_id: current.user_id.clone(),
            transition,
            persisted,
            group_sync,
        })
    }

    async fn locate(&self, customer_id: &str) -> Result<UserSubscriptionRecord, ReconcileError> {
        self.users
            .find_by_customer_id(customer_id)
            .await?
            .ok_or_else(|| ReconcileError::RecordNotFound {
                lookup: format!("customer {}", customer_id),
            })
    }

    /// Checkout may be the first event for a customer, so fall back to email.
    async fn locate_for_checkout(
        &self,
        checkout: &CheckoutCompleted,
    ) -> Result<UserSubscriptionRecord, ReconcileError> {
        if let Some(customer_id) = checkout.customer_id.as_deref() {
            if let Some(record) = self.users.find_by_customer_id(customer_id).await? {
                return Ok(record);
            }
        }

        if let Some(email) = checkout.customer_email.as_deref() {
            if let Some(record) = self.users.find_by_email(email).await? {
                tracing::info!(
                    user_id = %record.user_id,
                    customer_id = ?checkout.customer_id,
                    "Located user by email"
                );
                return Ok(record);
            }
        }

        Err(ReconcileError::RecordNotFound {
            lookup: format!(
                "customer {} or email {}",
                checkout.customer_id.as_deref().unwrap_or("<none>"),
                checkout.customer_email.as_deref().unwrap_or("<none>")
            ),
        })
    }

    /// Retrieves subscription details for the snapshot.
    ///
    /// The subscription itself is required; payment method and invoice are
    /// display-only and their failures are logged.
    async fn enrich_checkout(
        &self,
        checkout: &CheckoutCompleted,
    ) -> Result<(CheckoutEnrichment, Option<Timestamp>), ReconcileError> {
        let Some(subscription_id) = checkout.subscription_id.as_deref() else {
            tracing::warn!(session_id = %checkout.session_id, "Checkout without subscription");
            return Ok((CheckoutEnrichment::default(), None));
        };

        let subscription = self
            .billing
            .retrieve_subscription(subscription_id)
            .await
            .map_err(|e| ReconcileError::external("billing provider", e))?
            .ok_or_else(|| {
                ReconcileError::external(
                    "billing provider",
                    format!("subscription {} not found", subscription_id),
                )
            })?;

        let plan = self.plans.resolve(subscription.price_id.as_deref()).await?;

        let payment_method_summary = match subscription.default_payment_method.as_deref() {
            Some(pm) => match self.billing.retrieve_payment_method(pm).await {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::warn!(payment_method = pm, error = %e, "Payment method lookup failed");
                    None
                }
            },
            None => None,
        };

        let invoice_pdf_link = match checkout.invoice_id.as_deref() {
            Some(invoice_id) => match self.billing.retrieve_invoice(invoice_id).await {
                Ok(invoice) => invoice.and_then(|i| i.invoice_pdf),
                Err(e) => {
                    tracing::warn!(invoice_id, error = %e, "Invoice lookup failed");
                    None
                }
            },
            None => None,
        };

        let next_renewal = Timestamp::from_optional_unix(subscription.current_period_end);
        Ok((
            CheckoutEnrichment {
                product_id: subscription.product_id,
                price_id: subscription.price_id,
                payment_id: subscription.default_payment_method,
                plan,
                invoice_pdf_link,
                payment_method_summary,
            },
            next_renewal,
        ))
    }
}
