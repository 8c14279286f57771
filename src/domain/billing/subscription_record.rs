//! The canonical per-user subscription record.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{Timestamp, UserId};

use super::plan_group::PlanGroup;
use super::subscription_status::{is_scheduled_cancel, SubscriptionStatus};

/// Display snapshot of the card used for the subscription.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodSummary {
    pub country: Option<String>,
    pub postal_code: Option<String>,
    pub brand: Option<String>,
    pub funding: Option<String>,
    pub last4: Option<String>,
    pub exp_month: Option<u32>,
    pub exp_year: Option<u32>,
    #[serde(rename = "type")]
    pub method_type: Option<String>,
}

/// Subscription state for one user.
///
/// Created by onboarding; every billing attribute is written only by the
/// reconciler, always with absolute values so a replayed event converges.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSubscriptionRecord {
    pub user_id: UserId,

    /// Read-only: used for the email fallback lookup and as identity handle.
    pub email: Option<String>,
    /// Read-only: preferred identity handle when present.
    pub identity_username: Option<String>,

    pub billing_customer_id: Option<String>,
    pub billing_subscription_id: Option<String>,
    /// `None` until the first billing event for the user is reconciled.
    pub subscription_status: Option<SubscriptionStatus>,
    pub plan_opted: PlanGroup,
    pub plan_id: Option<String>,
    pub cancel_at_period_end: bool,
    pub scheduled_cancel: bool,
    pub cancel_at: Option<Timestamp>,
    pub canceled_at: Option<Timestamp>,
    pub ended_at: Option<Timestamp>,

    pub invoice: Option<String>,
    pub invoice_pdf_link: Option<String>,
    pub amount_total: Option<Decimal>,
    pub currency: Option<String>,
    pub payment_status: Option<String>,
    pub product_id: Option<String>,
    pub price_id: Option<String>,
    pub payment_id: Option<String>,
    pub payment_method_summary: Option<PaymentMethodSummary>,

    /// Access groups granted; this service always writes exactly one.
    pub groups: Vec<PlanGroup>,
}

impl UserSubscriptionRecord {
    /// A freshly onboarded user with no billing history.
    pub fn onboarded(user_id: UserId, email: Option<String>) -> Self {
        Self {
            user_id,
            email,
            identity_username: None,
            billing_customer_id: None,
            billing_subscription_id: None,
            subscription_status: None,
            plan_opted: PlanGroup::Unsubscribed,
            plan_id: None,
            cancel_at_period_end: false,
            scheduled_cancel: false,
            cancel_at: None,
            canceled_at: None,
            ended_at: None,
            invoice: None,
            invoice_pdf_link: None,
            amount_total: None,
            currency: None,
            payment_status: None,
            product_id: None,
            price_id: None,
            payment_id: None,
            payment_method_summary: None,
            groups: vec![PlanGroup::Unsubscribed],
        }
    }

    /// Handle used against the identity system: username, else email.
    pub fn identity_handle(&self) -> Option<&str> {
        self.identity_username
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .or_else(|| self.email.as_deref().filter(|e| !e.trim().is_empty()))
    }

    /// Sets status and cancel flag, re-deriving `scheduled_cancel`.
    pub fn set_status(&mut self, status: SubscriptionStatus, cancel_at_period_end: bool) {
        self.scheduled_cancel = is_scheduled_cancel(&status, cancel_at_period_end);
        self.subscription_status = Some(status);
        self.cancel_at_period_end = cancel_at_period_end;
    }

    pub fn grant_single_group(&mut self, group: PlanGroup) {
        self.groups = vec![group];
    }

    pub fn status_label(&self) -> &str {
        self.subscription_status
            .as_ref()
            .map(|s| s.as_str())
            .unwrap_or("unsubscribed")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserSubscriptionRecord {
        UserSubscriptionRecord::onboarded(
            UserId::new("user-1").unwrap(),
            Some("ada@example.com".to_string()),
        )
    }

    #[test]
    fn onboarded_record_starts_unsubscribed() {
        let record = record();
        assert_eq!(record.plan_opted, PlanGroup::Unsubscribed);
        assert_eq!(record.groups, vec![PlanGroup::Unsubscribed]);
        assert!(record.subscription_status.is_none());
        assert_eq!(record.status_label(), "unsubscribed");
    }

    #[test]
    fn identity_handle_prefers_username() {
        let mut record = record();
        assert_eq!(record.identity_handle(), Some("ada@example.com"));

        record.identity_username = Some("ada".to_string());
        assert_eq!(record.identity_handle(), Some("ada"));

        record.identity_username = Some("  ".to_string());
        assert_eq!(record.identity_handle(), Some("ada@example.com"));
    }

    #[test]
    fn identity_handle_absent_without_username_or_email() {
        let record = UserSubscriptionRecord::onboarded(UserId::new("u").unwrap(), None);
        assert!(record.identity_handle().is_none());
    }

    #[test]
    fn set_status_derives_scheduled_cancel() {
        let mut record = record();

        record.set_status(SubscriptionStatus::Active, true);
        assert!(record.scheduled_cancel);
        assert!(record.cancel_at_period_end);

        record.set_status(SubscriptionStatus::PastDue, true);
        assert!(!record.scheduled_cancel);
    }

    #[test]
    fn payment_method_summary_uses_type_key() {
        let summary = PaymentMethodSummary {
            method_type: Some("card".to_string()),
            ..Default::default()
        };
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["type"], "card");
    }
}
