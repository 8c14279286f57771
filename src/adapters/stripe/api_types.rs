//! Stripe REST API objects.
//!
//! These types represent Stripe API objects as returned by the retrieve
//! endpoints. Only the fields the reconciler reads are modelled; unknown
//! fields are ignored so API version bumps do not break parsing.

use serde::{Deserialize, Serialize};

use crate::domain::billing::PaymentMethodSummary;
use crate::ports::{ProviderInvoice, ProviderSubscription};

// ════════════════════════════════════════════════════════════════════════════════
// Expandable References
// ════════════════════════════════════════════════════════════════════════════════

/// A reference that Stripe returns either as an id or as the expanded object.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum Expandable {
    Id(String),
    Object { id: String },
}

impl Expandable {
    pub fn id(&self) -> &str {
        match self {
            Expandable::Id(id) => id,
            Expandable::Object { id } => id,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Subscription
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe subscription object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscription {
    /// Subscription ID (sub_xxx).
    pub id: String,

    #[serde(default)]
    pub customer: Option<Expandable>,

    /// Subscription status (active, past_due, canceled, etc.).
    #[serde(default)]
    pub status: Option<String>,

    /// Current period end (Unix timestamp).
    #[serde(default)]
    pub current_period_end: Option<i64>,

    #[serde(default)]
    pub cancel_at_period_end: bool,

    #[serde(default)]
    pub default_payment_method: Option<Expandable>,

    /// Subscription items (prices).
    #[serde(default)]
    pub items: StripeSubscriptionItems,
}

/// Container for subscription items.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeSubscriptionItems {
    #[serde(default)]
    pub data: Vec<StripeSubscriptionItem>,
}

/// Individual subscription item.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeSubscriptionItem {
    pub id: String,
    pub price: StripePrice,
}

/// Stripe price object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePrice {
    /// Price ID (price_xxx).
    pub id: String,

    #[serde(default)]
    pub product: Option<Expandable>,
}

impl From<StripeSubscription> for ProviderSubscription {
    fn from(sub: StripeSubscription) -> Self {
        let first_price = sub.items.data.into_iter().next().map(|item| item.price);

        Self {
            id: sub.id,
            customer_id: sub.customer.map(|c| c.id().to_string()),
            status: sub.status,
            price_id: first_price.as_ref().map(|p| p.id.clone()),
            product_id: first_price
                .and_then(|p| p.product)
                .map(|p| p.id().to_string()),
            default_payment_method: sub.default_payment_method.map(|pm| pm.id().to_string()),
            current_period_end: sub.current_period_end,
            cancel_at_period_end: sub.cancel_at_period_end,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Payment Method
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe payment method object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripePaymentMethod {
    /// Payment method ID (pm_xxx).
    pub id: String,

    #[serde(rename = "type", default)]
    pub method_type: Option<String>,

    #[serde(default)]
    pub card: Option<StripeCard>,

    #[serde(default)]
    pub billing_details: Option<StripeBillingDetails>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeCard {
    pub brand: Option<String>,
    pub country: Option<String>,
    pub funding: Option<String>,
    pub last4: Option<String>,
    pub exp_month: Option<u32>,
    pub exp_year: Option<u32>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeBillingDetails {
    #[serde(default)]
    pub address: Option<StripeAddress>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct StripeAddress {
    pub country: Option<String>,
    pub postal_code: Option<String>,
}

impl From<StripePaymentMethod> for PaymentMethodSummary {
    fn from(pm: StripePaymentMethod) -> Self {
        let card = pm.card.unwrap_or_default();
        let postal_code = pm
            .billing_details
            .and_then(|b| b.address)
            .and_then(|a| a.postal_code);

        Self {
            country: card.country,
            postal_code,
            brand: card.brand,
            funding: card.funding,
            last4: card.last4,
            exp_month: card.exp_month,
            exp_year: card.exp_year,
            method_type: pm.method_type,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════════
// Invoice
// ════════════════════════════════════════════════════════════════════════════════

/// Stripe invoice object.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StripeInvoice {
    /// Invoice ID (in_xxx).
    pub id: String,

    #[serde(default)]
    pub invoice_pdf: Option<String>,
}

impl From<StripeInvoice> for ProviderInvoice {
    fn from(invoice: StripeInvoice) -> Self {
        Self {
            id: invoice.id,
            invoice_pdf: invoice.invoice_pdf,
        }
    }
}

/// Stripe API error envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeErrorEnvelope {
    pub error: StripeApiError,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StripeApiError {
    #[serde(rename = "type", default)]
    pub error_type: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    // ════════════════════════════════════════════════════════════════════════════
    // Subscription Parsing Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn subscription_takes_first_item_price_and_product() {
        let json = r#"{
            "id": "sub_1",
            "object": "subscription",
            "customer": "cus_1",
            "status": "active",
            "current_period_end": 1706745600,
            "cancel_at_period_end": false,
            "default_payment_method": "pm_1",
            "items": {
                "object": "list",
                "data": [
                    {"id": "si_1", "price": {"id": "price_pro", "product": "prod_pro"}},
                    {"id": "si_2", "price": {"id": "price_addon", "product": "prod_addon"}}
                ]
            }
        }"#;

        let sub: ProviderSubscription = serde_json::from_str::<StripeSubscription>(json)
            .unwrap()
            .into();

        assert_eq!(sub.price_id.as_deref(), Some("price_pro"));
        assert_eq!(sub.product_id.as_deref(), Some("prod_pro"));
        assert_eq!(sub.default_payment_method.as_deref(), Some("pm_1"));
        assert_eq!(sub.customer_id.as_deref(), Some("cus_1"));
        assert_eq!(sub.current_period_end, Some(1_706_745_600));
    }

    #[test]
    fn subscription_accepts_expanded_references() {
        let json = r#"{
            "id": "sub_1",
            "customer": {"id": "cus_1", "object": "customer"},
            "default_payment_method": {"id": "pm_1", "object": "payment_method"},
            "items": {"data": [{"id": "si_1", "price": {"id": "price_1", "product": {"id": "prod_1"}}}]}
        }"#;

        let sub: ProviderSubscription = serde_json::from_str::<StripeSubscription>(json)
            .unwrap()
            .into();

        assert_eq!(sub.customer_id.as_deref(), Some("cus_1"));
        assert_eq!(sub.default_payment_method.as_deref(), Some("pm_1"));
        assert_eq!(sub.product_id.as_deref(), Some("prod_1"));
    }

    #[test]
    fn subscription_without_items_has_no_price() {
        let sub: ProviderSubscription =
            serde_json::from_str::<StripeSubscription>(r#"{"id": "sub_1"}"#)
                .unwrap()
                .into();

        assert!(sub.price_id.is_none());
        assert!(sub.product_id.is_none());
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Payment Method Tests
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn payment_method_summary_reads_card_and_billing_address() {
        let json = r#"{
            "id": "pm_1",
            "type": "card",
            "card": {
                "brand": "visa",
                "country": "US",
                "funding": "credit",
                "last4": "4242",
                "exp_month": 12,
                "exp_year": 2030
            },
            "billing_details": {"address": {"country": "US", "postal_code": "94107"}}
        }"#;

        let summary: PaymentMethodSummary = serde_json::from_str::<StripePaymentMethod>(json)
            .unwrap()
            .into();

        assert_eq!(summary.brand.as_deref(), Some("visa"));
        assert_eq!(summary.last4.as_deref(), Some("4242"));
        assert_eq!(summary.postal_code.as_deref(), Some("94107"));
        assert_eq!(summary.exp_month, Some(12));
        assert_eq!(summary.method_type.as_deref(), Some("card"));
    }

    #[test]
    fn payment_method_without_card_yields_empty_summary() {
        let summary: PaymentMethodSummary =
            serde_json::from_str::<StripePaymentMethod>(r#"{"id": "pm_1", "type": "sepa_debit"}"#)
                .unwrap()
                .into();

        assert!(summary.brand.is_none());
        assert_eq!(summary.method_type.as_deref(), Some("sepa_debit"));
    }

    #[test]
    fn error_envelope_parses() {
        let env: StripeErrorEnvelope = serde_json::from_str(
            r#"{"error": {"type": "invalid_request_error", "code": "resource_missing", "message": "No such subscription"}}"#,
        )
        .unwrap();

        assert_eq!(env.error.code.as_deref(), Some("resource_missing"));
    }
}
