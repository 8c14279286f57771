//! Subscription status as reported by the payment provider.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Provider subscription status.
///
/// The three states the reconciler reasons about are modeled explicitly;
/// anything else the provider reports (`trialing`, `unpaid`, ...) is kept
/// verbatim so it can be persisted as-is.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
    Other(String),
}

impl SubscriptionStatus {
    pub fn from_provider(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "active" => Self::Active,
            "past_due" => Self::PastDue,
            "canceled" | "cancelled" => Self::Canceled,
            _ => Self::Other(value.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Active => "active",
            Self::PastDue => "past_due",
            Self::Canceled => "canceled",
            Self::Other(s) => s,
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

/// Scheduled cancel holds iff the subscription is still active but set to
/// end with the current period.
pub fn is_scheduled_cancel(status: &SubscriptionStatus, cancel_at_period_end: bool) -> bool {
    status.is_active() && cancel_at_period_end
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SubscriptionStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubscriptionStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(Self::from_provider(&raw))
    }
}
