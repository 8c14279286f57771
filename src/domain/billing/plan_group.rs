//! Plan groups: the tier labels shared by plan records, subscription
//! records and the identity system's access groups.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Access tier a user is entitled to.
///
/// `Unsubscribed` is the sentinel granted whenever no paid plan applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanGroup {
    Pro,
    Premium,
    Basic,
    Free,
    Unsubscribed,
}

/// Groups that correspond to a subscription tier.
pub const SUBSCRIPTION_GROUPS: [PlanGroup; 4] = [
    PlanGroup::Pro,
    PlanGroup::Premium,
    PlanGroup::Basic,
    PlanGroup::Free,
];

/// Every group this service manages in the identity system.
pub const ALL_GROUPS: [PlanGroup; 5] = [
    PlanGroup::Pro,
    PlanGroup::Premium,
    PlanGroup::Basic,
    PlanGroup::Free,
    PlanGroup::Unsubscribed,
];

impl PlanGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlanGroup::Pro => "pro",
            PlanGroup::Premium => "premium",
            PlanGroup::Basic => "basic",
            PlanGroup::Free => "free",
            PlanGroup::Unsubscribed => "unsubscribed",
        }
    }

    /// Returns true for every group other than the sentinel.
    pub fn is_subscription(&self) -> bool {
        !matches!(self, PlanGroup::Unsubscribed)
    }

    /// Matches a label from the identity system or plan catalog.
    pub fn from_label(label: &str) -> Option<Self> {
        ALL_GROUPS
            .iter()
            .copied()
            .find(|g| g.as_str().eq_ignore_ascii_case(label.trim()))
    }
}

impl Default for PlanGroup {
    fn default() -> Self {
        PlanGroup::Unsubscribed
    }
}

impl fmt::Display for PlanGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanGroup {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| {
            ValidationError::invalid_format("plan_group", format!("unknown label '{}'", s))
        })
    }
}
