//! Plan catalog entries.

use serde::{Deserialize, Serialize};

use super::plan_group::PlanGroup;

/// A priced product and the access tier it grants.
///
/// Read-only to the reconciler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRecord {
    pub plan_id: String,
    pub stripe_price_id: String,
    pub plan_group: PlanGroup,
    /// Display name used in confirmation emails.
    #[serde(default)]
    pub plan_name: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl PlanRecord {
    /// Provider price ids are compared case-insensitively.
    pub fn matches_price(&self, price_id: &str) -> bool {
        self.stripe_price_id.eq_ignore_ascii_case(price_id.trim())
    }

    pub fn display_name(&self) -> &str {
        self.plan_name
            .as_deref()
            .unwrap_or_else(|| self.plan_group.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plan() -> PlanRecord {
        PlanRecord {
            plan_id: "plan_pro_monthly".to_string(),
            stripe_price_id: "price_1ProMonthly".to_string(),
            plan_group: PlanGroup::Pro,
            plan_name: None,
            active: true,
        }
    }

    #[test]
    fn matches_price_ignores_case() {
        let plan = plan();
        assert!(plan.matches_price("price_1ProMonthly"));
        assert!(plan.matches_price("PRICE_1PROMONTHLY"));
        assert!(!plan.matches_price("price_1ProAnnual"));
    }

    #[test]
    fn display_name_falls_back_to_group_label() {
        let mut plan = plan();
        assert_eq!(plan.display_name(), "pro");

        plan.plan_name = Some("Pro Monthly".to_string());
        assert_eq!(plan.display_name(), "Pro Monthly");
    }

    #[test]
    fn deserializes_with_defaults() {
        let plan: PlanRecord = serde_json::from_str(
            r#"{"plan_id":"p1","stripe_price_id":"price_x","plan_group":"basic"}"#,
        )
        .unwrap();
        assert!(plan.active);
        assert_eq!(plan.plan_group, PlanGroup::Basic);
    }
}
