//! Feature flags configuration

use serde::Deserialize;

/// Feature flags for reconciliation behavior
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureFlags {
    /// Keep the paid plan when an update reports an active subscription
    /// without cancel-at-period-end
    #[serde(default)]
    pub preserve_plan_on_healthy_update: bool,

    /// Serialize reconciliation per customer within this process
    #[serde(default = "default_serialize_per_user")]
    pub serialize_per_user: bool,

    /// Load plans from this YAML file instead of the `plans` table
    #[serde(default)]
    pub plan_catalog_file: Option<String>,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            preserve_plan_on_healthy_update: false,
            serialize_per_user: default_serialize_per_user(),
            plan_catalog_file: None,
        }
    }
}

fn default_serialize_per_user() -> bool {
    true
}
