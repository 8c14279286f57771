//! Plan catalog seeded from a YAML file.
//!
//! ```yaml
//! plans:
//!   - plan_id: plan_pro_monthly
//!     stripe_price_id: price_1Pro
//!     plan_group: pro
//!     plan_name: Pro
//! ```

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;

use crate::domain::billing::PlanRecord;
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::PlanCatalog;

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    plans: Vec<PlanRecord>,
}

/// PlanCatalog over a fixed list of plans.
#[derive(Debug, Clone, Default)]
pub struct StaticPlanCatalog {
    plans: Vec<PlanRecord>,
}

impl StaticPlanCatalog {
    pub fn new(plans: Vec<PlanRecord>) -> Self {
        Self { plans }
    }

    /// Parses a YAML catalog document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, DomainError> {
        let file: CatalogFile = serde_yaml::from_str(yaml).map_err(|e| {
            DomainError::new(ErrorCode::InvalidFormat, format!("Invalid plan catalog: {}", e))
        })?;
        Ok(Self::new(file.plans))
    }

    /// Loads a YAML catalog from disk.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, DomainError> {
        let path = path.as_ref();
        let yaml = std::fs::read_to_string(path).map_err(|e| {
            DomainError::new(
                ErrorCode::InternalError,
                format!("Failed to read plan catalog: {}", e),
            )
            .with_detail("path", path.display().to_string())
        })?;
        let catalog = Self::from_yaml_str(&yaml)?;
        tracing::info!(path = %path.display(), plans = catalog.plans.len(), "Plan catalog loaded");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.plans.len()
    }

    pub fn is_empty(&self) -> bool {
        self.plans.is_empty()
    }
}

#[async_trait]
impl PlanCatalog for StaticPlanCatalog {
    async fn find_by_price_id(&self, price_id: &str) -> Result<Option<PlanRecord>, DomainError> {
        Ok(self.plans.iter().find(|p| p.matches_price(price_id)).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::billing::PlanGroup;
    use std::io::Write;

    const CATALOG: &str = r#"
plans:
  - plan_id: plan_pro
    stripe_price_id: price_1Pro
    plan_group: pro
    plan_name: Pro
  - plan_id: plan_basic
    stripe_price_id: price_1Basic
    plan_group: basic
    active: false
"#;

    #[tokio::test]
    async fn yaml_catalog_resolves_price_case_insensitively() {
        let catalog = StaticPlanCatalog::from_yaml_str(CATALOG).unwrap();

        let plan = catalog.find_by_price_id("PRICE_1PRO").await.unwrap().unwrap();
        assert_eq!(plan.plan_group, PlanGroup::Pro);
        assert_eq!(catalog.len(), 2);
    }

    #[tokio::test]
    async fn unknown_price_is_none() {
        let catalog = StaticPlanCatalog::from_yaml_str(CATALOG).unwrap();
        assert!(catalog.find_by_price_id("price_missing").await.unwrap().is_none());
    }

    #[test]
    fn missing_active_defaults_to_true() {
        let catalog = StaticPlanCatalog::from_yaml_str(CATALOG).unwrap();
        assert!(catalog.plans[0].active);
        assert!(!catalog.plans[1].active);
    }

    #[test]
    fn unknown_group_is_invalid_format() {
        let err = StaticPlanCatalog::from_yaml_str(
            "plans:\n  - plan_id: x\n    stripe_price_id: p\n    plan_group: platinum\n",
        )
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFormat);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let catalog = StaticPlanCatalog::from_yaml_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn missing_file_reports_path() {
        let err = StaticPlanCatalog::from_yaml_file("/nonexistent/plans.yaml").unwrap_err();
        assert_eq!(
            err.details.get("path").map(String::as_str),
            Some("/nonexistent/plans.yaml")
        );
    }
}
