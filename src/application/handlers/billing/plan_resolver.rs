//! Plan resolution from a billing price id.

use std::sync::Arc;

use crate::domain::billing::{PlanRecord, ReconcileError};
use crate::ports::PlanCatalog;

/// Resolves a price id to its plan record.
///
/// An unknown price is not an error: the caller falls back to the
/// unsubscribed group. Catalog failures are.
#[derive(Clone)]
pub struct PlanResolver {
    catalog: Arc<dyn PlanCatalog>,
}

impl PlanResolver {
    pub fn new(catalog: Arc<dyn PlanCatalog>) -> Self {
        Self { catalog }
    }

    pub async fn resolve(&self, price_id: Option<&str>) -> Result<Option<PlanRecord>, ReconcileError> {
        let Some(price_id) = price_id.map(str::trim).filter(|p| !p.is_empty()) else {
            tracing::warn!("No price id on subscription, plan unresolved");
            return Ok(None);
        };

        let plan = self.catalog.find_by_price_id(price_id).await?;
        match &plan {
            Some(plan) => {
                if !plan.active {
                    tracing::warn!(price_id, plan_id = %plan.plan_id, "Resolved plan is inactive");
                }
                tracing::debug!(price_id, plan_group = %plan.plan_group, "Plan resolved");
            }
            None => {
                let unresolved = ReconcileError::UnresolvedPlan {
                    price_id: price_id.to_string(),
                };
                tracing::warn!(error = %unresolved, "Falling back to unsubscribed group");
            }
        }
        Ok(plan)
    }
}
