//! Plan catalog port.
//!
//! Maps a billing price id to the plan record that names its access group.

use crate::domain::billing::PlanRecord;
use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// Read-only port over the plan catalog.
#[async_trait]
pub trait PlanCatalog: Send + Sync {
    /// Find the plan for a price id, compared case-insensitively.
    ///
    /// Returns `None` when no plan carries the price id.
    async fn find_by_price_id(&self, price_id: &str) -> Result<Option<PlanRecord>, DomainError>;
}
