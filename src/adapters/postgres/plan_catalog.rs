//! PostgreSQL implementation of PlanCatalog.

use crate::domain::billing::{PlanGroup, PlanRecord};
use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::PlanCatalog;
use async_trait::async_trait;
use sqlx::PgPool;

/// PostgreSQL implementation of the PlanCatalog port.
pub struct PostgresPlanCatalog {
    pool: PgPool,
}

impl PostgresPlanCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PlanRow {
    plan_id: String,
    stripe_price_id: String,
    plan_group: String,
    plan_name: Option<String>,
    active: bool,
}

impl TryFrom<PlanRow> for PlanRecord {
    type Error = DomainError;

    fn try_from(row: PlanRow) -> Result<Self, Self::Error> {
        let plan_group = PlanGroup::from_label(&row.plan_group).ok_or_else(|| {
            DomainError::new(
                ErrorCode::DatabaseError,
                format!("Invalid plan group value: {}", row.plan_group),
            )
            .with_detail("plan_id", row.plan_id.clone())
        })?;

        Ok(PlanRecord {
            plan_id: row.plan_id,
            stripe_price_id: row.stripe_price_id,
            plan_group,
            plan_name: row.plan_name,
            active: row.active,
        })
    }
}

#[async_trait]
impl PlanCatalog for PostgresPlanCatalog {
    async fn find_by_price_id(&self, price_id: &str) -> Result<Option<PlanRecord>, DomainError> {
        // Served by the plans_lower_price_idx expression index.
        let row: Option<PlanRow> = sqlx::query_as(
            r#"
            SELECT plan_id, stripe_price_id, plan_group, plan_name, active
            FROM plans
            WHERE lower(stripe_price_id) = lower($1)
            ORDER BY plan_id
            LIMIT 1
            "#,
        )
        .bind(price_id.trim())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Failed to find plan: {}", e))
        })?;

        row.map(PlanRecord::try_from).transpose()
    }
}
