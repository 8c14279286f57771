//! PostgreSQL implementation of UserRecordStore.
//!
//! Reads and updates the billing columns of the `users` table. Rows are
//! inserted by onboarding, never by this service.

use crate::domain::billing::{
    PaymentMethodSummary, PlanGroup, SubscriptionStatus, UserSubscriptionRecord,
};
use crate::domain::foundation::{DomainError, ErrorCode, Timestamp, UserId};
use crate::ports::UserRecordStore;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::types::Json;
use sqlx::PgPool;

const SELECT_COLUMNS: &str = r#"
    SELECT user_id, email, identity_username, stripe_customer_id, stripe_subscription_id,
           subscription_status, plan_opted, plan_id, cancel_at_period_end, scheduled_cancel,
           cancel_at, canceled_at, ended_at, invoice, invoice_pdf, amount_total, currency,
           payment_status, product_id, price_id, payment_id, payment_method_summary, groups
    FROM users
"#;

/// PostgreSQL implementation of the UserRecordStore port.
pub struct PostgresUserRecordStore {
    pool: PgPool,
}

impl PostgresUserRecordStore {
    /// Creates a new PostgresUserRecordStore with the given connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Database row representation of a user's subscription state.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    user_id: String,
    email: Option<String>,
    identity_username: Option<String>,
    stripe_customer_id: Option<String>,
    stripe_subscription_id: Option<String>,
    subscription_status: Option<String>,
    plan_opted: String,
    plan_id: Option<String>,
    cancel_at_period_end: bool,
    scheduled_cancel: bool,
    cancel_at: Option<DateTime<Utc>>,
    canceled_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    invoice: Option<String>,
    invoice_pdf: Option<String>,
    amount_total: Option<Decimal>,
    currency: Option<String>,
    payment_status: Option<String>,
    product_id: Option<String>,
    price_id: Option<String>,
    payment_id: Option<String>,
    payment_method_summary: Option<Json<PaymentMethodSummary>>,
    groups: Vec<String>,
}

impl TryFrom<UserRow> for UserSubscriptionRecord {
    type Error = DomainError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let user_id = UserId::new(row.user_id).map_err(|e| {
            DomainError::new(ErrorCode::DatabaseError, format!("Invalid user_id: {}", e))
        })?;

        Ok(UserSubscriptionRecord {
            user_id,
            email: row.email,
            identity_username: row.identity_username,
            billing_customer_id: row.stripe_customer_id,
            billing_subscription_id: row.stripe_subscription_id,
            subscription_status: row
                .subscription_status
                .as_deref()
                .map(SubscriptionStatus::from_provider),
            plan_opted: parse_group(&row.plan_opted)?,
            plan_id: row.plan_id,
            cancel_at_period_end: row.cancel_at_period_end,
            scheduled_cancel: row.scheduled_cancel,
            cancel_at: row.cancel_at.map(Timestamp::from_datetime),
            canceled_at: row.canceled_at.map(Timestamp::from_datetime),
            ended_at: row.ended_at.map(Timestamp::from_datetime),
            invoice: row.invoice,
            invoice_pdf_link: row.invoice_pdf,
            amount_total: row.amount_total,
            currency: row.currency,
            payment_status: row.payment_status,
            product_id: row.product_id,
            price_id: row.price_id,
            payment_id: row.payment_id,
            payment_method_summary: row.payment_method_summary.map(|Json(summary)| summary),
            groups: row
                .groups
                .iter()
                .map(|g| parse_group(g))
                .collect::<Result<_, _>>()?,
        })
    }
}

fn parse_group(s: &str) -> Result<PlanGroup, DomainError> {
    PlanGroup::from_label(s).ok_or_else(|| {
        DomainError::new(
            ErrorCode::DatabaseError,
            format!("Invalid plan group value: {}", s),
        )
    })
}

fn groups_to_strings(groups: &[PlanGroup]) -> Vec<String> {
    groups.iter().map(|g| g.as_str().to_string()).collect()
}

fn db_error(action: &str, e: sqlx::Error) -> DomainError {
    DomainError::new(ErrorCode::DatabaseError, format!("Failed to {}: {}", action, e))
}

#[async_trait]
impl UserRecordStore for PostgresUserRecordStore {
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserSubscriptionRecord>, DomainError> {
        let query = format!("{} WHERE stripe_customer_id = $1", SELECT_COLUMNS);
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(customer_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find user by customer id", e))?;

        row.map(UserSubscriptionRecord::try_from).transpose()
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserSubscriptionRecord>, DomainError> {
        // Served by the users_lower_email_idx expression index.
        let query = format!(
            "{} WHERE lower(email) = lower($1) ORDER BY user_id LIMIT 1",
            SELECT_COLUMNS
        );
        let row: Option<UserRow> = sqlx::query_as(&query)
            .bind(email.trim())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| db_error("find user by email", e))?;

        row.map(UserSubscriptionRecord::try_from).transpose()
    }

    async fn update_subscription(
        &self,
        record: &UserSubscriptionRecord,
    ) -> Result<(), DomainError> {
        let result = sqlx::query(
            r#"
            UPDATE users SET
                stripe_customer_id = $2,
                stripe_subscription_id = $3,
                subscription_status = $4,
                plan_opted = $5,
                plan_id = $6,
                cancel_at_period_end = $7,
                scheduled_cancel = $8,
                cancel_at = $9,
                canceled_at = $10,
                ended_at = $11,
                invoice = $12,
                invoice_pdf = $13,
                amount_total = $14,
                currency = $15,
                payment_status = $16,
                product_id = $17,
                price_id = $18,
                payment_id = $19,
                payment_method_summary = $20,
                groups = $21,
                updated_at = now()
            WHERE user_id = $1
            "#,
        )
        .bind(record.user_id.as_str())
        .bind(&record.billing_customer_id)
        .bind(&record.billing_subscription_id)
        .bind(record.subscription_status.as_ref().map(|s| s.as_str()))
        .bind(record.plan_opted.as_str())
        .bind(&record.plan_id)
        .bind(record.cancel_at_period_end)
        .bind(record.scheduled_cancel)
        .bind(record.cancel_at.map(|t| *t.as_datetime()))
        .bind(record.canceled_at.map(|t| *t.as_datetime()))
        .bind(record.ended_at.map(|t| *t.as_datetime()))
        .bind(&record.invoice)
        .bind(&record.invoice_pdf_link)
        .bind(record.amount_total)
        .bind(&record.currency)
        .bind(&record.payment_status)
        .bind(&record.product_id)
        .bind(&record.price_id)
        .bind(&record.payment_id)
        .bind(record.payment_method_summary.as_ref().map(Json))
        .bind(groups_to_strings(&record.groups))
        .execute(&self.pool)
        .await
        .map_err(|e| db_error("update subscription", e))?;

        if result.rows_affected() == 0 {
            return Err(DomainError::record_not_found(record.user_id.as_str()));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> UserRow {
        UserRow {
            user_id: "user-1".into(),
            email: Some("ada@example.com".into()),
            identity_username: None,
            stripe_customer_id: Some("cus_1".into()),
            stripe_subscription_id: Some("sub_1".into()),
            subscription_status: Some("active".into()),
            plan_opted: "pro".into(),
            plan_id: Some("plan_pro".into()),
            cancel_at_period_end: false,
            scheduled_cancel: false,
            cancel_at: None,
            canceled_at: None,
            ended_at: None,
            invoice: None,
            invoice_pdf: None,
            amount_total: Some(Decimal::new(999, 2)),
            currency: Some("usd".into()),
            payment_status: Some("paid".into()),
            product_id: None,
            price_id: Some("price_pro".into()),
            payment_id: None,
            payment_method_summary: Some(Json(PaymentMethodSummary {
                last4: Some("4242".into()),
                ..Default::default()
            })),
            groups: vec!["pro".into()],
        }
    }

    #[test]
    fn row_converts_to_record() {
        let record = UserSubscriptionRecord::try_from(row()).unwrap();

        assert_eq!(record.user_id.as_str(), "user-1");
        assert_eq!(record.subscription_status, Some(SubscriptionStatus::Active));
        assert_eq!(record.plan_opted, PlanGroup::Pro);
        assert_eq!(record.groups, vec![PlanGroup::Pro]);
        assert_eq!(
            record.payment_method_summary.unwrap().last4.as_deref(),
            Some("4242")
        );
    }

    #[test]
    fn unknown_group_in_row_is_rejected() {
        let mut bad = row();
        bad.groups = vec!["platinum".into()];

        let err = UserSubscriptionRecord::try_from(bad).unwrap_err();
        assert_eq!(err.code, ErrorCode::DatabaseError);
    }

    #[test]
    fn unknown_status_is_kept_verbatim() {
        let mut r = row();
        r.subscription_status = Some("incomplete_expired".into());

        let record = UserSubscriptionRecord::try_from(r).unwrap();
        assert_eq!(record.status_label(), "incomplete_expired");
    }

    #[test]
    fn groups_serialize_as_labels() {
        assert_eq!(
            groups_to_strings(&[PlanGroup::Unsubscribed]),
            vec!["unsubscribed".to_string()]
        );
    }
}
