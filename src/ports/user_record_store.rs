//! User record store port.
//!
//! Defines the contract for reading and writing per-user subscription
//! records. Records are created by onboarding; this service only updates
//! the billing attributes of existing rows.
//!
//! # Design
//!
//! - **Indexed lookups**: by billing customer id, then by email
//! - **Absolute writes**: `update_subscription` overwrites every billing
//!   attribute, so replaying it converges

use crate::domain::billing::UserSubscriptionRecord;
use crate::domain::foundation::DomainError;
use async_trait::async_trait;

/// Repository port for user subscription records.
#[async_trait]
pub trait UserRecordStore: Send + Sync {
    /// Find the user owning a billing customer id (exact match).
    ///
    /// A customer id belongs to at most one user.
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserSubscriptionRecord>, DomainError>;

    /// Find a user by email, compared case-insensitively.
    async fn find_by_email(&self, email: &str)
        -> Result<Option<UserSubscriptionRecord>, DomainError>;

    /// Overwrite the billing attributes of an existing record.
    ///
    /// # Errors
    ///
    /// - `RecordNotFound` if no row has the record's user id
    /// - `DatabaseError` on persistence failure
    async fn update_subscription(&self, record: &UserSubscriptionRecord)
        -> Result<(), DomainError>;
}
