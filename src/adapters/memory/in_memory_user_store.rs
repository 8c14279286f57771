//! In-memory user record store.
//!
//! Keeps secondary indexes for customer id and lowercased email so lookups
//! have the same cost model as the indexed database queries.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::domain::billing::UserSubscriptionRecord;
use crate::domain::foundation::DomainError;
use crate::ports::UserRecordStore;

#[derive(Default)]
struct Tables {
    by_user: HashMap<String, UserSubscriptionRecord>,
    by_customer: HashMap<String, String>,
    by_email: HashMap<String, String>,
}

impl Tables {
    fn index(&mut self, record: &UserSubscriptionRecord) {
        let user_id = record.user_id.as_str().to_string();
        if let Some(customer) = &record.billing_customer_id {
            self.by_customer.insert(customer.clone(), user_id.clone());
        }
        if let Some(email) = &record.email {
            // First onboarded user wins for a shared email.
            self.by_email.entry(email.trim().to_lowercase()).or_insert(user_id);
        }
    }

    fn unindex_customer(&mut self, record: &UserSubscriptionRecord) {
        if let Some(customer) = &record.billing_customer_id {
            if self.by_customer.get(customer) == Some(&record.user_id.as_str().to_string()) {
                self.by_customer.remove(customer);
            }
        }
    }
}

/// UserRecordStore held in process memory.
#[derive(Default)]
pub struct InMemoryUserRecordStore {
    tables: RwLock<Tables>,
}

impl InMemoryUserRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a record as onboarding would.
    pub async fn insert(&self, record: UserSubscriptionRecord) {
        let mut tables = self.tables.write().await;
        tables.index(&record);
        tables
            .by_user
            .insert(record.user_id.as_str().to_string(), record);
    }

    pub async fn get(&self, user_id: &str) -> Option<UserSubscriptionRecord> {
        self.tables.read().await.by_user.get(user_id).cloned()
    }
}

#[async_trait]
impl UserRecordStore for InMemoryUserRecordStore {
    async fn find_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Option<UserSubscriptionRecord>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_customer
            .get(customer_id)
            .and_then(|user_id| tables.by_user.get(user_id))
            .cloned())
    }

    async fn find_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserSubscriptionRecord>, DomainError> {
        let tables = self.tables.read().await;
        Ok(tables
            .by_email
            .get(&email.trim().to_lowercase())
            .and_then(|user_id| tables.by_user.get(user_id))
            .cloned())
    }

    async fn update_subscription(
        &self,
        record: &UserSubscriptionRecord,
    ) -> Result<(), DomainError> {
        let mut tables = self.tables.write().await;
        let user_id = record.user_id.as_str();

        let previous = tables
            .by_user
            .get(user_id)
            .cloned()
            .ok_or_else(|| DomainError::record_not_found(user_id))?;

        tables.unindex_customer(&previous);
        tables.index(record);
        tables.by_user.insert(user_id.to_string(), record.clone());
        Ok(())
    }
}
