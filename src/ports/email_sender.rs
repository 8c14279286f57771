//! Transactional email port.

use std::collections::BTreeMap;

use crate::domain::foundation::DomainError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Template sent after a successful checkout.
pub const SUBSCRIPTION_CONFIRMATION_TEMPLATE: &str = "subscription_confirmation";

/// A templated email ready to send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplatedEmail {
    pub destination: String,
    pub template: String,
    /// Template variables, camelCase keys.
    pub data: BTreeMap<String, String>,
}

impl TemplatedEmail {
    pub fn new(destination: impl Into<String>, template: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            template: template.into(),
            data: BTreeMap::new(),
        }
    }

    pub fn with_var(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }
}

#[async_trait]
pub trait EmailSender: Send + Sync {
    async fn send_templated(&self, email: &TemplatedEmail) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn email_sender_is_object_safe() {
        fn _accepts_dyn(_sender: &dyn EmailSender) {}
    }

    #[test]
    fn with_var_collects_template_data() {
        let email = TemplatedEmail::new("ada@example.com", SUBSCRIPTION_CONFIRMATION_TEMPLATE)
            .with_var("planName", "Pro")
            .with_var("currency", "USD");

        assert_eq!(email.template, "subscription_confirmation");
        assert_eq!(email.data.get("planName").map(String::as_str), Some("Pro"));
        assert_eq!(email.data.len(), 2);
    }
}
