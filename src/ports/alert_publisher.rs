//! Alert publisher port.
//!
//! Operational alerts for every processed delivery: one success or one
//! failure message per event. Publishing is fire-and-forget at the call
//! site; implementations still report errors so callers can log them.

use crate::domain::foundation::DomainError;
use async_trait::async_trait;

pub const SUBJECT_SUCCESS: &str = "Stripe Webhook Success";
pub const SUBJECT_SUBSCRIPTION_DELETED: &str = "Stripe Subscription Deleted";
pub const SUBJECT_SIGNATURE_ERROR: &str = "Stripe Webhook Signature Error";
pub const SUBJECT_EXCEPTION: &str = "Stripe Webhook Exception";

#[async_trait]
pub trait AlertPublisher: Send + Sync {
    /// Publish one alert to the outbound topic.
    async fn publish(&self, subject: &str, message: &str) -> Result<(), DomainError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn alert_publisher_is_object_safe() {
        fn _accepts_dyn(_publisher: &dyn AlertPublisher) {}
    }
}
