//! Alert notification configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Alert topic and subjects
#[derive(Debug, Clone, Deserialize)]
pub struct NotificationsConfig {
    /// Redis pub/sub channel alerts are published on
    #[serde(default = "default_alert_channel")]
    pub alert_channel: String,

    #[serde(default = "default_success_subject")]
    pub success_subject: String,

    #[serde(default = "default_subscription_deleted_subject")]
    pub subscription_deleted_subject: String,

    #[serde(default = "default_signature_error_subject")]
    pub signature_error_subject: String,

    #[serde(default = "default_exception_subject")]
    pub exception_subject: String,
}

impl NotificationsConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.alert_channel.trim().is_empty() {
            return Err(ValidationError::InvalidAlertChannel);
        }
        Ok(())
    }
}

impl Default for NotificationsConfig {
    fn default() -> Self {
        Self {
            alert_channel: default_alert_channel(),
            success_subject: default_success_subject(),
            subscription_deleted_subject: default_subscription_deleted_subject(),
            signature_error_subject: default_signature_error_subject(),
            exception_subject: default_exception_subject(),
        }
    }
}

fn default_alert_channel() -> String {
    "billing-alerts".to_string()
}

fn default_success_subject() -> String {
    "Stripe Webhook Success".to_string()
}

fn default_subscription_deleted_subject() -> String {
    "Stripe Subscription Deleted".to_string()
}

fn default_signature_error_subject() -> String {
    "Stripe Webhook Signature Error".to_string()
}

fn default_exception_subject() -> String {
    "Stripe Webhook Exception".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = NotificationsConfig::default();
        assert_eq!(config.alert_channel, "billing-alerts");
        assert_eq!(config.subscription_deleted_subject, "Stripe Subscription Deleted");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_blank_channel_rejected() {
        let config = NotificationsConfig {
            alert_channel: "  ".to_string(),
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidAlertChannel));
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let config: NotificationsConfig =
            serde_json::from_str(r#"{"success_subject": "Billing OK"}"#).unwrap();
        assert_eq!(config.success_subject, "Billing OK");
        assert_eq!(config.exception_subject, "Stripe Webhook Exception");
    }
}
