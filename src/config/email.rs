//! Email configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Email configuration (Resend)
#[derive(Debug, Clone, Deserialize)]
pub struct EmailConfig {
    /// Resend API key
    pub resend_api_key: String,

    /// From email address
    #[serde(default = "default_from_email")]
    pub from_email: String,

    /// From name
    #[serde(default = "default_from_name")]
    pub from_name: String,

    /// Link to the product dashboard, rendered into confirmation emails
    pub dashboard_link: String,

    /// Template used for subscription confirmations
    #[serde(default = "default_confirmation_template")]
    pub confirmation_template: String,

    /// Timeout for email API calls, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl EmailConfig {
    /// Get formatted "From" header value
    pub fn from_header(&self) -> String {
        format!("{} <{}>", self.from_name, self.from_email)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate email configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.resend_api_key.is_empty() {
            return Err(ValidationError::MissingRequired("RESEND_API_KEY"));
        }
        if !self.resend_api_key.starts_with("re_") {
            return Err(ValidationError::InvalidResendKey);
        }
        if !self.from_email.contains('@') {
            return Err(ValidationError::InvalidFromEmail);
        }
        if self.dashboard_link.is_empty() {
            return Err(ValidationError::MissingRequired("EMAIL_DASHBOARD_LINK"));
        }
        if !self.dashboard_link.starts_with("https://") && !self.dashboard_link.starts_with("http://") {
            return Err(ValidationError::InvalidUrl("dashboard"));
        }
        if self.confirmation_template.trim().is_empty() {
            return Err(ValidationError::MissingRequired("EMAIL_CONFIRMATION_TEMPLATE"));
        }
        Ok(())
    }
}

impl Default for EmailConfig {
    fn default() -> Self {
        Self {
            resend_api_key: String::new(),
            from_email: default_from_email(),
            from_name: default_from_name(),
            dashboard_link: String::new(),
            confirmation_template: default_confirmation_template(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_from_email() -> String {
    "billing@example.com".to_string()
}

fn default_from_name() -> String {
    "Billing".to_string()
}

fn default_confirmation_template() -> String {
    "subscription_confirmation".to_string()
}

fn default_timeout() -> u64 {
    10
}
