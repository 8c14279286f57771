//! Identity provider admin API configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use super::server::Environment;

/// Identity provider admin API used for access group membership
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Admin API base URL
    pub admin_base_url: String,

    /// Bearer token for the admin API
    pub admin_api_token: String,

    /// User pool whose groups are managed
    pub user_pool_id: String,

    /// Timeout for admin API calls, in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

impl IdentityConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate identity configuration
    pub fn validate(&self, environment: &Environment) -> Result<(), ValidationError> {
        if self.admin_base_url.is_empty() {
            return Err(ValidationError::MissingRequired("IDENTITY_ADMIN_BASE_URL"));
        }
        if self.admin_api_token.is_empty() {
            return Err(ValidationError::MissingRequired("IDENTITY_ADMIN_API_TOKEN"));
        }
        if self.user_pool_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("IDENTITY_USER_POOL_ID"));
        }

        let is_https = self.admin_base_url.starts_with("https://");
        if !is_https && !self.admin_base_url.starts_with("http://") {
            return Err(ValidationError::InvalidUrl("identity admin"));
        }
        if *environment == Environment::Production && !is_https {
            return Err(ValidationError::UrlMustBeHttps("identity admin"));
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        Ok(())
    }
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            admin_base_url: String::new(),
            admin_api_token: String::new(),
            user_pool_id: String::new(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_timeout() -> u64 {
    10
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> IdentityConfig {
        IdentityConfig {
            admin_base_url: "https://idp.example.com".to_string(),
            admin_api_token: "token".to_string(),
            user_pool_id: "pool-1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(valid().validate(&Environment::Production).is_ok());
        assert_eq!(valid().timeout(), Duration::from_secs(10));
    }

    #[test]
    fn test_missing_token() {
        let config = IdentityConfig {
            admin_api_token: String::new(),
            ..valid()
        };
        assert_eq!(
            config.validate(&Environment::Development),
            Err(ValidationError::MissingRequired("IDENTITY_ADMIN_API_TOKEN"))
        );
    }

    #[test]
    fn test_plain_http_allowed_outside_production() {
        let config = IdentityConfig {
            admin_base_url: "http://localhost:9000".to_string(),
            ..valid()
        };
        assert!(config.validate(&Environment::Development).is_ok());
        assert_eq!(
            config.validate(&Environment::Production),
            Err(ValidationError::UrlMustBeHttps("identity admin"))
        );
    }

    #[test]
    fn test_non_http_url_rejected() {
        let config = IdentityConfig {
            admin_base_url: "ftp://idp".to_string(),
            ..valid()
        };
        assert!(config.validate(&Environment::Development).is_err());
    }
}
