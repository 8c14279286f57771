//! Identity provider admin API adapter.
//!
//! Talks to the identity provider's group administration endpoints:
//!
//! ```text
//! GET    {base}/admin/user-pools/{pool}/users/{handle}/groups
//! PUT    {base}/admin/user-pools/{pool}/groups/{group}/members/{handle}
//! DELETE {base}/admin/user-pools/{pool}/groups/{group}/members/{handle}
//! ```

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{StatusCode, Url};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use crate::domain::billing::PlanGroup;
use crate::ports::{IdentityError, IdentityGroups};

/// Identity admin API configuration.
#[derive(Clone)]
pub struct IdentityAdminConfig {
    pub base_url: String,
    pub api_token: SecretString,
    pub user_pool_id: String,
    pub timeout: Duration,
}

#[derive(Debug, Deserialize)]
struct GroupListResponse {
    #[serde(default)]
    groups: Vec<GroupEntry>,
}

#[derive(Debug, Deserialize)]
struct GroupEntry {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// HTTP implementation of the IdentityGroups port.
pub struct HttpIdentityGroups {
    base_url: Url,
    api_token: SecretString,
    user_pool_id: String,
    http_client: reqwest::Client,
}

impl HttpIdentityGroups {
    pub fn new(config: IdentityAdminConfig) -> Result<Self, IdentityError> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| IdentityError::Rejected(format!("Invalid identity base URL: {}", e)))?;
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        Ok(Self {
            base_url,
            api_token: config.api_token,
            user_pool_id: config.user_pool_id,
            http_client,
        })
    }

    /// Builds an admin URL with each segment percent-encoded.
    fn url(&self, segments: &[&str]) -> Result<Url, IdentityError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| IdentityError::Rejected("Identity base URL cannot be a base".into()))?
            .pop_if_empty()
            .extend(["admin", "user-pools", self.user_pool_id.as_str()])
            .extend(segments);
        Ok(url)
    }

    fn member_url(&self, handle: &str, group: PlanGroup) -> Result<Url, IdentityError> {
        self.url(&["groups", group.as_str(), "members", handle])
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, IdentityError> {
        request
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))
    }
}

/// Maps a non-success response to an identity error.
fn classify_failure(status: StatusCode, body: &str, handle: &str, group: Option<PlanGroup>) -> IdentityError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();
    let code = parsed.code.unwrap_or_default().to_ascii_lowercase();
    let message = parsed.message.unwrap_or_else(|| body.to_string());

    if code.contains("usernotfound") || code.contains("user_not_found") {
        return IdentityError::UserNotFound(handle.to_string());
    }

    match (status, group) {
        (StatusCode::NOT_FOUND, Some(group)) => IdentityError::NotAMember {
            handle: handle.to_string(),
            group,
        },
        (StatusCode::NOT_FOUND, None) => IdentityError::UserNotFound(handle.to_string()),
        (s, _) if s.is_server_error() || s == StatusCode::TOO_MANY_REQUESTS => {
            IdentityError::Unavailable(format!("{}: {}", s, message))
        }
        (s, _) => IdentityError::Rejected(format!("{}: {}", s, message)),
    }
}

#[async_trait]
impl IdentityGroups for HttpIdentityGroups {
    async fn list_groups_for_user(&self, handle: &str) -> Result<Vec<PlanGroup>, IdentityError> {
        let url = self.url(&["users", handle, "groups"])?;
        let response = self.send(self.http_client.get(url)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body, handle, None));
        }

        let list: GroupListResponse = response
            .json()
            .await
            .map_err(|e| IdentityError::Rejected(format!("Invalid group list: {}", e)))?;

        // Groups outside the plan vocabulary are not ours to manage.
        Ok(list
            .groups
            .iter()
            .filter_map(|g| PlanGroup::from_label(&g.name))
            .collect())
    }

    async fn remove_from_group(&self, handle: &str, group: PlanGroup) -> Result<(), IdentityError> {
        let url = self.member_url(handle, group)?;
        let response = self.send(self.http_client.delete(url)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(classify_failure(status, &body, handle, Some(group)));
        }
        Ok(())
    }

    async fn add_to_group(&self, handle: &str, group: PlanGroup) -> Result<(), IdentityError> {
        let url = self.member_url(handle, group)?;
        let response = self.send(self.http_client.put(url)).await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // A 404 on add means the user, not the membership, is missing.
            return Err(classify_failure(status, &body, handle, None));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn adapter(base: &str) -> HttpIdentityGroups {
        HttpIdentityGroups::new(IdentityAdminConfig {
            base_url: base.to_string(),
            api_token: SecretString::new("token".into()),
            user_pool_id: "pool-1".into(),
            timeout: Duration::from_millis(200),
        })
        .unwrap()
    }

    // ════════════════════════════════════════════════════════════════════════════
    // URL Construction
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn member_url_encodes_email_handles() {
        let url = adapter("https://idp.example.com/")
            .member_url("ada+test@example.com", PlanGroup::Pro)
            .unwrap();

        assert_eq!(
            url.as_str(),
            "https://idp.example.com/admin/user-pools/pool-1/groups/pro/members/ada+test@example.com"
        );
    }

    #[test]
    fn url_encodes_path_separators_in_handle() {
        let url = adapter("https://idp.example.com")
            .url(&["users", "a/b", "groups"])
            .unwrap();

        assert!(url.as_str().contains("/users/a%2Fb/groups"));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = HttpIdentityGroups::new(IdentityAdminConfig {
            base_url: "not a url".into(),
            api_token: SecretString::new("t".into()),
            user_pool_id: "p".into(),
            timeout: Duration::from_secs(1),
        });

        assert!(matches!(result, Err(IdentityError::Rejected(_))));
    }

    // ════════════════════════════════════════════════════════════════════════════
    // Failure Classification
    // ════════════════════════════════════════════════════════════════════════════

    #[test]
    fn not_found_on_membership_is_not_a_member() {
        let err = classify_failure(StatusCode::NOT_FOUND, "", "ada", Some(PlanGroup::Pro));
        assert!(matches!(err, IdentityError::NotAMember { .. }));
        assert!(err.is_benign());
    }

    #[test]
    fn user_not_found_code_wins_over_status() {
        let err = classify_failure(
            StatusCode::BAD_REQUEST,
            r#"{"code": "UserNotFoundException", "message": "User does not exist."}"#,
            "ada",
            Some(PlanGroup::Pro),
        );
        assert_eq!(err, IdentityError::UserNotFound("ada".into()));
    }

    #[test]
    fn server_errors_are_unavailable() {
        let err = classify_failure(StatusCode::SERVICE_UNAVAILABLE, "down", "ada", None);
        assert!(matches!(err, IdentityError::Unavailable(_)));
        assert!(!err.is_benign());
    }

    #[test]
    fn forbidden_is_rejected() {
        let err = classify_failure(StatusCode::FORBIDDEN, r#"{"message":"bad token"}"#, "ada", None);
        assert_eq!(err, IdentityError::Rejected("403 Forbidden: bad token".into()));
    }

    #[tokio::test]
    async fn unreachable_service_is_unavailable() {
        let err = adapter("http://127.0.0.1:9")
            .add_to_group("ada", PlanGroup::Pro)
            .await
            .unwrap_err();

        assert!(matches!(err, IdentityError::Unavailable(_)));
    }
}
