//! Identity group port.
//!
//! Access to paid features is granted by membership in an identity-provider
//! group named after the plan group. The port exposes the three primitive
//! calls; convergence to a single group is done by the application layer.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::billing::PlanGroup;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Port for the identity provider's group administration API.
#[async_trait]
pub trait IdentityGroups: Send + Sync {
    /// Groups the user currently belongs to.
    async fn list_groups_for_user(&self, handle: &str) -> Result<Vec<PlanGroup>, IdentityError>;

    async fn remove_from_group(&self, handle: &str, group: PlanGroup) -> Result<(), IdentityError>;

    async fn add_to_group(&self, handle: &str, group: PlanGroup) -> Result<(), IdentityError>;
}

/// Errors from the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("Identity user not found: {0}")]
    UserNotFound(String),

    #[error("User {handle} is not a member of {group}")]
    NotAMember { handle: String, group: PlanGroup },

    #[error("Identity service unavailable: {0}")]
    Unavailable(String),

    #[error("Identity service rejected request: {0}")]
    Rejected(String),
}

impl IdentityError {
    /// Errors that leave the user in the desired state anyway.
    pub fn is_benign(&self) -> bool {
        matches!(
            self,
            IdentityError::UserNotFound(_) | IdentityError::NotAMember { .. }
        )
    }
}

impl From<IdentityError> for DomainError {
    fn from(err: IdentityError) -> Self {
        DomainError::new(ErrorCode::IdentityServiceError, err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Trait object safety test
    #[test]
    fn identity_groups_is_object_safe() {
        fn _accepts_dyn(_groups: &dyn IdentityGroups) {}
    }

    #[test]
    fn membership_errors_are_benign() {
        assert!(IdentityError::UserNotFound("ada".into()).is_benign());
        assert!(IdentityError::NotAMember {
            handle: "ada".into(),
            group: PlanGroup::Pro
        }
        .is_benign());
        assert!(!IdentityError::Unavailable("timeout".into()).is_benign());
        assert!(!IdentityError::Rejected("403".into()).is_benign());
    }

    #[test]
    fn identity_error_converts_to_domain_error() {
        let err: DomainError = IdentityError::Unavailable("timeout".into()).into();
        assert_eq!(err.code, ErrorCode::IdentityServiceError);
        assert!(err.message.contains("timeout"));
    }
}
