//! Group synchronization against the identity provider.
//!
//! Converges a user to exactly one plan group: remove from every other
//! known group, then add to the target. Calls are not transactional; each
//! failure is logged and the remaining calls still run.

use std::sync::Arc;

use crate::domain::billing::{PlanGroup, ALL_GROUPS};
use crate::ports::{IdentityError, IdentityGroups};

/// What a sync did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupSyncReport {
    pub removed: Vec<PlanGroup>,
    pub added: bool,
    /// Non-benign failures, in call order.
    pub failures: Vec<String>,
}

impl GroupSyncReport {
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

#[derive(Clone)]
pub struct GroupSynchronizer {
    identity: Arc<dyn IdentityGroups>,
}

impl GroupSynchronizer {
    pub fn new(identity: Arc<dyn IdentityGroups>) -> Self {
        Self { identity }
    }

    pub async fn sync(&self, handle: &str, target: PlanGroup) -> GroupSyncReport {
        let mut report = GroupSyncReport::default();

        let (current, listed) = match self.identity.list_groups_for_user(handle).await {
            Ok(groups) => (groups, true),
            Err(e) => {
                tracing::warn!(handle, error = %e, "Listing groups failed, removing from all known groups");
                (ALL_GROUPS.to_vec(), false)
            }
        };

        for group in current.iter().copied().filter(|g| *g != target) {
            match self.identity.remove_from_group(handle, group).await {
                Ok(()) => report.removed.push(group),
                Err(e) => record_failure(&mut report, handle, "remove", group, e),
            }
        }

        if listed && current.contains(&target) {
            tracing::debug!(handle, group = %target, "Already in target group");
            return report;
        }

        match self.identity.add_to_group(handle, target).await {
            Ok(()) => report.added = true,
            Err(e) => record_failure(&mut report, handle, "add", target, e),
        }

        if report.is_clean() {
            tracing::info!(handle, group = %target, removed = ?report.removed, "Groups synced");
        }
        report
    }
}

fn record_failure(
    report: &mut GroupSyncReport,
    handle: &str,
    action: &str,
    group: PlanGroup,
    error: IdentityError,
) {
    if error.is_benign() {
        tracing::debug!(handle, action, group = %group, error = %error, "Ignoring benign group error");
        return;
    }
    tracing::warn!(handle, action, group = %group, error = %error, "Group sync call failed");
    report.failures.push(format!("{} {}: {}", action, group, error));
}
