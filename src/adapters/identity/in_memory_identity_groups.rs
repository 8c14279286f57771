//! In-memory identity groups for tests and local runs.

use std::collections::{BTreeSet, HashMap};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;

use crate::domain::billing::PlanGroup;
use crate::ports::{IdentityError, IdentityGroups};

/// One call against the identity service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupCall {
    List(String),
    Remove(String, PlanGroup),
    Add(String, PlanGroup),
}

#[derive(Default)]
struct State {
    members: HashMap<String, BTreeSet<PlanGroup>>,
    calls: Vec<GroupCall>,
    unavailable: bool,
    failing_adds: BTreeSet<PlanGroup>,
}

/// IdentityGroups backed by a map of known users to their groups.
///
/// Unknown handles answer `UserNotFound`, matching the real service.
#[derive(Default, Clone)]
pub struct InMemoryIdentityGroups {
    inner: Arc<Mutex<State>>,
}

impl InMemoryIdentityGroups {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a user with an initial set of groups.
    pub fn with_user(self, handle: &str, groups: &[PlanGroup]) -> Self {
        self.state()
            .members
            .insert(handle.to_string(), groups.iter().copied().collect());
        self
    }

    /// Makes every call fail as if the service were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.state().unavailable = unavailable;
    }

    /// Makes adding to one group fail with `Rejected`.
    pub fn fail_adds_to(&self, group: PlanGroup) {
        self.state().failing_adds.insert(group);
    }

    pub fn groups_of(&self, handle: &str) -> Vec<PlanGroup> {
        self.state()
            .members
            .get(handle)
            .map(|g| g.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn calls(&self) -> Vec<GroupCall> {
        self.state().calls.clone()
    }

    /// Number of remove/add calls; listing is read-only.
    pub fn mutation_count(&self) -> usize {
        self.state()
            .calls
            .iter()
            .filter(|c| !matches!(c, GroupCall::List(_)))
            .count()
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl IdentityGroups for InMemoryIdentityGroups {
    async fn list_groups_for_user(&self, handle: &str) -> Result<Vec<PlanGroup>, IdentityError> {
        let mut state = self.state();
        state.calls.push(GroupCall::List(handle.to_string()));
        if state.unavailable {
            return Err(IdentityError::Unavailable("identity service down".into()));
        }

        state
            .members
            .get(handle)
            .map(|g| g.iter().copied().collect())
            .ok_or_else(|| IdentityError::UserNotFound(handle.to_string()))
    }

    async fn remove_from_group(&self, handle: &str, group: PlanGroup) -> Result<(), IdentityError> {
        let mut state = self.state();
        state.calls.push(GroupCall::Remove(handle.to_string(), group));
        if state.unavailable {
            return Err(IdentityError::Unavailable("identity service down".into()));
        }

        let groups = state
            .members
            .get_mut(handle)
            .ok_or_else(|| IdentityError::UserNotFound(handle.to_string()))?;
        if !groups.remove(&group) {
            return Err(IdentityError::NotAMember {
                handle: handle.to_string(),
                group,
            });
        }
        Ok(())
    }

    async fn add_to_group(&self, handle: &str, group: PlanGroup) -> Result<(), IdentityError> {
        let mut state = self.state();
        state.calls.push(GroupCall::Add(handle.to_string(), group));
        if state.unavailable {
            return Err(IdentityError::Unavailable("identity service down".into()));
        }
        if state.failing_adds.contains(&group) {
            return Err(IdentityError::Rejected(format!("cannot add to {}", group)));
        }

        state
            .members
            .get_mut(handle)
            .ok_or_else(|| IdentityError::UserNotFound(handle.to_string()))?
            .insert(group);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn add_and_remove_track_membership() {
        let idp = InMemoryIdentityGroups::new().with_user("ada", &[PlanGroup::Unsubscribed]);

        idp.remove_from_group("ada", PlanGroup::Unsubscribed).await.unwrap();
        idp.add_to_group("ada", PlanGroup::Pro).await.unwrap();

        assert_eq!(idp.groups_of("ada"), vec![PlanGroup::Pro]);
        assert_eq!(idp.mutation_count(), 2);
    }

    #[tokio::test]
    async fn removing_absent_group_is_not_a_member() {
        let idp = InMemoryIdentityGroups::new().with_user("ada", &[]);

        let err = idp.remove_from_group("ada", PlanGroup::Pro).await.unwrap_err();
        assert!(matches!(err, IdentityError::NotAMember { .. }));
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let idp = InMemoryIdentityGroups::new();

        let err = idp.list_groups_for_user("ghost").await.unwrap_err();
        assert_eq!(err, IdentityError::UserNotFound("ghost".into()));
    }

    #[tokio::test]
    async fn unavailable_fails_every_call() {
        let idp = InMemoryIdentityGroups::new().with_user("ada", &[]);
        idp.set_unavailable(true);

        assert!(idp.add_to_group("ada", PlanGroup::Pro).await.is_err());
        assert!(idp.groups_of("ada").is_empty());
    }
}
