//! In-process implementation of [`GroupStore`].
//!
//! Documents live in a sharded `DashMap`; holding an entry's `RefMut` gives
//! exclusive access to that one group, which is the per-document atomicity
//! the store contract requires. A secondary index maps member ids to the
//! group containing them so `modify_where_member` does not scan.
//!
//! Lock order is always `groups` entry, then `member_index`. The index is
//! never held while a `groups` entry is acquired.

use dashmap::DashMap;
use shared_types::{Group, GroupId, MemberId};
use std::collections::HashSet;
use tracing::trace;

use crate::domain::RepositoryError;
use crate::ports::{Apply, GroupStore};

/// Group documents kept in memory.
#[derive(Debug, Default)]
pub struct InMemoryGroupStore {
    groups: DashMap<GroupId, Group>,
    member_index: DashMap<MemberId, GroupId>,
}

impl InMemoryGroupStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `apply` on a copy of the document and commit on success.
    ///
    /// Must be called with the document's entry exclusively held.
    fn apply_and_commit(
        &self,
        current: &mut Group,
        apply: Apply<'_>,
    ) -> Result<Group, RepositoryError> {
        let mut next = current.clone();
        apply(&mut next)?;
        self.reindex(current, &next);
        *current = next;
        Ok(current.clone())
    }

    fn reindex(&self, before: &Group, after: &Group) {
        let kept: HashSet<&str> = after.members.iter().map(|m| m.id.as_str()).collect();
        for member in &before.members {
            if !kept.contains(member.id.as_str()) {
                self.member_index
                    .remove_if(&member.id, |_, group_id| *group_id == before.id);
            }
        }
        for member in &after.members {
            self.member_index
                .entry(member.id.clone())
                .or_insert_with(|| after.id.clone());
        }
    }

    fn group_of_member(&self, member_id: &str) -> Option<GroupId> {
        self.member_index.get(member_id).map(|r| r.value().clone())
    }
}

impl GroupStore for InMemoryGroupStore {
    fn insert(&self, group: Group) -> Result<(), RepositoryError> {
        if self.groups.contains_key(&group.id) {
            return Err(RepositoryError::storage(format!(
                "duplicate group id {}",
                group.id
            )));
        }
        for member in &group.members {
            self.member_index.insert(member.id.clone(), group.id.clone());
        }
        trace!(group_id = %group.id, "Inserted group document");
        self.groups.insert(group.id.clone(), group);
        Ok(())
    }

    fn find_by_id(&self, group_id: &str) -> Result<Option<Group>, RepositoryError> {
        Ok(self.groups.get(group_id).map(|r| r.value().clone()))
    }

    fn modify_by_id(
        &self,
        group_id: &str,
        apply: Apply<'_>,
    ) -> Result<Option<Group>, RepositoryError> {
        let Some(mut entry) = self.groups.get_mut(group_id) else {
            return Ok(None);
        };
        self.apply_and_commit(entry.value_mut(), apply).map(Some)
    }

    fn modify_where_member(
        &self,
        member_id: &str,
        apply: Apply<'_>,
    ) -> Result<Option<Group>, RepositoryError> {
        let Some(group_id) = self.group_of_member(member_id) else {
            return Ok(None);
        };
        let Some(mut entry) = self.groups.get_mut(&group_id) else {
            return Ok(None);
        };
        // The index is read before the entry lock; re-check under the lock.
        if !entry.contains_member(member_id) {
            return Ok(None);
        }
        self.apply_and_commit(entry.value_mut(), apply).map(Some)
    }

    fn delete_if_empty(&self, group_id: &str) -> Result<bool, RepositoryError> {
        let removed = self
            .groups
            .remove_if(group_id, |_, group| group.is_empty())
            .is_some();
        if removed {
            trace!(group_id = %group_id, "Deleted empty group document");
        }
        Ok(removed)
    }

    fn len(&self) -> usize {
        self.groups.len()
    }
}
