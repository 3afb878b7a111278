//! # Group Repository Service
//!
//! Implements [`GroupRepositoryApi`] over any [`GroupStore`].
//!
//! Each member-addressed operation is one `modify_where_member` call: the
//! store locates the group containing the member and hands it to a closure
//! that first resolves permissions and then mutates. Authorization and
//! apply see the same document state, so a concurrent demotion cannot slip
//! in between the check and the write.

use std::sync::Arc;

use shared_types::{CoordsBit, Group, GroupView, Member, MemberDraft, Role, SecurityPile};
use tracing::{debug, info};

use crate::domain::{
    is_admin, is_member, is_valid_and_in_group, JoinOutcome, Membership, RepositoryError,
};
use crate::ports::{GroupRepositoryApi, GroupStore};

/// The group repository.
pub struct GroupRepository<S: GroupStore> {
    store: Arc<S>,
}

impl<S: GroupStore> GroupRepository<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

impl<S: GroupStore> Clone for GroupRepository<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

/// Kick the member, keeping the group administrable.
///
/// If the removed member was the last admin, the earliest-joined remaining
/// member is promoted.
fn remove_member(group: &mut Group, member_id: &str) -> Option<Member> {
    let removed = group.remove_member(member_id)?;
    if removed.role.is_admin() && group.admin_count() == 0 {
        if let Some(successor) = group.members.first_mut() {
            successor.role = Role::Admin;
            info!(
                group_id = %group.id,
                member_id = %successor.id,
                "Promoted member after last admin left"
            );
        }
    }
    Some(removed)
}

impl<S: GroupStore> GroupRepositoryApi for GroupRepository<S> {
    fn create_group(&self, creator: MemberDraft) -> Result<Group, RepositoryError> {
        let group = Group::found(creator);
        self.store.insert(group.clone())?;

        info!(group_id = %group.id, "Created group");
        Ok(group)
    }

    fn get_group_by_id(
        &self,
        group_id: &str,
        pile: &SecurityPile,
    ) -> Result<GroupView, RepositoryError> {
        let group = self
            .store
            .find_by_id(group_id)?
            .ok_or(RepositoryError::GroupNotExists)?;

        if !is_member(&group, pile) {
            debug!(group_id = %group_id, "Read denied: pile matches no member");
            return Err(RepositoryError::NoSufficientPermissions);
        }

        Ok(group.export())
    }

    fn add_member_to_group(
        &self,
        group_id: &str,
        draft: MemberDraft,
    ) -> Result<JoinOutcome, RepositoryError> {
        let mut membership = None;

        let group = self
            .store
            .modify_by_id(group_id, &mut |group: &mut Group| {
                // An empty group is pending deletion after its last member left.
                if group.is_empty() {
                    return Err(RepositoryError::GroupNotExists);
                }
                membership = Some(match group.member_by_device_mut(&draft.device_id) {
                    Some(existing) => {
                        existing.coords_bit = draft.coords_bit;
                        Membership::Rejoined(existing.id.clone())
                    }
                    None => {
                        let member = Member::new(draft.clone(), Role::User);
                        group.members.push(member.clone());
                        Membership::Created(member)
                    }
                });
                Ok(())
            })?
            .ok_or(RepositoryError::GroupNotExists)?;

        let membership = membership
            .ok_or_else(|| RepositoryError::storage("store committed without applying update"))?;

        match &membership {
            Membership::Created(member) => {
                info!(group_id = %group.id, member_id = %member.id, "Member joined group")
            }
            Membership::Rejoined(member_id) => {
                info!(group_id = %group.id, member_id = %member_id, "Member rejoined group")
            }
        }

        Ok(JoinOutcome { group, membership })
    }

    fn update_member_role(
        &self,
        member_id: &str,
        role: Role,
        pile: &SecurityPile,
    ) -> Result<Group, RepositoryError> {
        let group = self
            .store
            .modify_where_member(member_id, &mut |group: &mut Group| {
                if !is_admin(group, pile) {
                    return Err(RepositoryError::NoSufficientPermissions);
                }
                let member = group
                    .member_mut(member_id)
                    .ok_or(RepositoryError::MemberNotExists)?;
                member.role = role;
                if group.admin_count() == 0 {
                    return Err(RepositoryError::NoSufficientPermissions);
                }
                Ok(())
            })?
            .ok_or(RepositoryError::MemberNotExists)?;

        info!(group_id = %group.id, member_id = %member_id, role = %role, "Updated member role");
        Ok(group)
    }

    fn update_member_coords_bit(
        &self,
        member_id: &str,
        coords: CoordsBit,
        pile: &SecurityPile,
    ) -> Result<Group, RepositoryError> {
        let group = self
            .store
            .modify_where_member(member_id, &mut |group: &mut Group| {
                if !is_valid_and_in_group(member_id, group, pile) {
                    return Err(RepositoryError::NoSufficientPermissions);
                }
                let member = group
                    .member_mut(member_id)
                    .ok_or(RepositoryError::MemberNotExists)?;
                member.coords_bit = coords;
                Ok(())
            })?
            .ok_or(RepositoryError::MemberNotExists)?;

        debug!(group_id = %group.id, member_id = %member_id, "Updated member coordinates");
        Ok(group)
    }

    fn kick_member(&self, member_id: &str, pile: &SecurityPile) -> Result<Group, RepositoryError> {
        let group = self
            .store
            .modify_where_member(member_id, &mut |group: &mut Group| {
                let authorized =
                    is_valid_and_in_group(member_id, group, pile) || is_admin(group, pile);
                if !authorized {
                    return Err(RepositoryError::NoSufficientPermissions);
                }
                remove_member(group, member_id)
                    .map(|_| ())
                    .ok_or(RepositoryError::MemberNotExists)
            })?
            .ok_or(RepositoryError::MemberNotExists)?;

        info!(group_id = %group.id, member_id = %member_id, "Removed member from group");

        if group.is_empty() && self.store.delete_if_empty(&group.id)? {
            info!(group_id = %group.id, "Deleted group after last member left");
        }

        Ok(group)
    }
}
