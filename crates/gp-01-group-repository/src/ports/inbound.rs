//! # Inbound Ports (Driving Ports)
//!
//! The operations the REST boundary and the connection hub call.

use shared_types::{CoordsBit, Group, GroupView, MemberDraft, Role, SecurityPile};

use crate::domain::{JoinOutcome, RepositoryError};

/// Primary API of the group repository.
///
/// Every mutating operation returns the post-mutation group. Callers export
/// it with [`Group::export`] before it leaves the process.
pub trait GroupRepositoryApi: Send + Sync {
    /// Found a group. The creator becomes its admin.
    ///
    /// Fails only with [`RepositoryError::Storage`].
    fn create_group(&self, creator: MemberDraft) -> Result<Group, RepositoryError>;

    /// Read a group as one of its members.
    ///
    /// - `Err(GroupNotExists)`: unknown group
    /// - `Err(NoSufficientPermissions)`: pile matches no member
    fn get_group_by_id(&self, group_id: &str, pile: &SecurityPile)
        -> Result<GroupView, RepositoryError>;

    /// Join a group, or rejoin it from a device that is already a member.
    ///
    /// - `Err(GroupNotExists)`: unknown group
    fn add_member_to_group(
        &self,
        group_id: &str,
        draft: MemberDraft,
    ) -> Result<JoinOutcome, RepositoryError>;

    /// Change a member's role. Admins only; the group always keeps one admin.
    fn update_member_role(
        &self,
        member_id: &str,
        role: Role,
        pile: &SecurityPile,
    ) -> Result<Group, RepositoryError>;

    /// Overwrite a member's position. The member itself only.
    fn update_member_coords_bit(
        &self,
        member_id: &str,
        coords: CoordsBit,
        pile: &SecurityPile,
    ) -> Result<Group, RepositoryError>;

    /// Remove a member. The member itself or an admin.
    fn kick_member(&self, member_id: &str, pile: &SecurityPile) -> Result<Group, RepositoryError>;
}
