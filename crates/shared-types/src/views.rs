//! # Exported Views
//!
//! The only representation of a group that leaves the service. Views carry
//! no `secret` and no `deviceId`; converting from the domain entities is the
//! single place where credentials are dropped.

use serde::{Deserialize, Serialize};

use crate::entities::{CoordsBit, Group, GroupId, Member, MemberId, Role};

/// Exported member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    pub id: MemberId,
    pub name: String,
    pub role: Role,
    pub coords_bit: CoordsBit,
}

/// Exported group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupView {
    pub id: GroupId,
    pub members: Vec<MemberView>,
}

impl From<&Member> for MemberView {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id.clone(),
            name: member.name.clone(),
            role: member.role,
            coords_bit: member.coords_bit,
        }
    }
}

impl From<&Group> for GroupView {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id.clone(),
            members: group.members.iter().map(MemberView::from).collect(),
        }
    }
}

impl Group {
    /// Strip credentials for delivery to any caller.
    pub fn export(&self) -> GroupView {
        GroupView::from(self)
    }
}
