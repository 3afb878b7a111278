//! Result of adding a member to a group.

use shared_types::{Group, Member, MemberId};

/// Whether a join created a member or recovered an existing one.
#[derive(Debug, Clone, PartialEq)]
pub enum Membership {
    /// A new member was appended. Carries its credentials so the caller can
    /// issue a token.
    Created(Member),
    /// A member with the same device already existed; its coordinates were
    /// refreshed and no token must be reissued.
    Rejoined(MemberId),
}

/// Group state after a join, plus how the join was resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinOutcome {
    pub group: Group,
    pub membership: Membership,
}

impl JoinOutcome {
    pub fn is_new_member(&self) -> bool {
        matches!(self.membership, Membership::Created(_))
    }

    pub fn member_id(&self) -> &str {
        match &self.membership {
            Membership::Created(member) => &member.id,
            Membership::Rejoined(id) => id,
        }
    }
}
