//! # Permission Resolver
//!
//! Pure checks of a presented [`SecurityPile`] against a group snapshot.
//! None of these mutate state or fail: a pile that matches nobody is simply
//! denied.
//!
//! | Check | Grants |
//! |-------|--------|
//! | [`is_member`] | reading the group |
//! | [`is_valid_and_in_group`] | acting on one's own member record |
//! | [`is_admin`] | role changes, kicking others |

use shared_types::{Group, Member, SecurityPile};

/// The member whose stored credentials equal the pile, if any.
pub fn resolve<'a>(group: &'a Group, pile: &SecurityPile) -> Option<&'a Member> {
    group.members.iter().find(|m| pile.matches(m))
}

/// True iff some member's (secret, deviceId) exactly equals the pile.
pub fn is_member(group: &Group, pile: &SecurityPile) -> bool {
    resolve(group, pile).is_some()
}

/// True iff `member_id` is in the group and its credentials equal the pile.
pub fn is_valid_and_in_group(member_id: &str, group: &Group, pile: &SecurityPile) -> bool {
    group
        .member(member_id)
        .map(|member| pile.matches(member))
        .unwrap_or(false)
}

/// True iff the pile resolves to a member holding the admin role.
pub fn is_admin(group: &Group, pile: &SecurityPile) -> bool {
    resolve(group, pile)
        .map(|member| member.role.is_admin())
        .unwrap_or(false)
}
