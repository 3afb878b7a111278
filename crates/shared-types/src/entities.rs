//! # Core Domain Entities
//!
//! Defines the group-tracking entities shared by the repository, the token
//! service and the gateway.
//!
//! ## Clusters
//!
//! - **Groups**: `Group`, `Member`, `Role`
//! - **Location**: `CoordsBit`
//! - **Drafts**: `MemberDraft` (boundary input before identity is assigned)
//!
//! ## Invariants
//!
//! - A persisted `Group` has at least one `Member`; the first member is the founder.
//! - The founder is created with `Role::Admin`, every later member with `Role::User`.
//! - Member `id` and `secret` are assigned once by [`Member::new`] and never change.
//! - A member holds exactly one `CoordsBit`, the latest one received.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::DomainError;
use crate::security::{generate_secret, SecurityPile};

/// Opaque group identifier (UUID v4 rendered as a string).
pub type GroupId = String;

/// Opaque member identifier (UUID v4 rendered as a string).
pub type MemberId = String;

/// Generate a fresh opaque identifier for a group or a member.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// ROLE
// =============================================================================

/// Member role within a group.
///
/// Encoded numerically on the wire: `0` = user, `1` = admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(into = "u8", try_from = "u8")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub const USER_CODE: u8 = 0;
    pub const ADMIN_CODE: u8 = 1;

    pub fn is_admin(self) -> bool {
        self == Role::Admin
    }
}

impl From<Role> for u8 {
    fn from(role: Role) -> Self {
        match role {
            Role::User => Role::USER_CODE,
            Role::Admin => Role::ADMIN_CODE,
        }
    }
}

impl TryFrom<u8> for Role {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            Role::USER_CODE => Ok(Role::User),
            Role::ADMIN_CODE => Ok(Role::Admin),
            other => Err(DomainError::UnknownRole(i64::from(other))),
        }
    }
}

impl TryFrom<i64> for Role {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        u8::try_from(value)
            .map_err(|_| DomainError::UnknownRole(value))
            .and_then(Role::try_from)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

// =============================================================================
// COORDINATES
// =============================================================================

/// A single timestamped location observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordsBit {
    pub lat: f32,
    pub lng: f32,
    /// Observation time, stamped server-side.
    pub time: DateTime<Utc>,
}

impl CoordsBit {
    pub fn new(lat: f32, lng: f32, time: DateTime<Utc>) -> Self {
        Self { lat, lng, time }
    }

    /// Coordinates observed right now.
    pub fn now(lat: f32, lng: f32) -> Self {
        Self::new(lat, lng, Utc::now())
    }
}

// =============================================================================
// MEMBER
// =============================================================================

/// Boundary input describing a member that is about to be created or rejoined.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberDraft {
    pub name: String,
    pub device_id: String,
    pub coords_bit: CoordsBit,
}

impl MemberDraft {
    pub fn new(name: impl Into<String>, device_id: impl Into<String>, coords_bit: CoordsBit) -> Self {
        Self {
            name: name.into(),
            device_id: device_id.into(),
            coords_bit,
        }
    }
}

/// A group participant, including its stored credentials.
///
/// This type never crosses the service boundary as-is; see
/// [`crate::views::MemberView`] for the exported form.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    pub role: Role,
    pub device_id: String,
    pub secret: String,
    pub coords_bit: CoordsBit,
}

impl Member {
    /// Create a member from a draft, assigning a fresh identifier and secret.
    pub fn new(draft: MemberDraft, role: Role) -> Self {
        Self {
            id: new_id(),
            name: draft.name,
            role,
            device_id: draft.device_id,
            secret: generate_secret(),
            coords_bit: draft.coords_bit,
        }
    }

    /// The credential pair a client of this member presents.
    pub fn security_pile(&self) -> SecurityPile {
        SecurityPile::new(self.secret.clone(), self.device_id.clone())
    }
}

// =============================================================================
// GROUP
// =============================================================================

/// A location-sharing group. Members are kept in join order.
#[derive(Debug, Clone, PartialEq)]
pub struct Group {
    pub id: GroupId,
    pub members: Vec<Member>,
}

impl Group {
    /// Found a new group. The creator becomes its first member and admin.
    pub fn found(creator: MemberDraft) -> Self {
        Self {
            id: new_id(),
            members: vec![Member::new(creator, Role::Admin)],
        }
    }

    /// The founding member, if the group still has members.
    pub fn founder(&self) -> Option<&Member> {
        self.members.first()
    }

    pub fn member(&self, member_id: &str) -> Option<&Member> {
        self.members.iter().find(|m| m.id == member_id)
    }

    pub fn member_mut(&mut self, member_id: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.id == member_id)
    }

    pub fn member_by_device_mut(&mut self, device_id: &str) -> Option<&mut Member> {
        self.members.iter_mut().find(|m| m.device_id == device_id)
    }

    pub fn contains_member(&self, member_id: &str) -> bool {
        self.member(member_id).is_some()
    }

    /// Remove a member, returning it if it was present.
    pub fn remove_member(&mut self, member_id: &str) -> Option<Member> {
        let index = self.members.iter().position(|m| m.id == member_id)?;
        Some(self.members.remove(index))
    }

    pub fn admin_count(&self) -> usize {
        self.members.iter().filter(|m| m.role.is_admin()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
