//! # Group Repository
//!
//! Owns group documents and every mutation applied to them.
//!
//! ## Purpose
//!
//! Creates groups, adds members, changes roles and coordinates, and removes
//! members. Each mutation carries a [`SecurityPile`](shared_types::SecurityPile)
//! that is resolved against the group's member list before anything changes.
//!
//! ## Permission Rules
//!
//! | Operation | Authorized caller |
//! |-----------|-------------------|
//! | `get_group_by_id` | any member of the group |
//! | `add_member_to_group` | anyone holding the group id |
//! | `update_member_role` | an admin of the target's group; the last admin stays admin |
//! | `update_member_coords_bit` | the target member itself |
//! | `kick_member` | the target member itself, or an admin |
//!
//! ## Atomicity
//!
//! The permission check and the mutation run inside one
//! [`GroupStore`] find-and-modify call, under exclusive access to the
//! document. See [`ports::outbound`].
//!
//! ## Membership Lifecycle
//!
//! - The creator is the first member and the first admin.
//! - Joining with a known device id refreshes that member's coordinates and
//!   keeps its secret.
//! - When the last admin leaves a non-empty group, the earliest-joined
//!   remaining member becomes admin.
//! - When the last member leaves, the group document is deleted.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::InMemoryGroupStore;
pub use domain::{ErrorKind, JoinOutcome, Membership, RepositoryError};
pub use ports::{GroupRepositoryApi, GroupStore};
pub use service::GroupRepository;
