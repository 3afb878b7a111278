//! # Shared Types Crate
//!
//! Domain entities for location-sharing groups, the credential pair members
//! authenticate with, and the exported views returned to clients.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: `Group`, `Member`, `CoordsBit` and
//!   `SecurityPile` are defined here and nowhere else.
//! - **Credentials Stay Inside**: only [`GroupView`] / [`MemberView`] are
//!   serializable; the entities holding secrets are not.
//! - **Single Latest Position**: a member stores one `CoordsBit`, overwritten
//!   on each update.

pub mod entities;
pub mod errors;
pub mod security;
pub mod views;

pub use entities::*;
pub use errors::*;
pub use security::*;
pub use views::*;
