//! Domain layer: permission resolution, repository errors and join outcomes.
//! No I/O.

pub mod errors;
pub mod outcome;
pub mod permissions;

pub use errors::{ErrorKind, RepositoryError};
pub use outcome::{JoinOutcome, Membership};
pub use permissions::{is_admin, is_member, is_valid_and_in_group, resolve};
