//! # Outbound Ports (Driven Ports)
//!
//! The document store the repository persists groups in.
//!
//! ## Atomicity Contract
//!
//! `modify_by_id` and `modify_where_member` are the store's find-and-modify
//! primitive. For the matched document they:
//!
//! 1. take exclusive access to that one document,
//! 2. run `apply` against the current state,
//! 3. commit the mutation only if `apply` returned `Ok`,
//! 4. return the post-mutation document.
//!
//! No other writer can interleave between steps 1 and 4. Permission checks
//! placed inside `apply` are therefore evaluated against exactly the state
//! being mutated. Atomicity is per document only; nothing spans two groups.

use shared_types::Group;

use crate::domain::RepositoryError;

/// Mutation run inside the store's critical section.
///
/// Returning `Err` aborts the update and leaves the document unchanged.
pub type Apply<'a> = &'a mut dyn FnMut(&mut Group) -> Result<(), RepositoryError>;

/// Group document store.
pub trait GroupStore: Send + Sync {
    /// Persist a new group document.
    fn insert(&self, group: Group) -> Result<(), RepositoryError>;

    /// Snapshot of one group document.
    fn find_by_id(&self, group_id: &str) -> Result<Option<Group>, RepositoryError>;

    /// Atomically modify the group with the given identifier.
    ///
    /// `Ok(None)` when no document has that identifier.
    fn modify_by_id(&self, group_id: &str, apply: Apply<'_>)
        -> Result<Option<Group>, RepositoryError>;

    /// Atomically modify the group whose member list contains `member_id`.
    ///
    /// `Ok(None)` when no document contains that member at apply time.
    fn modify_where_member(
        &self,
        member_id: &str,
        apply: Apply<'_>,
    ) -> Result<Option<Group>, RepositoryError>;

    /// Delete the group if, and only if, it currently has no members.
    fn delete_if_empty(&self, group_id: &str) -> Result<bool, RepositoryError>;

    /// Number of stored group documents.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
