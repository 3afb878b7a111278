//! Adapters layer: concrete store implementations.

pub mod memory_store;

pub use memory_store::InMemoryGroupStore;
