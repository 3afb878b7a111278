//! Ports layer: inbound API trait and outbound store SPI.

pub mod inbound;
pub mod outbound;

pub use inbound::GroupRepositoryApi;
pub use outbound::{Apply, GroupStore};
