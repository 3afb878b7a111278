//! Cross-crate integration flows.

pub mod e2e;
pub mod flows;
