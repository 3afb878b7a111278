//! Token domain: header and claim layouts, token errors.

pub mod claims;
pub mod errors;

pub use claims::{Claims, Header, ALGORITHM};
pub use errors::TokenError;
