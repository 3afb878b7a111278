//! # Capability Tokens
//!
//! Bearer tokens handed to a member when they join a group. A token carries
//! the member's `(secret, deviceId)` pair and is signed with the server key,
//! so presenting it later recovers the [`SecurityPile`](shared_types::SecurityPile)
//! the repository authorizes against.
//!
//! Format: compact JWS, header `{"alg":"HS256","typ":"JWT"}`, claims
//! `{"secret","deviceId","iat"}`. No expiry.

pub mod domain;
pub mod ports;
pub mod service;

pub use domain::{Claims, TokenError};
pub use ports::TokenService;
pub use service::TokenManager;
