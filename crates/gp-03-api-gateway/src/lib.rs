//! # API Gateway
//!
//! External interface of the groups service: REST endpoints for group
//! lifecycle and a per-group WebSocket hub for live location updates.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      API GATEWAY (gp-03)                     │
//! ├──────────────────────────────────────────────────────────────┤
//! │   Tracing → CORS → Timeout → Auth (token → Identity)         │
//! │        │                                   │                 │
//! │   REST handlers                     /group/:id/ws            │
//! │        │                                   │                 │
//! │        │                            Hub (per-group registry) │
//! │        └──────────────┬────────────────────┘                 │
//! └───────────────────────┼──────────────────────────────────────┘
//!                         ▼
//!              gp-01 group repository
//! ```
//!
//! # Authentication
//!
//! Tokens from gp-02 are read from `Authorization: Bearer` or `?token=`.
//! An invalid token is rejected with 401 before routing; handlers that need
//! a caller take the [`middleware::Caller`] extractor.
//!
//! # Usage
//!
//! ```ignore
//! let service = ApiGatewayService::new(GatewayConfig::default(), repository, tokens)?;
//! service.run(shutdown_signal()).await?;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod domain;
pub mod middleware;
pub mod rest;
pub mod router;
pub mod service;
pub mod ws;

pub use domain::config::GatewayConfig;
pub use domain::error::{ApiError, ApiResult, GatewayError};
pub use router::build_router;
pub use service::ApiGatewayService;
pub use ws::Hub;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
