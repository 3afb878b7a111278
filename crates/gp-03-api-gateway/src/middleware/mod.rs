//! Middleware stack for the API Gateway.
//!
//! Layer order: Request → Tracing → CORS → Timeout → Auth → Handler

pub mod auth;
pub mod cors;
pub mod tracing;

pub use auth::{AuthLayer, Caller, Identity};
pub use cors::create_cors_layer;
pub use tracing::TracingLayer;
