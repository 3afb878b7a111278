//! Domain layer: configuration and error types.

pub mod config;
pub mod error;

pub use config::{ConfigError, CorsConfig, GatewayConfig, HttpConfig, TokenConfig, WebSocketConfig};
pub use error::{codes, ApiError, ApiResult, GatewayError, WsErrorPayload};
