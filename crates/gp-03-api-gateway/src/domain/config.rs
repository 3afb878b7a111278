//! Gateway configuration with validation.

use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::time::Duration;

/// Default listen port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default maximum inbound WebSocket message size (64KB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Default transport limit (1MB). Larger messages reset the socket.
pub const DEFAULT_TRANSPORT_LIMIT: usize = 1024 * 1024;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// HTTP server configuration
    pub http: HttpConfig,
    /// WebSocket connection limits
    pub websocket: WebSocketConfig,
    /// CORS configuration
    pub cors: CorsConfig,
    /// Capability token signing
    pub token: TokenConfig,
}

impl GatewayConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.port == 0 {
            return Err(ConfigError::InvalidPort);
        }

        if self.http.request_timeout.is_zero() {
            return Err(ConfigError::InvalidTimeout(
                "request_timeout cannot be 0".into(),
            ));
        }

        if self.websocket.max_message_size == 0 {
            return Err(ConfigError::InvalidLimit(
                "max_message_size cannot be 0".into(),
            ));
        }

        if self.websocket.transport_limit < self.websocket.max_message_size {
            return Err(ConfigError::InvalidLimit(
                "transport_limit cannot be below max_message_size".into(),
            ));
        }

        if self.websocket.send_buffer == 0 {
            return Err(ConfigError::InvalidLimit("send_buffer cannot be 0".into()));
        }

        if matches!(&self.token.secret, Some(secret) if secret.is_empty()) {
            return Err(ConfigError::EmptyTokenSecret);
        }

        Ok(())
    }

    /// Settings that are valid but unsafe outside development.
    pub fn validate_for_production(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if self.token.secret.is_none() {
            warnings.push(
                "no token secret configured; issued tokens are invalidated on restart".to_string(),
            );
        }

        if self.cors.enabled && self.cors.allowed_origins.iter().any(|o| o == "*") {
            warnings.push("CORS allows any origin".to_string());
        }

        warnings
    }

    /// Get HTTP server bind address
    pub fn http_addr(&self) -> SocketAddr {
        SocketAddr::new(self.http.host, self.http.port)
    }
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Bind address
    pub host: IpAddr,
    /// Port (default: 8080)
    pub port: u16,
    /// Upper bound on handling one request (upgrade only, for WebSockets)
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::new(0, 0, 0, 0)),
            port: DEFAULT_PORT,
            request_timeout: Duration::from_secs(15),
        }
    }
}

/// WebSocket connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Messages above this size are dropped and the connection stays open
    pub max_message_size: usize,
    /// Hard cap enforced by the WebSocket codec; exceeding it closes the connection
    pub transport_limit: usize,
    /// Outbound write buffer size in bytes
    pub send_buffer: usize,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
            transport_limit: DEFAULT_TRANSPORT_LIMIT,
            send_buffer: 128 * 1024,
        }
    }
}

/// CORS configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CorsConfig {
    /// Enable CORS
    pub enabled: bool,
    /// Allowed origins ("*" for all)
    pub allowed_origins: Vec<String>,
    /// Allowed methods
    pub allowed_methods: Vec<String>,
    /// Allowed headers
    pub allowed_headers: Vec<String>,
    /// Max age for preflight cache
    pub max_age: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            allowed_origins: vec!["*".to_string()],
            allowed_methods: vec![
                "GET".to_string(),
                "POST".to_string(),
                "PATCH".to_string(),
                "DELETE".to_string(),
                "OPTIONS".to_string(),
            ],
            allowed_headers: vec!["Content-Type".to_string(), "Authorization".to_string()],
            max_age: 86400, // 24 hours
        }
    }
}

/// Token signing configuration
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// HMAC key. `None` means a random per-process key.
    pub secret: Option<String>,
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &self.secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("port cannot be 0")]
    InvalidPort,

    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),

    #[error("invalid limit: {0}")]
    InvalidLimit(String),

    #[error("token secret cannot be empty")]
    EmptyTokenSecret,
}
