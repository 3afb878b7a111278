//! Inbound port used by the gateway.

use shared_types::SecurityPile;

use crate::domain::TokenError;

/// Issues and verifies capability tokens.
pub trait TokenService: Send + Sync {
    /// Sign a token carrying the member's credentials.
    fn create_token(&self, secret: &str, device_id: &str) -> Result<String, TokenError>;

    /// Verify a token and recover the credentials it carries.
    fn verify(&self, token: &str) -> Result<SecurityPile, TokenError>;
}
