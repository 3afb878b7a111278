//! JOSE header and claim set of a capability token.

use serde::{Deserialize, Serialize};
use shared_types::SecurityPile;

/// The only accepted signing algorithm.
pub const ALGORITHM: &str = "HS256";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub typ: Option<String>,
}

impl Header {
    pub fn hs256() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: Some("JWT".to_string()),
        }
    }
}

/// Public claims. `androidId` is accepted as a legacy spelling of `deviceId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub secret: String,
    #[serde(alias = "androidId")]
    pub device_id: String,
    /// Issued-at, seconds since the epoch. Informational only.
    #[serde(default)]
    pub iat: i64,
}

impl Claims {
    pub fn new(secret: impl Into<String>, device_id: impl Into<String>, iat: i64) -> Self {
        Self {
            secret: secret.into(),
            device_id: device_id.into(),
            iat,
        }
    }

    pub fn into_pile(self) -> SecurityPile {
        SecurityPile::new(self.secret, self.device_id)
    }
}
