//! HS256 token manager.
//!
//! Tokens are compact JWS: `base64url(header).base64url(claims).base64url(mac)`
//! with no padding, MAC = HMAC-SHA256 over the first two segments. There is
//! no expiry; holding the token is equivalent to holding the secret.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::de::DeserializeOwned;
use sha2::Sha256;
use shared_types::SecurityPile;
use tracing::debug;

use crate::domain::{Claims, Header, TokenError, ALGORITHM};
use crate::ports::TokenService;

type HmacSha256 = Hmac<Sha256>;

/// Length of generated per-process keys.
pub const GENERATED_KEY_LEN: usize = 32;

/// Signs and verifies tokens under one server key.
#[derive(Clone)]
pub struct TokenManager {
    key: Vec<u8>,
}

impl std::fmt::Debug for TokenManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenManager")
            .field("key", &"<redacted>")
            .finish()
    }
}

impl TokenManager {
    pub fn new(key: impl Into<Vec<u8>>) -> Result<Self, TokenError> {
        let key = key.into();
        if key.is_empty() {
            return Err(TokenError::InvalidKey("key is empty".to_string()));
        }
        Ok(Self { key })
    }

    /// Manager with a random key. Tokens do not survive a restart.
    pub fn random() -> Self {
        let mut key = vec![0u8; GENERATED_KEY_LEN];
        OsRng.fill_bytes(&mut key);
        Self { key }
    }

    fn mac(&self) -> Result<HmacSha256, TokenError> {
        HmacSha256::new_from_slice(&self.key).map_err(|e| TokenError::InvalidKey(e.to_string()))
    }

    fn encode_segment<T: serde::Serialize>(value: &T) -> Result<String, TokenError> {
        let json = serde_json::to_vec(value).map_err(|e| TokenError::Signing(e.to_string()))?;
        Ok(URL_SAFE_NO_PAD.encode(json))
    }

    fn decode_segment<T: DeserializeOwned>(
        encoded: &str,
        segment: &'static str,
    ) -> Result<T, TokenError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(encoded)
            .map_err(|_| TokenError::Encoding { segment })?;
        serde_json::from_slice(&bytes).map_err(|e| TokenError::Payload {
            segment,
            details: e.to_string(),
        })
    }

    pub fn sign(&self, claims: &Claims) -> Result<String, TokenError> {
        let signing_input = format!(
            "{}.{}",
            Self::encode_segment(&Header::hs256())?,
            Self::encode_segment(claims)?
        );

        let mut mac = self.mac()?;
        mac.update(signing_input.as_bytes());
        let signature = URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes());

        Ok(format!("{}.{}", signing_input, signature))
    }

    pub fn decode(&self, token: &str) -> Result<Claims, TokenError> {
        let segments: Vec<&str> = token.split('.').collect();
        let [header, claims, signature] = segments.as_slice() else {
            return Err(TokenError::Malformed(segments.len()));
        };

        let parsed: Header = Self::decode_segment(header, "header")?;
        if parsed.alg != ALGORITHM {
            return Err(TokenError::UnsupportedAlgorithm(parsed.alg));
        }

        let signature = URL_SAFE_NO_PAD
            .decode(signature)
            .map_err(|_| TokenError::Encoding {
                segment: "signature",
            })?;

        let mut mac = self.mac()?;
        mac.update(header.as_bytes());
        mac.update(b".");
        mac.update(claims.as_bytes());
        // Constant-time comparison.
        mac.verify_slice(&signature)
            .map_err(|_| TokenError::BadSignature)?;

        Self::decode_segment(claims, "claims")
    }
}

impl TokenService for TokenManager {
    fn create_token(&self, secret: &str, device_id: &str) -> Result<String, TokenError> {
        let claims = Claims::new(secret, device_id, chrono::Utc::now().timestamp());
        self.sign(&claims)
    }

    fn verify(&self, token: &str) -> Result<SecurityPile, TokenError> {
        self.decode(token)
            .map(Claims::into_pile)
            .inspect_err(|e| debug!(error = %e, "Rejected token"))
    }
}
