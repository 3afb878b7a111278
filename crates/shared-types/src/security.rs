//! # Member Credentials
//!
//! A member is identified by possession of its secret together with the
//! device it registered from. There is no password and no session store:
//! the (secret, deviceId) pair travels inside a signed token and is checked
//! against the stored member on every request.
//!
//! ## Security Properties
//!
//! - Secrets are 64 characters drawn from `[0-9A-Za-z]` with the OS RNG.
//! - Secret comparison runs in constant time.

use rand::rngs::OsRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use subtle::ConstantTimeEq;

use crate::entities::Member;

/// Length of a generated member secret.
pub const SECRET_LENGTH: usize = 64;

const SECRET_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Generate a fresh high-entropy member secret.
pub fn generate_secret() -> String {
    let mut rng = OsRng;
    (0..SECRET_LENGTH)
        .map(|_| SECRET_ALPHABET[rng.gen_range(0..SECRET_ALPHABET.len())] as char)
        .collect()
}

/// Constant-time string comparison.
///
/// Length mismatch is reported without early exit on content.
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    let lengths_equal = a.len().ct_eq(&b.len());
    let max_len = a.len().max(b.len());

    let mut a_padded = vec![0u8; max_len];
    let mut b_padded = vec![0xFFu8; max_len];
    a_padded[..a.len()].copy_from_slice(a.as_bytes());
    b_padded[..b.len()].copy_from_slice(b.as_bytes());

    (lengths_equal & a_padded.ct_eq(&b_padded)).into()
}

/// A presented (secret, deviceId) claim.
///
/// Holding a `SecurityPile` proves nothing by itself; it only becomes an
/// identity once it matches a stored member exactly.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityPile {
    pub secret: String,
    #[serde(alias = "androidId")]
    pub device_id: String,
}

impl SecurityPile {
    pub fn new(secret: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            device_id: device_id.into(),
        }
    }

    /// True iff both fields exactly equal the member's stored credentials.
    pub fn matches(&self, member: &Member) -> bool {
        let device_eq = self.device_id == member.device_id;
        let secret_eq = constant_time_eq(&self.secret, &member.secret);
        device_eq & secret_eq
    }
}

// Secrets must not end up in logs.
impl std::fmt::Debug for SecurityPile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecurityPile")
            .field("secret", &"<redacted>")
            .field("device_id", &self.device_id)
            .finish()
    }
}
