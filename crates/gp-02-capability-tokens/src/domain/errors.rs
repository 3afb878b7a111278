use thiserror::Error;

/// Token issuing and verification failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Signing key is unusable.
    #[error("invalid signing key: {0}")]
    InvalidKey(String),

    /// Token is not three dot-separated segments.
    #[error("malformed token: expected 3 segments, got {0}")]
    Malformed(usize),

    /// A segment is not valid base64url.
    #[error("invalid token encoding in {segment}")]
    Encoding { segment: &'static str },

    /// A segment decoded but is not the expected JSON document.
    #[error("invalid token {segment}: {details}")]
    Payload {
        segment: &'static str,
        details: String,
    },

    /// Header names an algorithm other than HS256.
    #[error("unsupported token algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// MAC does not verify under the server key.
    #[error("token signature mismatch")]
    BadSignature,

    /// Claims could not be serialized while issuing.
    #[error("token signing failed: {0}")]
    Signing(String),
}
