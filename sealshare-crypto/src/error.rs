//! Crypto error types.

use thiserror::Error;

/// Result type for crypto operations.
pub type CryptoResult<T> = Result<T, CryptoError>;

/// Errors produced by the envelope encryption layer.
///
/// `AuthenticationFailed` deliberately carries no detail: a wrong key and a
/// tampered envelope must look the same to the caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    #[error("crypto unavailable: {0}")]
    CryptoUnavailable(String),

    #[error("authentication failed (wrong key or tampered data)")]
    AuthenticationFailed,

    #[error("malformed envelope: {len} bytes is shorter than the {min}-byte nonce")]
    MalformedEnvelope { len: usize, min: usize },

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("key encoding error: {0}")]
    KeyEncoding(String),
}
