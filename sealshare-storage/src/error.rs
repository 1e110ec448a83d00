//! Storage error types.

use sealshare_crypto::CryptoError;
use thiserror::Error;

/// Result type for key record storage.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from a [`crate::KeyStore`] backend.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("key record already exists for {0}")]
    Duplicate(String),

    #[error("key record not found for {0}")]
    NotFound(String),

    #[error("database error: {0}")]
    Database(#[from] duckdb::Error),

    #[error("stored key is unreadable: {0}")]
    KeyEncoding(#[from] CryptoError),

    #[error("invalid record: {0}")]
    InvalidRecord(String),

    #[error("key store backend error: {0}")]
    Backend(String),
}
