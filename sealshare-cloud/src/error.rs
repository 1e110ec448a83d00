//! Pipeline error types.

use sealshare_blobstore::BlobStoreError;
use sealshare_crypto::CryptoError;
use sealshare_storage::StorageError;
use thiserror::Error;

/// Result type for pipeline operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors surfaced by uploads, downloads and key custody.
#[derive(Debug, Error)]
pub enum CloudError {
    #[error("crypto unavailable: {0}")]
    CryptoUnavailable(String),

    #[error("authentication failed (wrong key or tampered data)")]
    AuthenticationFailed,

    #[error("malformed envelope ({0} bytes)")]
    MalformedEnvelope(usize),

    #[error("upload failed: {0}")]
    UploadFailed(String),

    #[error("signed link generation failed: {0}")]
    LinkGenerationFailed(String),

    #[error("download failed: {0}")]
    DownloadFailed(String),

    #[error("key record already exists for {0}")]
    DuplicatePath(String),

    #[error("key persistence failed: {0}")]
    KeyPersistence(String),

    #[error("no key record for {0}")]
    KeyNotFound(String),

    #[error("invalid link: {0}")]
    InvalidLink(String),

    #[error("authentication required")]
    AuthRequired,

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage credentials expired or invalid")]
    CredentialExpired,

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<CryptoError> for CloudError {
    fn from(e: CryptoError) -> Self {
        match e {
            CryptoError::CryptoUnavailable(msg) => Self::CryptoUnavailable(msg),
            CryptoError::AuthenticationFailed => Self::AuthenticationFailed,
            CryptoError::MalformedEnvelope { len, .. } => Self::MalformedEnvelope(len),
            // Only reachable when a stored key fails to parse.
            other @ (CryptoError::InvalidKeyLength { .. } | CryptoError::KeyEncoding(_)) => {
                Self::KeyPersistence(other.to_string())
            }
        }
    }
}

impl From<StorageError> for CloudError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::Duplicate(path) => Self::DuplicatePath(path),
            StorageError::NotFound(path) => Self::KeyNotFound(path),
            other => Self::KeyPersistence(other.to_string()),
        }
    }
}

impl From<BlobStoreError> for CloudError {
    fn from(e: BlobStoreError) -> Self {
        match e {
            BlobStoreError::UploadFailed { .. } => Self::UploadFailed(e.to_string()),
            BlobStoreError::LinkGenerationFailed { .. } => Self::LinkGenerationFailed(e.to_string()),
            BlobStoreError::NotFound(_) | BlobStoreError::DownloadFailed { .. } => {
                Self::DownloadFailed(e.to_string())
            }
            BlobStoreError::InvalidLink(msg) => Self::InvalidLink(msg),
            BlobStoreError::LinkExpired | BlobStoreError::InvalidSignature => {
                Self::InvalidLink(e.to_string())
            }
            BlobStoreError::CredentialExpired => Self::CredentialExpired,
            BlobStoreError::Storage(msg) => Self::DownloadFailed(msg),
        }
    }
}
