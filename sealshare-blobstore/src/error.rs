use thiserror::Error;

pub type BlobStoreResult<T> = Result<T, BlobStoreError>;

#[derive(Debug, Error)]
pub enum BlobStoreError {
    #[error("upload failed for {path}: {reason}")]
    UploadFailed { path: String, reason: String },
    #[error("blob not found: {0}")]
    NotFound(String),
    #[error("download failed for {path}: {reason}")]
    DownloadFailed { path: String, reason: String },
    #[error("signed link generation failed for {path}: {reason}")]
    LinkGenerationFailed { path: String, reason: String },
    #[error("invalid link: {0}")]
    InvalidLink(String),
    #[error("link expired")]
    LinkExpired,
    #[error("link signature does not match")]
    InvalidSignature,
    #[error("storage credentials expired or invalid")]
    CredentialExpired,
    #[error("storage error: {0}")]
    Storage(String),
}

impl From<duckdb::Error> for BlobStoreError {
    fn from(e: duckdb::Error) -> Self {
        Self::Storage(e.to_string())
    }
}
