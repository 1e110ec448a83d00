//! Shared types for the upload/retrieval pipeline.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who may fetch a key record given its storage path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalPolicy {
    /// Holding the link (and therefore the path) is sufficient.
    #[default]
    BearerLink,
    /// Only the identity that uploaded the file may fetch its key.
    OwnerOnly,
}

/// Result of a successful upload.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareLink {
    pub url: String,
    pub storage_path: String,
    pub expires_at: DateTime<Utc>,
}

/// Static S3 credentials, optionally short-lived (STS).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct S3Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl S3Credentials {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Utc::now() >= at)
    }
}
