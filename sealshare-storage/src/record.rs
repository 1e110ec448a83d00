//! Key records and the storage-path convention shared with the blob store.

use chrono::Utc;
use sealshare_crypto::EncryptionKey;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque user identity, supplied explicitly by the caller.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identity(String);

impl Identity {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Lifecycle of a key record during the two-phase upload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    /// Reserved before the blob upload; not yet retrievable.
    Pending,
    /// Blob is stored; the record is live.
    Committed,
}

impl RecordStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Committed => "committed",
        }
    }
}

impl FromStr for RecordStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "committed" => Ok(Self::Committed),
            other => Err(format!("unknown record status: {other}")),
        }
    }
}

/// Everything needed to decrypt one stored blob.
///
/// `key` serializes as standard base64 text.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KeyRecord {
    pub storage_path: String,
    pub key: EncryptionKey,
    pub owner_identity: Identity,
    pub original_name: String,
    pub original_content_type: String,
    pub status: RecordStatus,
    /// Unix milliseconds.
    pub created_at: i64,
}

impl KeyRecord {
    /// A freshly reserved record, stamped with the current time.
    pub fn pending(
        storage_path: impl Into<String>,
        key: EncryptionKey,
        owner_identity: Identity,
        original_name: impl Into<String>,
        original_content_type: impl Into<String>,
    ) -> Self {
        Self {
            storage_path: storage_path.into(),
            key,
            owner_identity,
            original_name: original_name.into(),
            original_content_type: original_content_type.into(),
            status: RecordStatus::Pending,
            created_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn is_committed(&self) -> bool {
        self.status == RecordStatus::Committed
    }
}

/// Builds `{owner}/{uploaded_at_ms}-{name}.encrypted`.
///
/// Path separators in the name are replaced so the owner prefix stays the
/// only directory level.
pub fn storage_path(owner: &Identity, uploaded_at_ms: i64, original_name: &str) -> String {
    let name: String = original_name
        .chars()
        .map(|c| if c == '/' || c == '\\' { '_' } else { c })
        .collect();
    format!("{owner}/{uploaded_at_ms}-{name}.encrypted")
}
