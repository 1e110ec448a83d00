//! SealShare configuration.

use crate::error::{CloudError, CloudResult};
use crate::types::RetrievalPolicy;
use sealshare_blobstore::LocalBlobStore;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Longest signed-link lifetime S3 presigning accepts (7 days).
pub const MAX_LINK_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Configuration for the upload/retrieval pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SealShareConfig {
    /// Lifetime of issued retrieval links, in seconds.
    pub link_ttl_secs: u64,

    /// S3 bucket holding encrypted blobs.
    pub s3_bucket: String,

    /// AWS region for S3.
    pub s3_region: String,

    /// Optional S3 endpoint override (for MinIO in testing).
    pub s3_endpoint_override: Option<String>,

    /// Base URL of the REST key store (e.g., "https://project.supabase.co").
    pub key_api_base_url: String,

    /// API key sent as `apikey` and bearer token to the key store.
    pub key_api_key: Option<String>,

    /// Table holding key records.
    pub key_table: String,

    /// Whether key records are released to any link holder or only their owner.
    pub retrieval_policy: RetrievalPolicy,

    /// Pending key records older than this are removed by reconciliation.
    pub pending_grace_secs: u64,

    /// Base URL embedded in links issued by the local blob store.
    pub public_base_url: String,
}

impl Default for SealShareConfig {
    fn default() -> Self {
        Self {
            link_ttl_secs: 3600,
            s3_bucket: "uploads".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_endpoint_override: None,
            key_api_base_url: "http://localhost:54321".to_string(),
            key_api_key: None,
            key_table: "file_keys".to_string(),
            retrieval_policy: RetrievalPolicy::BearerLink,
            pending_grace_secs: 900, // 15 minutes
            public_base_url: "http://localhost:8080".to_string(),
        }
    }
}

impl SealShareConfig {
    /// Loads a JSON config file. Missing fields take their defaults.
    pub fn from_json_file(path: &Path) -> CloudResult<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| CloudError::Config(format!("cannot read {}: {e}", path.display())))?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Opens a local blob store issuing links under `public_base_url`.
    /// `None` keeps blobs in memory.
    pub fn open_local_blob_store(&self, db_path: Option<&Path>) -> CloudResult<LocalBlobStore> {
        let store = match db_path {
            Some(path) => LocalBlobStore::open(path, &self.public_base_url),
            None => LocalBlobStore::open_in_memory(&self.public_base_url),
        };
        store.map_err(|e| CloudError::Config(format!("cannot open local blob store: {e}")))
    }

    pub fn validate(&self) -> CloudResult<()> {
        if self.link_ttl_secs == 0 || self.link_ttl_secs > MAX_LINK_TTL_SECS {
            return Err(CloudError::Config(format!(
                "link_ttl_secs must be within 1..={MAX_LINK_TTL_SECS}, got {}",
                self.link_ttl_secs
            )));
        }
        if self.s3_bucket.trim().is_empty() {
            return Err(CloudError::Config("s3_bucket is empty".into()));
        }
        if self.key_table.is_empty()
            || !self
                .key_table
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_')
        {
            return Err(CloudError::Config(format!(
                "key_table must be a plain identifier, got {:?}",
                self.key_table
            )));
        }
        for (name, url) in [
            ("key_api_base_url", &self.key_api_base_url),
            ("public_base_url", &self.public_base_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(CloudError::Config(format!("{name} must be an http(s) URL")));
            }
        }
        Ok(())
    }
}
