//! Blob storage for encrypted file envelopes.
//!
//! The [`BlobStore`] trait is the contract the transfer pipeline uploads to
//! and downloads from. Blobs are stored opaquely: the store never sees keys
//! or plaintext. [`LocalBlobStore`] keeps blobs in DuckDB and issues its own
//! signed links; the cloud crate provides an S3 implementation.

mod error;
pub mod link;
mod local;

pub use error::{BlobStoreError, BlobStoreResult};
pub use link::{LinkResolver, LinkShape};
pub use local::{BlobMetadata, LocalBlobStore};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

/// A time-limited retrieval link.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SignedLink {
    pub url: String,
    pub expires_at: DateTime<Utc>,
}

/// Opaque blob storage addressed by storage path.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Persists `bytes` under `storage_path`.
    async fn upload(&self, storage_path: &str, bytes: Vec<u8>) -> BlobStoreResult<()>;

    async fn download(&self, storage_path: &str) -> BlobStoreResult<Vec<u8>>;

    /// Issues a link granting read access for `ttl_secs` seconds.
    async fn create_signed_link(
        &self,
        storage_path: &str,
        ttl_secs: u64,
    ) -> BlobStoreResult<SignedLink>;

    /// Checks that `link` was issued by this store and is still valid,
    /// returning the storage path it grants.
    fn authorize_link(&self, link: &str) -> BlobStoreResult<String>;

    /// Fetches the blob a link grants, after [`authorize_link`](Self::authorize_link).
    async fn download_link(&self, link: &str) -> BlobStoreResult<Vec<u8>> {
        let storage_path = self.authorize_link(link)?;
        self.download(&storage_path).await
    }

    /// Resolver matching the shape of links this store issues.
    fn link_resolver(&self) -> LinkResolver;
}
