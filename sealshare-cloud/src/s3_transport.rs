//! S3 blob store.
//!
//! Envelopes are stored as opaque objects keyed by storage path. Retrieval
//! links are presigned `GetObject` URLs, and downloads by link go through
//! the presigned URL itself so S3 enforces its signature and expiry.
//! Credentials may be short-lived and are swapped in place with
//! [`S3Transport::set_credentials`].

use crate::config::{MAX_LINK_TTL_SECS, SealShareConfig};
use crate::types::S3Credentials;
use async_trait::async_trait;
use aws_sdk_s3::Client as S3Client;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use chrono::{DateTime, NaiveDateTime, Utc};
use reqwest::{StatusCode, Url};
use sealshare_blobstore::{
    BlobStore, BlobStoreError, BlobStoreResult, LinkResolver, SignedLink,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

/// Timestamp format of the `X-Amz-Date` query parameter.
const AMZ_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// S3 transport for encrypted envelopes.
#[derive(Clone)]
pub struct S3Transport {
    bucket: String,
    region: String,
    endpoint_override: Option<String>,
    credentials: Arc<RwLock<S3Credentials>>,
    http: reqwest::Client,
}

impl S3Transport {
    pub fn new(
        bucket: String,
        region: String,
        endpoint_override: Option<String>,
        credentials: S3Credentials,
    ) -> Self {
        Self {
            bucket,
            region,
            endpoint_override,
            credentials: Arc::new(RwLock::new(credentials)),
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &SealShareConfig, credentials: S3Credentials) -> Self {
        Self::new(
            config.s3_bucket.clone(),
            config.s3_region.clone(),
            config.s3_endpoint_override.clone(),
            credentials,
        )
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Replaces the credentials used for subsequent requests.
    pub async fn set_credentials(&self, credentials: S3Credentials) {
        *self.credentials.write().await = credentials;
    }

    /// Builds an S3 client from the current credentials.
    async fn build_client(&self) -> BlobStoreResult<S3Client> {
        let creds = self.credentials.read().await.clone();
        if creds.is_expired() {
            return Err(BlobStoreError::CredentialExpired);
        }

        let credentials = aws_credential_types::Credentials::new(
            &creds.access_key_id,
            &creds.secret_access_key,
            creds.session_token.clone(),
            None,
            "sealshare",
        );

        let mut config_builder = aws_sdk_s3::Config::builder()
            .region(aws_types::region::Region::new(self.region.clone()))
            .credentials_provider(credentials)
            .behavior_version_latest();

        if let Some(ref endpoint) = self.endpoint_override {
            config_builder = config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        Ok(S3Client::from_conf(config_builder.build()))
    }

    /// Checks a presigned link's shape and expiry against `now`, returning
    /// its storage path. The signature itself is checked by S3 on fetch.
    pub fn authorize_link_at(&self, link: &str, now: DateTime<Utc>) -> BlobStoreResult<String> {
        let storage_path = self.link_resolver().resolve(link)?;
        let url = Url::parse(link).map_err(|e| BlobStoreError::InvalidLink(e.to_string()))?;

        let mut signed_at = None;
        let mut expires_in = None;
        let mut signature = None;
        for (k, v) in url.query_pairs() {
            match k.as_ref() {
                "X-Amz-Date" => {
                    signed_at = NaiveDateTime::parse_from_str(&v, AMZ_DATE_FORMAT)
                        .ok()
                        .map(|t| t.and_utc())
                }
                "X-Amz-Expires" => expires_in = v.parse::<i64>().ok(),
                "X-Amz-Signature" => signature = Some(v.into_owned()),
                _ => {}
            }
        }

        if signature.as_deref().is_none_or(str::is_empty) {
            return Err(BlobStoreError::InvalidSignature);
        }
        let signed_at = signed_at
            .ok_or_else(|| BlobStoreError::InvalidLink("missing or bad X-Amz-Date".into()))?;
        let expires_at = expires_in
            .and_then(chrono::Duration::try_seconds)
            .and_then(|ttl| signed_at.checked_add_signed(ttl))
            .ok_or_else(|| BlobStoreError::InvalidLink("missing or bad X-Amz-Expires".into()))?;

        if now >= expires_at {
            return Err(BlobStoreError::LinkExpired);
        }
        Ok(storage_path)
    }

    /// Checks if an object exists (HEAD request).
    pub async fn exists(&self, storage_path: &str) -> BlobStoreResult<bool> {
        let client = self.build_client().await?;

        match client
            .head_object()
            .bucket(&self.bucket)
            .key(storage_path)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(BlobStoreError::Storage(format!(
                        "head object failed for {storage_path}: {service_err}"
                    )))
                }
            }
        }
    }
}

#[async_trait]
impl BlobStore for S3Transport {
    async fn upload(&self, storage_path: &str, bytes: Vec<u8>) -> BlobStoreResult<()> {
        let client = self.build_client().await?;
        let size = bytes.len();

        client
            .put_object()
            .bucket(&self.bucket)
            .key(storage_path)
            .content_type("application/octet-stream")
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| BlobStoreError::UploadFailed {
                path: storage_path.to_string(),
                reason: e.into_service_error().to_string(),
            })?;

        debug!("uploaded {size} bytes to s3://{}/{storage_path}", self.bucket);
        Ok(())
    }

    async fn download(&self, storage_path: &str) -> BlobStoreResult<Vec<u8>> {
        let client = self.build_client().await?;

        let resp = client
            .get_object()
            .bucket(&self.bucket)
            .key(storage_path)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    BlobStoreError::NotFound(storage_path.to_string())
                } else {
                    BlobStoreError::DownloadFailed {
                        path: storage_path.to_string(),
                        reason: service_err.to_string(),
                    }
                }
            })?;

        let body = resp
            .body
            .collect()
            .await
            .map_err(|e| BlobStoreError::DownloadFailed {
                path: storage_path.to_string(),
                reason: format!("failed to read body: {e}"),
            })?;

        let bytes = body.into_bytes().to_vec();
        debug!(
            "downloaded {} bytes from s3://{}/{storage_path}",
            bytes.len(),
            self.bucket
        );
        Ok(bytes)
    }

    async fn create_signed_link(
        &self,
        storage_path: &str,
        ttl_secs: u64,
    ) -> BlobStoreResult<SignedLink> {
        let link_error = |reason: String| BlobStoreError::LinkGenerationFailed {
            path: storage_path.to_string(),
            reason,
        };

        if ttl_secs == 0 || ttl_secs > MAX_LINK_TTL_SECS {
            return Err(link_error(format!(
                "ttl must be within 1..={MAX_LINK_TTL_SECS} seconds, got {ttl_secs}"
            )));
        }

        let client = self.build_client().await?;
        let presigning = PresigningConfig::expires_in(Duration::from_secs(ttl_secs))
            .map_err(|e| link_error(e.to_string()))?;

        let presigned = client
            .get_object()
            .bucket(&self.bucket)
            .key(storage_path)
            .presigned(presigning)
            .await
            .map_err(|e| link_error(e.to_string()))?;

        let expires_at = chrono::Duration::try_seconds(ttl_secs as i64)
            .and_then(|ttl| Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| link_error("expiry out of range".into()))?;

        debug!("presigned s3://{}/{storage_path} for {ttl_secs}s", self.bucket);
        Ok(SignedLink {
            url: presigned.uri().to_string(),
            expires_at,
        })
    }

    fn authorize_link(&self, link: &str) -> BlobStoreResult<String> {
        self.authorize_link_at(link, Utc::now())
    }

    async fn download_link(&self, link: &str) -> BlobStoreResult<Vec<u8>> {
        let storage_path = self.authorize_link(link)?;
        let fail = |reason: String| BlobStoreError::DownloadFailed {
            path: storage_path.clone(),
            reason,
        };

        let resp = self
            .http
            .get(link)
            .send()
            .await
            .map_err(|e| fail(e.to_string()))?;

        match resp.status() {
            status if status.is_success() => {}
            StatusCode::NOT_FOUND => return Err(BlobStoreError::NotFound(storage_path.clone())),
            StatusCode::FORBIDDEN => {
                let body = resp.text().await.unwrap_or_default();
                return Err(if body.contains("expired") {
                    BlobStoreError::LinkExpired
                } else {
                    BlobStoreError::InvalidSignature
                });
            }
            status => return Err(fail(format!("presigned GET returned {status}"))),
        }

        let bytes = resp.bytes().await.map_err(|e| fail(e.to_string()))?.to_vec();
        debug!("downloaded {} bytes via presigned link for {storage_path}", bytes.len());
        Ok(bytes)
    }

    /// Path-style URLs (custom endpoints) carry the bucket as the first
    /// segment; virtual-hosted URLs put it in the host.
    fn link_resolver(&self) -> LinkResolver {
        if self.endpoint_override.is_some() {
            LinkResolver::with_prefix(&self.bucket)
        } else {
            LinkResolver::with_prefix("/")
        }
    }
}
