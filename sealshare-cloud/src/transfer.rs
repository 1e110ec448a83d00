//! Upload and download pipelines.
//!
//! Upload: encrypt → reserve key record → upload envelope → commit → sign link.
//! Download: authorize link → fetch envelope → retrieve key record → decrypt.
//!
//! The per-file key lives only inside one pipeline run and in the key store.

use crate::config::SealShareConfig;
use crate::error::{CloudError, CloudResult};
use crate::identity::IdentityProvider;
use crate::key_custodian::KeyCustodian;
use crate::types::ShareLink;
use chrono::Utc;
use sealshare_blobstore::BlobStore;
use sealshare_crypto::{PlaintextFile, decrypt_file, encrypt};
use sealshare_storage::{Identity, KeyStore, storage_path};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct TransferManager {
    blobs: Arc<dyn BlobStore>,
    custodian: KeyCustodian,
    link_ttl_secs: u64,
    pending_grace: Duration,
}

impl TransferManager {
    pub fn new(blobs: Arc<dyn BlobStore>, custodian: KeyCustodian, link_ttl_secs: u64) -> Self {
        Self {
            blobs,
            custodian,
            link_ttl_secs,
            pending_grace: Duration::from_secs(SealShareConfig::default().pending_grace_secs),
        }
    }

    /// Sets how old a pending reservation must be before [`reconcile`](Self::reconcile) removes it.
    pub fn with_pending_grace(mut self, grace: Duration) -> Self {
        self.pending_grace = grace;
        self
    }

    /// Wires a manager from config. The config is validated first.
    pub fn from_config(
        config: &SealShareConfig,
        blobs: Arc<dyn BlobStore>,
        keys: Arc<dyn KeyStore>,
    ) -> CloudResult<Self> {
        config.validate()?;
        Ok(Self::new(
            blobs,
            KeyCustodian::new(keys, config.retrieval_policy),
            config.link_ttl_secs,
        )
        .with_pending_grace(Duration::from_secs(config.pending_grace_secs)))
    }

    pub fn custodian(&self) -> &KeyCustodian {
        &self.custodian
    }

    pub fn link_ttl_secs(&self) -> u64 {
        self.link_ttl_secs
    }

    pub fn pending_grace(&self) -> Duration {
        self.pending_grace
    }

    /// Removes reservations left pending longer than the grace period,
    /// i.e. uploads that died between reservation and commit.
    pub async fn reconcile(&self) -> CloudResult<usize> {
        self.custodian.reconcile_pending(self.pending_grace).await
    }

    /// Encrypts and stores `file` for `owner`, returning a retrieval link.
    pub async fn upload(&self, file: &PlaintextFile, owner: &Identity) -> CloudResult<ShareLink> {
        self.upload_at(file, owner, Utc::now().timestamp_millis())
            .await
    }

    /// Uploads as whoever `provider` reports is signed in.
    pub async fn upload_current(
        &self,
        file: &PlaintextFile,
        provider: &dyn IdentityProvider,
    ) -> CloudResult<ShareLink> {
        let owner = provider
            .current_identity()
            .await
            .ok_or(CloudError::AuthRequired)?;
        self.upload(file, &owner).await
    }

    /// [`upload`](Self::upload) with an explicit upload timestamp (unix ms).
    pub async fn upload_at(
        &self,
        file: &PlaintextFile,
        owner: &Identity,
        uploaded_at_ms: i64,
    ) -> CloudResult<ShareLink> {
        if file.name.trim().is_empty() {
            return Err(CloudError::InvalidInput("file name is empty".into()));
        }
        if owner.is_empty() {
            return Err(CloudError::InvalidInput("owner identity is empty".into()));
        }

        let path = storage_path(owner, uploaded_at_ms, &file.name);
        let encrypted = encrypt(file)?;
        let envelope_len = encrypted.envelope.len();

        self.custodian
            .reserve(
                &path,
                &encrypted.key,
                owner,
                &file.name,
                &file.content_type,
            )
            .await?;

        debug!("uploading {envelope_len} byte envelope to {path}");
        if let Err(e) = self
            .blobs
            .upload(&path, encrypted.envelope.into_bytes())
            .await
        {
            warn!("upload of {path} failed, rolling back key reservation: {e}");
            if let Err(rollback) = self.custodian.abandon(&path).await {
                warn!("rollback of {path} failed, left for reconciliation: {rollback}");
            }
            return Err(e.into());
        }

        self.custodian.commit(&path).await?;

        let link = self.link_for(&path).await?;
        info!(
            "uploaded {} ({} bytes) as {path}",
            file.name,
            file.bytes.len()
        );
        Ok(link)
    }

    /// Issues a fresh retrieval link for an already stored file.
    pub async fn link_for(&self, storage_path: &str) -> CloudResult<ShareLink> {
        let signed = self
            .blobs
            .create_signed_link(storage_path, self.link_ttl_secs)
            .await?;
        Ok(ShareLink {
            url: signed.url,
            storage_path: storage_path.to_string(),
            expires_at: signed.expires_at,
        })
    }

    /// Maps a retrieval link back to its storage path.
    pub fn resolve(&self, link: &str) -> CloudResult<String> {
        Ok(self.blobs.link_resolver().resolve(link)?)
    }

    /// Fetches and decrypts the file behind `link`.
    ///
    /// The link must be one the blob store issued and must not have
    /// expired. `requester` only matters under the owner-only retrieval
    /// policy.
    pub async fn download(
        &self,
        link: &str,
        requester: Option<&Identity>,
    ) -> CloudResult<PlaintextFile> {
        let path = self.blobs.authorize_link(link)?;
        let envelope = self.blobs.download_link(link).await?;
        debug!("fetched {} byte envelope via link for {path}", envelope.len());
        self.open_envelope(&path, &envelope, requester).await
    }

    /// Fetches and decrypts the file stored at `storage_path`, bypassing
    /// link checks.
    pub async fn download_path(
        &self,
        storage_path: &str,
        requester: Option<&Identity>,
    ) -> CloudResult<PlaintextFile> {
        let envelope = self.blobs.download(storage_path).await?;
        debug!("fetched {} byte envelope from {storage_path}", envelope.len());
        self.open_envelope(storage_path, &envelope, requester).await
    }

    async fn open_envelope(
        &self,
        storage_path: &str,
        envelope: &[u8],
        requester: Option<&Identity>,
    ) -> CloudResult<PlaintextFile> {
        let record = self
            .custodian
            .retrieve_for(storage_path, requester)
            .await?;

        let file = decrypt_file(
            envelope,
            &record.key,
            &record.original_content_type,
            &record.original_name,
        )?;
        debug!("decrypted {storage_path} ({} bytes)", file.bytes.len());
        Ok(file)
    }
}
