//! Key custody: the durable `storage_path → KeyRecord` mapping.
//!
//! Records are written in two phases around the blob upload. A record is
//! reserved as `pending` (which also claims the path), the blob goes up,
//! then the record is committed. Pending records are never handed out.

use crate::error::{CloudError, CloudResult};
use crate::types::RetrievalPolicy;
use chrono::Utc;
use sealshare_crypto::EncryptionKey;
use sealshare_storage::{Identity, KeyRecord, KeyStore, RecordStatus, StorageError};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

#[derive(Clone)]
pub struct KeyCustodian {
    store: Arc<dyn KeyStore>,
    policy: RetrievalPolicy,
}

impl KeyCustodian {
    pub fn new(store: Arc<dyn KeyStore>, policy: RetrievalPolicy) -> Self {
        Self { store, policy }
    }

    pub fn policy(&self) -> RetrievalPolicy {
        self.policy
    }

    /// Persists a committed record in one step. Fails on an existing path.
    pub async fn store(
        &self,
        storage_path: &str,
        key: &EncryptionKey,
        owner: &Identity,
        original_name: &str,
        content_type: &str,
    ) -> CloudResult<()> {
        self.reserve(storage_path, key, owner, original_name, content_type)
            .await?;
        self.commit(storage_path).await
    }

    /// Inserts a pending record, claiming `storage_path`.
    pub async fn reserve(
        &self,
        storage_path: &str,
        key: &EncryptionKey,
        owner: &Identity,
        original_name: &str,
        content_type: &str,
    ) -> CloudResult<()> {
        let record = KeyRecord::pending(
            storage_path,
            key.clone(),
            owner.clone(),
            original_name,
            content_type,
        );
        self.store.insert(&record).await?;
        debug!("reserved key record for {storage_path}");
        Ok(())
    }

    pub async fn commit(&self, storage_path: &str) -> CloudResult<()> {
        self.store
            .set_status(storage_path, RecordStatus::Committed)
            .await?;
        debug!("committed key record for {storage_path}");
        Ok(())
    }

    /// Drops a pending reservation. Committed records are left alone.
    pub async fn abandon(&self, storage_path: &str) -> CloudResult<bool> {
        let removed = self.store.delete_pending(storage_path).await?;
        if removed {
            warn!("abandoned pending key record for {storage_path}");
        }
        Ok(removed)
    }

    /// Fetches a committed record under the bearer-link model.
    ///
    /// Under [`RetrievalPolicy::OwnerOnly`] this always fails with
    /// `AccessDenied`; use [`retrieve_for`](Self::retrieve_for).
    pub async fn retrieve(&self, storage_path: &str) -> CloudResult<KeyRecord> {
        self.retrieve_for(storage_path, None).await
    }

    /// Fetches a committed record on behalf of `requester`.
    pub async fn retrieve_for(
        &self,
        storage_path: &str,
        requester: Option<&Identity>,
    ) -> CloudResult<KeyRecord> {
        let record = self.store.select_by_path(storage_path).await?;
        if !record.is_committed() {
            return Err(CloudError::KeyNotFound(storage_path.to_string()));
        }

        if self.policy == RetrievalPolicy::OwnerOnly {
            match requester {
                Some(who) if *who == record.owner_identity => {}
                Some(who) => {
                    return Err(CloudError::AccessDenied(format!(
                        "{who} does not own {storage_path}"
                    )));
                }
                None => {
                    return Err(CloudError::AccessDenied(format!(
                        "{storage_path} requires an owner identity"
                    )));
                }
            }
        }

        Ok(record)
    }

    /// Deletes pending records older than `older_than`. Returns how many went.
    pub async fn reconcile_pending(&self, older_than: Duration) -> CloudResult<usize> {
        let age_ms = i64::try_from(older_than.as_millis())
            .map_err(|_| CloudError::InvalidInput("reconciliation age out of range".into()))?;
        let cutoff = Utc::now().timestamp_millis().saturating_sub(age_ms);
        let removed = self.store.delete_pending_before(cutoff).await?;
        if removed > 0 {
            warn!("reconciliation removed {removed} stale pending key records");
        }
        Ok(removed)
    }

    /// Whether any record (pending or committed) holds `storage_path`.
    pub async fn is_claimed(&self, storage_path: &str) -> CloudResult<bool> {
        match self.store.select_by_path(storage_path).await {
            Ok(_) => Ok(true),
            Err(StorageError::NotFound(_)) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
