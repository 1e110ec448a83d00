//! DuckDB-backed blob store with self-verifying signed links.
//!
//! Links look like
//! `{base_url}/object/sign/{percent-encoded path}?expires={unix}&token={hex}`
//! where `token` is a BLAKE3 keyed hash of `path \n expires` under the
//! store's signing secret. The whole storage path (slashes included) is one
//! encoded segment, so [`LinkResolver::final_segment`] recovers it.

use crate::error::{BlobStoreError, BlobStoreResult};
use crate::link::{LinkResolver, parse_link};
use crate::{BlobStore, SignedLink};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use duckdb::{Connection, params};
use sealshare_crypto::EncryptionKey;
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::debug;

/// Route segment preceding the encoded storage path in issued links.
const SIGN_ROUTE: &str = "object/sign";

#[derive(Debug, Clone, Serialize)]
pub struct BlobMetadata {
    pub storage_path: String,
    pub size: i64,
    /// Hex SHA-256 of the stored (encrypted) bytes.
    pub content_hash: String,
    pub created_at: i64,
}

pub struct LocalBlobStore {
    conn: Arc<Mutex<Connection>>,
    base_url: String,
    signing_key: EncryptionKey,
}

impl LocalBlobStore {
    /// Open a blob store backed by a DuckDB file, with a fresh signing secret.
    ///
    /// Links issued before a restart stop verifying; use
    /// [`Self::open_with_signing_key`] to keep them valid.
    pub fn open(db_path: &Path, base_url: &str) -> BlobStoreResult<Self> {
        let signing_key = EncryptionKey::generate()
            .map_err(|e| BlobStoreError::Storage(format!("signing key generation failed: {e}")))?;
        Self::open_with_signing_key(db_path, base_url, signing_key)
    }

    pub fn open_with_signing_key(
        db_path: &Path,
        base_url: &str,
        signing_key: EncryptionKey,
    ) -> BlobStoreResult<Self> {
        let conn = if db_path.to_str() == Some(":memory:") {
            Connection::open_in_memory()
        } else {
            Connection::open(db_path)
        }?;

        // Cap memory/threads: DuckDB defaults to ~80% RAM per connection
        if db_path.to_str() != Some(":memory:") {
            conn.execute_batch("PRAGMA memory_limit='128MB'; PRAGMA threads=1;")?;
        }

        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
            base_url: base_url.trim_end_matches('/').to_string(),
            signing_key,
        };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Open in-memory with a fresh signing secret.
    pub fn open_in_memory(base_url: &str) -> BlobStoreResult<Self> {
        Self::open(Path::new(":memory:"), base_url)
    }

    fn lock(&self) -> BlobStoreResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| BlobStoreError::Storage(e.to_string()))
    }

    fn ensure_tables(&self) -> BlobStoreResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS blobs (
                storage_path VARCHAR PRIMARY KEY,
                data BLOB NOT NULL,
                size BIGINT NOT NULL DEFAULT 0,
                content_hash VARCHAR NOT NULL,
                created_at BIGINT NOT NULL
            );",
        )?;
        Ok(())
    }

    fn sign(&self, storage_path: &str, expires: i64) -> blake3::Hash {
        let message = format!("{storage_path}\n{expires}");
        blake3::keyed_hash(self.signing_key.as_bytes(), message.as_bytes())
    }

    /// Checks a link's signature and expiry against `now`, returning its storage path.
    pub fn verify_link_at(&self, link: &str, now: DateTime<Utc>) -> BlobStoreResult<String> {
        let storage_path = self.link_resolver().resolve(link)?;

        let url = parse_link(link)?;
        let mut expires = None;
        let mut token = None;
        for (k, v) in url.query_pairs() {
            match k.as_ref() {
                "expires" => expires = v.parse::<i64>().ok(),
                "token" => token = Some(v.into_owned()),
                _ => {}
            }
        }
        let expires = expires
            .ok_or_else(|| BlobStoreError::InvalidLink("missing or bad expires".into()))?;
        let token = token.ok_or_else(|| BlobStoreError::InvalidLink("missing token".into()))?;

        let presented =
            blake3::Hash::from_hex(&token).map_err(|_| BlobStoreError::InvalidSignature)?;
        // blake3::Hash equality is constant-time.
        if presented != self.sign(&storage_path, expires) {
            return Err(BlobStoreError::InvalidSignature);
        }
        if now.timestamp() >= expires {
            return Err(BlobStoreError::LinkExpired);
        }
        Ok(storage_path)
    }

    pub fn verify_link(&self, link: &str) -> BlobStoreResult<String> {
        self.verify_link_at(link, Utc::now())
    }

    pub fn metadata(&self, storage_path: &str) -> BlobStoreResult<BlobMetadata> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT storage_path, size, content_hash, created_at FROM blobs WHERE storage_path = ?",
            params![storage_path],
            |row| {
                Ok(BlobMetadata {
                    storage_path: row.get(0)?,
                    size: row.get(1)?,
                    content_hash: row.get(2)?,
                    created_at: row.get(3)?,
                })
            },
        )
        .map_err(|e| match e {
            duckdb::Error::QueryReturnedNoRows => BlobStoreError::NotFound(storage_path.to_string()),
            other => other.into(),
        })
    }

    fn exists(conn: &Connection, storage_path: &str) -> BlobStoreResult<bool> {
        let n: i64 = conn.query_row(
            "SELECT COUNT(*) FROM blobs WHERE storage_path = ?",
            params![storage_path],
            |row| row.get(0),
        )?;
        Ok(n > 0)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn upload(&self, storage_path: &str, bytes: Vec<u8>) -> BlobStoreResult<()> {
        let fail = |reason: &str| BlobStoreError::UploadFailed {
            path: storage_path.to_string(),
            reason: reason.to_string(),
        };
        if storage_path.is_empty() {
            return Err(fail("empty storage path"));
        }

        let content_hash = hex::encode(Sha256::digest(&bytes));
        let size = bytes.len();
        let now = Utc::now().timestamp_millis();

        let conn = self.lock()?;
        if Self::exists(&conn, storage_path)? {
            return Err(fail("a blob already exists at this path"));
        }
        conn.execute(
            "INSERT INTO blobs (storage_path, data, size, content_hash, created_at) VALUES (?, ?, ?, ?, ?)",
            params![storage_path, bytes, size as i64, content_hash, now],
        )
        .map_err(|e| fail(&e.to_string()))?;

        debug!("stored {size} bytes at {storage_path}");
        Ok(())
    }

    async fn download(&self, storage_path: &str) -> BlobStoreResult<Vec<u8>> {
        let conn = self.lock()?;
        let data: Vec<u8> = conn
            .query_row(
                "SELECT data FROM blobs WHERE storage_path = ?",
                params![storage_path],
                |row| row.get(0),
            )
            .map_err(|e| match e {
                duckdb::Error::QueryReturnedNoRows => {
                    BlobStoreError::NotFound(storage_path.to_string())
                }
                other => BlobStoreError::DownloadFailed {
                    path: storage_path.to_string(),
                    reason: other.to_string(),
                },
            })?;

        debug!("read {} bytes from {storage_path}", data.len());
        Ok(data)
    }

    async fn create_signed_link(
        &self,
        storage_path: &str,
        ttl_secs: u64,
    ) -> BlobStoreResult<SignedLink> {
        let fail = |reason: &str| BlobStoreError::LinkGenerationFailed {
            path: storage_path.to_string(),
            reason: reason.to_string(),
        };
        if ttl_secs == 0 {
            return Err(fail("ttl must be positive"));
        }
        let ttl = i64::try_from(ttl_secs).map_err(|_| fail("ttl out of range"))?;

        {
            let conn = self.lock()?;
            if !Self::exists(&conn, storage_path)? {
                return Err(fail("no blob at this path"));
            }
        }

        let expires_at = Duration::try_seconds(ttl)
            .and_then(|d| Utc::now().checked_add_signed(d))
            .ok_or_else(|| fail("ttl out of range"))?;
        let expires = expires_at.timestamp();
        let token = self.sign(storage_path, expires);

        let url = format!(
            "{}/{SIGN_ROUTE}/{}?expires={expires}&token={}",
            self.base_url,
            urlencoding::encode(storage_path),
            token.to_hex()
        );
        Ok(SignedLink { url, expires_at })
    }

    fn authorize_link(&self, link: &str) -> BlobStoreResult<String> {
        self.verify_link(link)
    }

    fn link_resolver(&self) -> LinkResolver {
        LinkResolver::final_segment()
    }
}
