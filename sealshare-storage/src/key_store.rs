//! Key record store: the durable `storage_path → KeyRecord` mapping.
//!
//! [`KeyStore`] is the backend contract the key custodian talks to.
//! [`DuckDbKeyStore`] is the local implementation; the cloud crate adds a
//! REST-backed one.

use crate::error::{StorageError, StorageResult};
use crate::record::{Identity, KeyRecord, RecordStatus};
use async_trait::async_trait;
use duckdb::{Connection, params};
use sealshare_crypto::EncryptionKey;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, warn};

/// Backend contract for key record persistence.
///
/// `insert` never overwrites: an existing path yields
/// [`StorageError::Duplicate`].
#[async_trait]
pub trait KeyStore: Send + Sync {
    async fn insert(&self, record: &KeyRecord) -> StorageResult<()>;

    /// Returns the record regardless of status.
    async fn select_by_path(&self, storage_path: &str) -> StorageResult<KeyRecord>;

    async fn set_status(&self, storage_path: &str, status: RecordStatus) -> StorageResult<()>;

    /// Deletes the record only if it is still pending. Returns whether a row was removed.
    async fn delete_pending(&self, storage_path: &str) -> StorageResult<bool>;

    /// Deletes pending records created before `cutoff_ms`. Returns the count removed.
    async fn delete_pending_before(&self, cutoff_ms: i64) -> StorageResult<usize>;
}

/// Key records in a DuckDB table.
#[derive(Clone)]
pub struct DuckDbKeyStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbKeyStore {
    /// Opens or creates a key store at the given path.
    pub fn open(path: &Path) -> StorageResult<Self> {
        let conn = open_key_db(path)?;
        initialize_key_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens an in-memory key store (for testing).
    pub fn open_in_memory() -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_key_schema(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Opens with an existing shared connection.
    pub fn open_with_conn(conn: Arc<Mutex<Connection>>) -> StorageResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            initialize_key_schema(&guard)?;
        }
        Ok(Self { conn })
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::Backend(format!("connection lock poisoned: {e}")))
    }

    fn insert_record(&self, record: &KeyRecord) -> StorageResult<()> {
        if record.storage_path.is_empty() {
            return Err(StorageError::InvalidRecord("empty storage path".into()));
        }

        let conn = self.lock()?;
        // The connection lock makes check-then-insert atomic for this store.
        let exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM key_records WHERE storage_path = ?",
            params![record.storage_path],
            |row| row.get(0),
        )?;
        if exists > 0 {
            return Err(StorageError::Duplicate(record.storage_path.clone()));
        }

        conn.execute(
            r#"
            INSERT INTO key_records (
                storage_path, key_b64, owner_identity,
                original_name, original_content_type,
                status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                record.storage_path,
                record.key.to_base64(),
                record.owner_identity.as_str(),
                record.original_name,
                record.original_content_type,
                record.status.as_str(),
                record.created_at,
            ],
        )?;

        debug!("inserted {} key record for {}", record.status.as_str(), record.storage_path);
        Ok(())
    }

    fn select_record(&self, storage_path: &str) -> StorageResult<KeyRecord> {
        let conn = self.lock()?;
        let result = conn.query_row(
            "SELECT storage_path, key_b64, owner_identity, original_name, original_content_type, status, created_at \
             FROM key_records WHERE storage_path = ?",
            params![storage_path],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, i64>(6)?,
                ))
            },
        );

        match result {
            Ok((path, key_b64, owner, name, content_type, status, created_at)) => {
                drop(conn);
                Ok(KeyRecord {
                    storage_path: path,
                    key: EncryptionKey::from_base64(&key_b64)?,
                    owner_identity: Identity::new(owner),
                    original_name: name,
                    original_content_type: content_type,
                    status: status.parse().map_err(StorageError::InvalidRecord)?,
                    created_at,
                })
            }
            Err(duckdb::Error::QueryReturnedNoRows) => {
                Err(StorageError::NotFound(storage_path.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update_status(&self, storage_path: &str, status: RecordStatus) -> StorageResult<()> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "UPDATE key_records SET status = ? WHERE storage_path = ?",
            params![status.as_str(), storage_path],
        )?;
        if affected == 0 {
            return Err(StorageError::NotFound(storage_path.to_string()));
        }
        Ok(())
    }

    fn remove_pending(&self, storage_path: &str) -> StorageResult<bool> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM key_records WHERE storage_path = ? AND status = 'pending'",
            params![storage_path],
        )?;
        Ok(affected > 0)
    }

    fn remove_pending_before(&self, cutoff_ms: i64) -> StorageResult<usize> {
        let conn = self.lock()?;
        let affected = conn.execute(
            "DELETE FROM key_records WHERE status = 'pending' AND created_at < ?",
            params![cutoff_ms],
        )?;
        Ok(affected)
    }

    /// Number of stored records, any status.
    pub fn count(&self) -> StorageResult<usize> {
        let conn = self.lock()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM key_records", [], |row| row.get(0))?;
        Ok(n as usize)
    }
}

#[async_trait]
impl KeyStore for DuckDbKeyStore {
    async fn insert(&self, record: &KeyRecord) -> StorageResult<()> {
        self.insert_record(record)
    }

    async fn select_by_path(&self, storage_path: &str) -> StorageResult<KeyRecord> {
        self.select_record(storage_path)
    }

    async fn set_status(&self, storage_path: &str, status: RecordStatus) -> StorageResult<()> {
        self.update_status(storage_path, status)
    }

    async fn delete_pending(&self, storage_path: &str) -> StorageResult<bool> {
        self.remove_pending(storage_path)
    }

    async fn delete_pending_before(&self, cutoff_ms: i64) -> StorageResult<usize> {
        self.remove_pending_before(cutoff_ms)
    }
}

fn initialize_key_schema(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS key_records (
            storage_path VARCHAR PRIMARY KEY,
            key_b64 VARCHAR NOT NULL,
            owner_identity VARCHAR NOT NULL,
            original_name VARCHAR NOT NULL,
            original_content_type VARCHAR NOT NULL,
            status VARCHAR NOT NULL DEFAULT 'pending',
            created_at BIGINT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_key_records_status ON key_records(status, created_at);
        "#,
    )?;
    Ok(())
}

/// Opens the key database, removing a stale WAL once if the first open fails.
fn open_key_db(path: &Path) -> StorageResult<Connection> {
    let conn = match Connection::open(path) {
        Ok(c) => c,
        Err(first_err) => {
            let wal = wal_path(path);
            if !wal.exists() || std::fs::remove_file(&wal).is_err() {
                return Err(first_err.into());
            }
            warn!("key database open failed, removed stale WAL {}", wal.display());
            Connection::open(path)?
        }
    };
    conn.execute_batch("PRAGMA memory_limit='64MB'; PRAGMA threads=1;")?;
    Ok(conn)
}

fn wal_path(path: &Path) -> PathBuf {
    match path.extension() {
        Some(ext) => path.with_extension(format!("{}.wal", ext.to_string_lossy())),
        None => path.with_extension("wal"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wal_sits_next_to_database() {
        assert_eq!(
            wal_path(Path::new("/data/keys.duckdb")),
            PathBuf::from("/data/keys.duckdb.wal")
        );
        assert_eq!(wal_path(Path::new("/data/keys")), PathBuf::from("/data/keys.wal"));
    }

    #[test]
    fn key_db_is_resource_limited() {
        let dir = tempfile::tempdir().unwrap();
        let conn = open_key_db(&dir.path().join("keys.duckdb")).unwrap();
        let threads: i64 = conn
            .query_row("SELECT current_setting('threads')", [], |row| row.get(0))
            .unwrap();
        assert_eq!(threads, 1);
    }
}
