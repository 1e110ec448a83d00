//! Key record storage for SealShare.
//!
//! Persists the per-file key records that make stored blobs decryptable.
//! Records are keyed uniquely by storage path, the same string the blob
//! store uses, and go through a `pending → committed` lifecycle so that an
//! interrupted upload never leaves a live key for a missing blob.

mod error;
mod key_store;
mod record;

pub use error::{StorageError, StorageResult};
pub use key_store::{DuckDbKeyStore, KeyStore};
pub use record::{Identity, KeyRecord, RecordStatus, storage_path};
