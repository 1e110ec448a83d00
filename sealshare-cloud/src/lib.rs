//! Upload and retrieval pipeline for SealShare.
//!
//! Ties the pieces together:
//! - [`TransferManager`] runs the upload and download pipelines
//! - [`KeyCustodian`] owns the two-phase key record lifecycle
//! - [`S3Transport`] stores envelopes in S3 and presigns retrieval links
//! - [`RestKeyStore`] keeps key records in a hosted REST table
//! - Identity providers for "who is uploading"

pub mod config;
pub mod error;
pub mod identity;
pub mod key_api;
pub mod key_custodian;
pub mod s3_transport;
pub mod transfer;
pub mod types;

pub use config::SealShareConfig;
pub use error::{CloudError, CloudResult};
pub use identity::{IdentityProvider, SessionIdentity, StaticIdentity};
pub use key_api::RestKeyStore;
pub use key_custodian::KeyCustodian;
pub use s3_transport::S3Transport;
pub use transfer::TransferManager;
pub use types::*;
