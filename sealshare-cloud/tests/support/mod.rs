//! Shared test helpers for integration tests against a local MinIO.

#![allow(dead_code)]

use chrono::{Duration, Utc};
use sealshare_cloud::{S3Credentials, S3Transport};
use uuid::Uuid;

pub const MINIO_ENDPOINT: &str = "http://localhost:9000";
pub const MINIO_BUCKET: &str = "sealshare-test";

/// MinIO root credentials. MinIO ignores the session token.
pub fn minio_creds() -> S3Credentials {
    S3Credentials {
        access_key_id: "sealshare-test".into(),
        secret_access_key: "sealshare-test-secret".into(),
        session_token: None,
        expires_at: Some(Utc::now() + Duration::hours(1)),
    }
}

/// Already-expired credentials for negative tests.
pub fn expired_minio_creds() -> S3Credentials {
    S3Credentials {
        expires_at: Some(Utc::now() - Duration::seconds(10)),
        ..minio_creds()
    }
}

/// S3Transport pointing at local MinIO.
pub fn test_transport() -> S3Transport {
    S3Transport::new(
        MINIO_BUCKET.into(),
        "us-east-1".into(),
        Some(MINIO_ENDPOINT.into()),
        minio_creds(),
    )
}

/// Per-test unique owner so runs never collide on storage paths.
pub fn unique_owner() -> String {
    format!("test-{}", Uuid::new_v4())
}
