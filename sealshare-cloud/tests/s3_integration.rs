//! Integration tests for S3Transport against a real MinIO.
//!
//! Requires MinIO on localhost:9000 with bucket `sealshare-test`; run with
//! `cargo test -- --ignored`.

mod support;

use pretty_assertions::assert_eq;
use sealshare_blobstore::{BlobStore, BlobStoreError};
use sealshare_cloud::{CloudError, KeyCustodian, RetrievalPolicy, S3Transport, TransferManager};
use sealshare_crypto::PlaintextFile;
use sealshare_storage::{DuckDbKeyStore, Identity};
use serial_test::serial;
use std::sync::Arc;

#[tokio::test]
#[serial]
#[ignore = "requires MinIO"]
async fn upload_download_roundtrip() {
    let transport = support::test_transport();
    let path = format!("{}/1-roundtrip.bin.encrypted", support::unique_owner());

    let payload = b"hello integration test";
    transport.upload(&path, payload.to_vec()).await.unwrap();

    let downloaded = transport.download(&path).await.unwrap();
    assert_eq!(downloaded, payload.to_vec());
}

#[tokio::test]
#[serial]
#[ignore = "requires MinIO"]
async fn exists_returns_true_after_upload_false_for_missing() {
    let transport = support::test_transport();
    let path = format!("{}/1-exists.bin.encrypted", support::unique_owner());

    assert!(!transport.exists(&path).await.unwrap());
    transport.upload(&path, b"data".to_vec()).await.unwrap();
    assert!(transport.exists(&path).await.unwrap());
}

#[tokio::test]
#[serial]
#[ignore = "requires MinIO"]
async fn missing_object_is_not_found() {
    let transport = support::test_transport();
    let path = format!("{}/1-never.bin.encrypted", support::unique_owner());

    let err = transport.download(&path).await.unwrap_err();
    assert!(matches!(err, BlobStoreError::NotFound(_)));
}

#[tokio::test]
#[serial]
#[ignore = "requires MinIO"]
async fn presigned_link_resolves_to_storage_path() {
    let transport = support::test_transport();
    let path = format!("{}/1700000000000-my file.txt.encrypted", support::unique_owner());
    transport.upload(&path, b"x".to_vec()).await.unwrap();

    let link = transport.create_signed_link(&path, 600).await.unwrap();
    assert!(link.url.starts_with(support::MINIO_ENDPOINT));
    assert_eq!(transport.link_resolver().resolve(&link.url).unwrap(), path);
}

#[tokio::test]
#[serial]
#[ignore = "requires MinIO"]
async fn full_pipeline_over_s3() {
    let keys = DuckDbKeyStore::open_in_memory().unwrap();
    let custodian = KeyCustodian::new(Arc::new(keys), RetrievalPolicy::BearerLink);
    let manager = TransferManager::new(Arc::new(support::test_transport()), custodian, 600);
    let owner = Identity::new(support::unique_owner());

    let file = PlaintextFile::new(b"hello".to_vec(), "text/plain", "hello.txt");
    let link = manager.upload(&file, &owner).await.unwrap();

    let back = manager.download(&link.url, None).await.unwrap();
    assert_eq!(back, file);

    let mut forged = link.url.clone();
    let sig = forged.find("X-Amz-Signature=").unwrap() + "X-Amz-Signature=".len();
    let swapped = if &forged[sig..sig + 1] == "0" { "1" } else { "0" };
    forged.replace_range(sig..sig + 1, swapped);
    let err = manager.download(&forged, None).await.unwrap_err();
    assert!(matches!(err, CloudError::InvalidLink(_)));
}

#[tokio::test]
#[serial]
#[ignore = "requires MinIO"]
async fn replaced_credentials_take_effect() {
    let transport = S3Transport::new(
        support::MINIO_BUCKET.into(),
        "us-east-1".into(),
        Some(support::MINIO_ENDPOINT.into()),
        support::expired_minio_creds(),
    );
    let path = format!("{}/1-creds.bin.encrypted", support::unique_owner());

    let err = transport.upload(&path, b"x".to_vec()).await.unwrap_err();
    assert!(matches!(err, BlobStoreError::CredentialExpired));

    transport.set_credentials(support::minio_creds()).await;
    transport.upload(&path, b"x".to_vec()).await.unwrap();
}

// --- no network needed ---

#[tokio::test]
async fn expired_credentials_rejected_before_any_request() {
    let transport = S3Transport::new(
        "unused".into(),
        "us-east-1".into(),
        Some("http://127.0.0.1:1".into()),
        support::expired_minio_creds(),
    );

    let err = transport.download("a/1-b.encrypted").await.unwrap_err();
    assert!(matches!(err, BlobStoreError::CredentialExpired));
    assert!(matches!(CloudError::from(err), CloudError::CredentialExpired));
}

#[tokio::test]
async fn out_of_range_ttl_is_link_generation_failure() {
    let transport = support::test_transport();

    let err = transport.create_signed_link("a/1-b.encrypted", 0).await.unwrap_err();
    assert!(matches!(err, BlobStoreError::LinkGenerationFailed { .. }));

    let err = transport
        .create_signed_link("a/1-b.encrypted", 7 * 24 * 60 * 60 + 1)
        .await
        .unwrap_err();
    assert!(matches!(err, BlobStoreError::LinkGenerationFailed { .. }));
}

#[tokio::test]
async fn presigned_link_authorizes_until_expiry() {
    let transport = support::test_transport();
    let path = "u1/1700000000000-a b.txt.encrypted";

    let link = transport.create_signed_link(path, 600).await.unwrap();
    assert_eq!(transport.authorize_link(&link.url).unwrap(), path);

    let later = chrono::Utc::now() + chrono::Duration::seconds(601);
    assert!(matches!(
        transport.authorize_link_at(&link.url, later),
        Err(BlobStoreError::LinkExpired)
    ));
}

#[test]
fn stale_or_unsigned_presigned_links_are_rejected() {
    let transport = support::test_transport();
    let base = format!(
        "{}/{}/u1/1-a.txt.encrypted",
        support::MINIO_ENDPOINT,
        support::MINIO_BUCKET
    );

    let unsigned = format!("{base}?X-Amz-Date=20991231T000000Z&X-Amz-Expires=60");
    assert!(matches!(
        transport.authorize_link(&unsigned),
        Err(BlobStoreError::InvalidSignature)
    ));

    let stale = format!("{base}?X-Amz-Date=20200101T000000Z&X-Amz-Expires=60&X-Amz-Signature=ab12");
    assert!(matches!(
        transport.authorize_link(&stale),
        Err(BlobStoreError::LinkExpired)
    ));

    let undated = format!("{base}?X-Amz-Expires=60&X-Amz-Signature=ab12");
    assert!(matches!(
        transport.authorize_link(&undated),
        Err(BlobStoreError::InvalidLink(_))
    ));
}

#[test]
fn resolver_matches_addressing_style() {
    let path_style = support::test_transport();
    assert_eq!(
        path_style
            .link_resolver()
            .resolve("http://localhost:9000/sealshare-test/u1/1-a%20b.txt.encrypted?X-Amz-Signature=abc")
            .unwrap(),
        "u1/1-a b.txt.encrypted"
    );

    let virtual_hosted = S3Transport::new(
        "uploads".into(),
        "us-east-1".into(),
        None,
        support::minio_creds(),
    );
    assert_eq!(
        virtual_hosted
            .link_resolver()
            .resolve("https://uploads.s3.us-east-1.amazonaws.com/u1/1-a.txt.encrypted?X-Amz-Expires=60")
            .unwrap(),
        "u1/1-a.txt.encrypted"
    );
}
