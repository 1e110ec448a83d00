use sealshare_blobstore::BlobStoreError;
use sealshare_cloud::CloudError;
use sealshare_crypto::CryptoError;
use sealshare_storage::StorageError;

#[test]
fn credential_expired_display() {
    let err = CloudError::CredentialExpired;
    assert_eq!(err.to_string(), "storage credentials expired or invalid");
}

#[test]
fn key_not_found_display() {
    let err = CloudError::KeyNotFound("user1/1-a.txt.encrypted".into());
    assert_eq!(err.to_string(), "no key record for user1/1-a.txt.encrypted");
}

#[test]
fn malformed_envelope_display() {
    let err = CloudError::MalformedEnvelope(11);
    assert_eq!(err.to_string(), "malformed envelope (11 bytes)");
}

#[test]
fn auth_required_display() {
    assert_eq!(CloudError::AuthRequired.to_string(), "authentication required");
}

#[test]
fn crypto_errors_keep_their_kind() {
    assert!(matches!(
        CloudError::from(CryptoError::AuthenticationFailed),
        CloudError::AuthenticationFailed
    ));
    assert!(matches!(
        CloudError::from(CryptoError::MalformedEnvelope { len: 5, min: 12 }),
        CloudError::MalformedEnvelope(5)
    ));
    assert!(matches!(
        CloudError::from(CryptoError::CryptoUnavailable("no rng".into())),
        CloudError::CryptoUnavailable(_)
    ));
}

#[test]
fn bad_stored_key_is_a_persistence_error() {
    let err = CloudError::from(CryptoError::InvalidKeyLength {
        expected: 32,
        actual: 16,
    });
    assert!(matches!(err, CloudError::KeyPersistence(_)));
}

#[test]
fn storage_duplicate_maps_to_duplicate_path() {
    let err = CloudError::from(StorageError::Duplicate("p".into()));
    assert!(matches!(err, CloudError::DuplicatePath(p) if p == "p"));
}

#[test]
fn storage_not_found_maps_to_key_not_found() {
    let err = CloudError::from(StorageError::NotFound("p".into()));
    assert!(matches!(err, CloudError::KeyNotFound(p) if p == "p"));
}

#[test]
fn other_storage_errors_are_persistence_failures() {
    let err = CloudError::from(StorageError::Backend("connection reset".into()));
    assert!(matches!(err, CloudError::KeyPersistence(msg) if msg.contains("connection reset")));
}

#[test]
fn blob_errors_map_per_stage() {
    assert!(matches!(
        CloudError::from(BlobStoreError::UploadFailed {
            path: "p".into(),
            reason: "disk full".into()
        }),
        CloudError::UploadFailed(_)
    ));
    assert!(matches!(
        CloudError::from(BlobStoreError::LinkGenerationFailed {
            path: "p".into(),
            reason: "bad ttl".into()
        }),
        CloudError::LinkGenerationFailed(_)
    ));
    assert!(matches!(
        CloudError::from(BlobStoreError::NotFound("p".into())),
        CloudError::DownloadFailed(_)
    ));
    assert!(matches!(
        CloudError::from(BlobStoreError::LinkExpired),
        CloudError::InvalidLink(_)
    ));
    assert!(matches!(
        CloudError::from(BlobStoreError::InvalidSignature),
        CloudError::InvalidLink(_)
    ));
    assert!(matches!(
        CloudError::from(BlobStoreError::CredentialExpired),
        CloudError::CredentialExpired
    ));
}

#[test]
fn error_is_debug() {
    let err = CloudError::AccessDenied("user2 does not own x".into());
    let debug = format!("{err:?}");
    assert!(debug.contains("AccessDenied"));
}
