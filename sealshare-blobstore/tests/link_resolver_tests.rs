use sealshare_blobstore::{BlobStoreError, LinkResolver, LinkShape};

#[test]
fn final_segment_takes_last_segment() {
    let resolver = LinkResolver::final_segment();
    let path = resolver
        .resolve("https://h.example/storage/v1/object/sign/uploads/1700000000000-a.pdf?token=x")
        .unwrap();
    assert_eq!(path, "1700000000000-a.pdf");
}

#[test]
fn final_segment_decodes_percent_encoding() {
    let resolver = LinkResolver::final_segment();
    let path = resolver
        .resolve("https://h/object/sign/user1%2F1700000000000-my%20file.txt.encrypted?expires=1")
        .unwrap();
    assert_eq!(path, "user1/1700000000000-my file.txt.encrypted");
}

#[test]
fn final_segment_is_deterministic() {
    let resolver = LinkResolver::final_segment();
    let link = "https://h/object/sign/u%2F1-x.encrypted?token=abc";
    assert_eq!(resolver.resolve(link).unwrap(), resolver.resolve(link).unwrap());
}

#[test]
fn trailing_slash_yields_invalid_link() {
    let err = LinkResolver::final_segment()
        .resolve("https://h/object/sign/")
        .unwrap_err();
    assert!(matches!(err, BlobStoreError::InvalidLink(_)));
}

#[test]
fn host_only_link_is_invalid() {
    assert!(LinkResolver::final_segment().resolve("https://h.example").is_err());
}

#[test]
fn prefix_shape_keeps_nested_path() {
    let resolver = LinkResolver::with_prefix("uploads");
    assert_eq!(resolver.shape(), &LinkShape::Prefix("/uploads/".into()));

    let path = resolver
        .resolve("http://localhost:9000/uploads/user1/1700000000000-a%20b.txt.encrypted?X-Amz-Signature=f")
        .unwrap();
    assert_eq!(path, "user1/1700000000000-a b.txt.encrypted");
}

#[test]
fn root_prefix_takes_whole_path() {
    let resolver = LinkResolver::with_prefix("/");
    let path = resolver
        .resolve("https://uploads.s3.us-east-1.amazonaws.com/user1/5-x.encrypted?X-Amz-Expires=3600")
        .unwrap();
    assert_eq!(path, "user1/5-x.encrypted");
}

#[test]
fn prefix_mismatch_is_invalid() {
    let resolver = LinkResolver::with_prefix("uploads");
    let err = resolver
        .resolve("http://localhost:9000/other-bucket/user1/x")
        .unwrap_err();
    assert!(matches!(err, BlobStoreError::InvalidLink(_)));
}

#[test]
fn fragment_is_ignored() {
    let resolver = LinkResolver::final_segment();
    assert_eq!(resolver.resolve("https://h/a/b%2Fc#frag").unwrap(), "b/c");
}

#[test]
fn scheme_relative_link_resolves() {
    let resolver = LinkResolver::with_prefix("uploads");
    assert_eq!(
        resolver.resolve("//cdn.host/uploads/u/x.encrypted").unwrap(),
        "u/x.encrypted"
    );
}

#[test]
fn bare_path_link_resolves() {
    let resolver = LinkResolver::final_segment();
    assert_eq!(
        resolver.resolve("object/sign/u%2F1-a.encrypted?expires=5").unwrap(),
        "u/1-a.encrypted"
    );
}

#[test]
fn unparseable_link_is_invalid() {
    let err = LinkResolver::final_segment()
        .resolve("http://[::1")
        .unwrap_err();
    assert!(matches!(err, BlobStoreError::InvalidLink(_)));
}
