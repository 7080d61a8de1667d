use super::testing::FakeRegistry;
use super::*;

#[tokio::test]
async fn http_client_ping_delegates_to_client() {
    let mut server = mockito::Server::new_async().await;
    server.mock("GET", "/v2/").with_status(200).create_async().await;

    let registry = HttpRegistryClient::new(&server.url(), None).unwrap();
    registry.ping().await.unwrap();
}

#[tokio::test]
async fn fake_registry_round_trips_manifest_and_tag() {
    let registry = FakeRegistry::new();
    let digest = registry.seed_manifest(
        "alpine",
        "latest",
        "application/vnd.docker.distribution.manifest.v2+json",
        b"{}".to_vec(),
    );

    assert_eq!(registry.catalog().await.unwrap(), vec!["alpine".to_string()]);
    assert_eq!(registry.list_tags("alpine").await.unwrap(), vec!["latest".to_string()]);

    let (payload, media_type, pulled_digest) = registry.pull_manifest("alpine", "latest").await.unwrap();
    assert_eq!(payload, b"{}");
    assert_eq!(
        media_type,
        "application/vnd.docker.distribution.manifest.v2+json"
    );
    assert_eq!(pulled_digest, digest);
    let (existing_digest, exists) = registry.manifest_exists("alpine", "latest").await.unwrap();
    assert!(exists);
    assert_eq!(existing_digest, digest);
}

#[tokio::test]
async fn fake_registry_missing_repository_is_not_found() {
    let registry = FakeRegistry::new();
    let err = registry.list_tags("missing").await.unwrap_err();
    assert!(matches!(err, crate::error::SyncError::NotFound { .. }));
}

#[tokio::test]
async fn fake_registry_push_then_query_blob_round_trips() {
    let registry = FakeRegistry::new();
    let body: BlobStream = Box::pin(futures::stream::once(async {
        Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"layer-bytes"))
    }));
    registry
        .push_blob("alpine", "sha256:abc", 11, body)
        .await
        .unwrap();
    assert!(registry.blob_exists("alpine", "sha256:abc").await.unwrap());
    assert!(registry.has_blob("alpine", "sha256:abc"));
}

#[tokio::test]
async fn fake_registry_unreachable_fails_ping_and_catalog() {
    let registry = FakeRegistry::new();
    registry.set_unreachable(true);
    assert!(registry.ping().await.is_err());
    assert!(registry.catalog().await.is_err());
}

#[tokio::test]
async fn fake_registry_injected_blob_failure_propagates() {
    let registry = FakeRegistry::new();
    registry.fail_blob("sha256:bad");
    let body: BlobStream = Box::pin(futures::stream::once(async {
        Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"x"))
    }));
    let err = registry
        .push_blob("alpine", "sha256:bad", 1, body)
        .await
        .unwrap_err();
    assert!(matches!(err, crate::error::SyncError::Network { .. }));
}
