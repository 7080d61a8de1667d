use super::*;
use futures::StreamExt;

#[test]
fn new_with_valid_url() {
    assert!(Client::new("http://localhost:5000", None).is_ok());
}

#[test]
fn new_with_https_url() {
    assert!(Client::new("https://registry.example.com", None).is_ok());
}

#[test]
fn normalizes_url_without_scheme() {
    let client = Client::new("localhost:5000", None).unwrap();
    assert_eq!(client.registry_url(), "http://localhost:5000");
}

#[test]
fn removes_trailing_slashes() {
    let client = Client::new("http://localhost:5000///", None).unwrap();
    assert_eq!(client.registry_url(), "http://localhost:5000");
}

#[test]
fn empty_url_fails() {
    let err = Client::new("", None).unwrap_err();
    assert!(matches!(err, SyncError::Validation { .. }));
}

#[test]
fn whitespace_url_fails() {
    assert!(Client::new("   ", None).is_err());
}

#[test]
fn client_config_builder() {
    let config = ClientConfig::new().with_timeout(60).with_max_idle_per_host(20);
    assert_eq!(config.timeout_seconds, 60);
    assert_eq!(config.max_idle_per_host, 20);
}

#[test]
fn client_with_custom_config() {
    let config = ClientConfig::new().with_timeout(60);
    let client = Client::with_config("http://localhost:5000", config, None).unwrap();
    assert_eq!(client.registry_url(), "http://localhost:5000");
}

#[test]
fn extract_next_link_double_quotes() {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::LINK,
        reqwest::header::HeaderValue::from_static(r#"</v2/_catalog?n=100&last=repo99>; rel="next""#),
    );
    assert_eq!(
        Client::extract_next_link(&headers),
        Some("/v2/_catalog?n=100&last=repo99".to_string())
    );
}

#[test]
fn extract_next_link_none() {
    let headers = reqwest::header::HeaderMap::new();
    assert_eq!(Client::extract_next_link(&headers), None);
}

#[test]
fn catalog_response_deserialization() {
    let json = r#"{"repositories":["alpine","nginx","postgres"]}"#;
    let response: CatalogResponse = serde_json::from_str(json).unwrap();
    assert_eq!(response.repositories, vec!["alpine", "nginx", "postgres"]);
}

#[test]
fn tags_response_deserialization() {
    let json = r#"{"name":"alpine","tags":["latest","3.19"]}"#;
    let response: TagsResponse = serde_json::from_str(json).unwrap();
    assert_eq!(response.name, "alpine");
    assert_eq!(response.tags, vec!["latest", "3.19"]);
}

#[tokio::test]
async fn ping_reports_api_version() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/v2/")
        .with_status(200)
        .with_header("Docker-Distribution-API-Version", "registry/2.0")
        .create_async()
        .await;

    let client = Client::new(&server.url(), None).unwrap();
    let version = client.ping().await.unwrap();
    assert_eq!(version.api_version, Some("registry/2.0".to_string()));
    mock.assert_async().await;
}

#[tokio::test]
async fn fetch_catalog_follows_pagination() {
    let mut server = mockito::Server::new_async().await;
    let page1 = server
        .mock("GET", "/v2/_catalog")
        .with_status(200)
        .with_header("Link", r#"</v2/_catalog?last=alpine>; rel="next""#)
        .with_body(r#"{"repositories":["alpine"]}"#)
        .create_async()
        .await;
    let page2 = server
        .mock("GET", "/v2/_catalog?last=alpine")
        .with_status(200)
        .with_body(r#"{"repositories":["nginx"]}"#)
        .create_async()
        .await;

    let client = Client::new(&server.url(), None).unwrap();
    let repos = client.fetch_catalog().await.unwrap();
    assert_eq!(repos, vec!["alpine", "nginx"]);
    page1.assert_async().await;
    page2.assert_async().await;
}

#[tokio::test]
async fn fetch_tags_rejects_name_mismatch() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/alpine/tags/list")
        .with_status(200)
        .with_body(r#"{"name":"other","tags":["latest"]}"#)
        .create_async()
        .await;

    let client = Client::new(&server.url(), None).unwrap();
    let err = client.fetch_tags("alpine").await.unwrap_err();
    assert!(matches!(err, SyncError::Validation { .. }));
}

#[tokio::test]
async fn fetch_manifest_uses_content_digest_header() {
    let mut server = mockito::Server::new_async().await;
    let payload = r#"{"schemaVersion":2}"#;
    server
        .mock("GET", "/v2/alpine/manifests/latest")
        .with_status(200)
        .with_header("Docker-Content-Digest", "sha256:abc")
        .with_header(
            "Content-Type",
            "application/vnd.docker.distribution.manifest.v2+json",
        )
        .with_body(payload)
        .create_async()
        .await;

    let client = Client::new(&server.url(), None).unwrap();
    let (bytes, media_type, digest) = client.fetch_manifest("alpine", "latest").await.unwrap();
    assert_eq!(bytes, payload.as_bytes());
    assert_eq!(media_type, "application/vnd.docker.distribution.manifest.v2+json");
    assert_eq!(digest, "sha256:abc");
}

#[tokio::test]
async fn manifest_exists_false_on_404() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("HEAD", "/v2/alpine/manifests/sha256:missing")
        .with_status(404)
        .create_async()
        .await;

    let client = Client::new(&server.url(), None).unwrap();
    let (digest, exists) = client.manifest_exists("alpine", "sha256:missing").await.unwrap();
    assert!(!exists);
    assert!(digest.is_empty());
}

#[tokio::test]
async fn manifest_exists_true_on_200() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("HEAD", "/v2/alpine/manifests/sha256:present")
        .with_status(200)
        .with_header("Docker-Content-Digest", "sha256:present")
        .create_async()
        .await;

    let client = Client::new(&server.url(), None).unwrap();
    let (digest, exists) = client.manifest_exists("alpine", "sha256:present").await.unwrap();
    assert!(exists);
    assert_eq!(digest, "sha256:present");
}

#[tokio::test]
async fn push_manifest_sends_content_type() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("PUT", "/v2/alpine/manifests/latest")
        .match_header("content-type", "application/vnd.docker.distribution.manifest.v2+json")
        .with_status(201)
        .create_async()
        .await;

    let client = Client::new(&server.url(), None).unwrap();
    client
        .push_manifest(
            "alpine",
            "latest",
            "application/vnd.docker.distribution.manifest.v2+json",
            b"{}",
        )
        .await
        .unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn pull_blob_streams_body() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/alpine/blobs/sha256:4abcf20661432fb2d719b4568d94db3b6cf9b44bf2a3e1c2c6d0c89fd9e6e0b2")
        .with_status(200)
        .with_body("blob-bytes")
        .create_async()
        .await;

    let client = Client::new(&server.url(), None).unwrap();
    let mut stream = client
        .pull_blob(
            "alpine",
            "sha256:4abcf20661432fb2d719b4568d94db3b6cf9b44bf2a3e1c2c6d0c89fd9e6e0b2",
        )
        .await
        .unwrap();

    let mut collected = Vec::new();
    while let Some(chunk) = stream.next().await {
        collected.extend_from_slice(&chunk.unwrap());
    }
    assert_eq!(collected, b"blob-bytes");
}

#[tokio::test]
async fn push_blob_follows_upload_location() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("POST", "/v2/alpine/blobs/uploads/")
        .with_status(202)
        .with_header("Location", "/v2/alpine/blobs/uploads/abc")
        .create_async()
        .await;
    let put_mock = server
        .mock("PUT", "/v2/alpine/blobs/uploads/abc")
        .match_query(mockito::Matcher::UrlEncoded("digest".into(), "sha256:xyz".into()))
        .with_status(201)
        .create_async()
        .await;

    let client = Client::new(&server.url(), None).unwrap();
    let body = futures::stream::once(async {
        Ok::<_, std::io::Error>(bytes::Bytes::from_static(b"body"))
    });
    client
        .push_blob("alpine", "sha256:xyz", 4, body)
        .await
        .unwrap();
    put_mock.assert_async().await;
}

#[tokio::test]
async fn rate_limit_carries_retry_after() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/v2/_catalog")
        .with_status(429)
        .with_header("Retry-After", "30")
        .create_async()
        .await;

    let client = Client::new(&server.url(), None).unwrap();
    let err = client.fetch_catalog().await.unwrap_err();
    match err {
        SyncError::RateLimit { retry_after, .. } => assert_eq!(retry_after, Some(30)),
        other => panic!("expected RateLimit, got {other:?}"),
    }
}
