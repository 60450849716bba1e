//! Release client tests against a mock GitHub API.

use arca_core::Error;
use arca_github::{ReleaseCache, ReleaseClient};

const RELEASE_BODY: &str = r#"{
    "tag_name": "v1.2.0",
    "published_at": "2024-05-01T10:00:00Z",
    "assets": [
        { "name": "tool-1.2.0-linux-x86_64.tar.gz",
          "browser_download_url": "https://example.com/tool-1.2.0-linux-x86_64.tar.gz" },
        { "name": "tool-1.2.0-darwin-arm64.tar.gz",
          "browser_download_url": "https://example.com/tool-1.2.0-darwin-arm64.tar.gz" }
    ]
}"#;

#[tokio::test]
async fn test_latest_release_decodes_payload() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/org/tool/releases/latest")
        .match_header("x-github-api-version", "2022-11-28")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(RELEASE_BODY)
        .create_async()
        .await;

    let client = ReleaseClient::new(None).with_base_url(server.url());
    let mut cache = ReleaseCache::new();

    let release = client.latest_release("org/tool", &mut cache).await.unwrap();
    assert_eq!(release.version, "1.2.0"); // leading v stripped
    assert_eq!(release.asset_urls.len(), 2);
    assert!(release.asset_urls[0].ends_with("linux-x86_64.tar.gz"));

    mock.assert_async().await;
}

#[tokio::test]
async fn test_latest_release_sends_bearer_token() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/org/tool/releases/latest")
        .match_header("authorization", "Bearer sekrit")
        .with_status(200)
        .with_body(RELEASE_BODY)
        .create_async()
        .await;

    let client = ReleaseClient::new(Some("sekrit".into())).with_base_url(server.url());
    let mut cache = ReleaseCache::new();

    client.latest_release("org/tool", &mut cache).await.unwrap();
    mock.assert_async().await;
}

#[tokio::test]
async fn test_repeated_resolution_is_served_from_cache() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("GET", "/repos/org/tool/releases/latest")
        .with_status(200)
        .with_body(RELEASE_BODY)
        .expect(1)
        .create_async()
        .await;

    let client = ReleaseClient::new(None).with_base_url(server.url());
    let mut cache = ReleaseCache::new();

    let first = client.latest_release("org/tool", &mut cache).await.unwrap();
    let second = client.latest_release("org/tool", &mut cache).await.unwrap();
    assert_eq!(first, second);

    mock.assert_async().await;
}

#[tokio::test]
async fn test_rate_limit_exhaustion() {
    let reset = chrono::Utc::now().timestamp() + 720;

    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/org/tool/releases/latest")
        .with_status(403)
        .with_header("x-ratelimit-remaining", "0")
        .with_header("x-ratelimit-used", "60")
        .with_header("x-ratelimit-limit", "60")
        .with_header("x-ratelimit-reset", &reset.to_string())
        .create_async()
        .await;

    let client = ReleaseClient::new(None).with_base_url(server.url());
    let mut cache = ReleaseCache::new();

    let err = client
        .latest_release("org/tool", &mut cache)
        .await
        .unwrap_err();

    match err {
        Error::RateLimited { used, total, .. } => {
            assert_eq!(used, "60");
            assert_eq!(total, "60");
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }

    // failures are not cached
    assert!(cache.get("org/tool").is_none());
}

#[tokio::test]
async fn test_upstream_error_carries_status() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/org/tool/releases/latest")
        .with_status(404)
        .create_async()
        .await;

    let client = ReleaseClient::new(None).with_base_url(server.url());
    let mut cache = ReleaseCache::new();

    let err = client
        .latest_release("org/tool", &mut cache)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Upstream { status: 404 }));
}

#[tokio::test]
async fn test_decode_error_keeps_cause() {
    let mut server = mockito::Server::new_async().await;
    server
        .mock("GET", "/repos/org/tool/releases/latest")
        .with_status(200)
        .with_body("not json")
        .create_async()
        .await;

    let client = ReleaseClient::new(None).with_base_url(server.url());
    let mut cache = ReleaseCache::new();

    let err = client
        .latest_release("org/tool", &mut cache)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Decode { .. }));
}
