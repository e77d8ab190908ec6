//! E2E tests for health check and basic server functionality

mod common;

use common::TestServer;

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert_eq!(body, "OK");
}

#[tokio::test]
async fn test_cors_allows_configured_origins() {
    let server = TestServer::new().await;

    for origin in ["https://test.example.com", "https://www.test.example.com"] {
        let response = server
            .client
            .get(server.url("/health"))
            .header("Origin", origin)
            .send()
            .await
            .unwrap();

        let allowed = response
            .headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok());
        assert_eq!(allowed, Some(origin));
    }
}

#[tokio::test]
async fn test_cors_ignores_unknown_origin() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/health"))
        .header("Origin", "https://evil.example.net")
        .send()
        .await
        .unwrap();

    assert!(
        !response
            .headers()
            .contains_key("access-control-allow-origin")
    );
}

#[tokio::test]
async fn test_404_for_unknown_routes() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/unknown/route"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_metrics_requires_authentication() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/metrics"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_metrics_with_session() {
    quillpost::metrics::init_metrics();
    let server = TestServer::new().await;
    let post = server.create_post("Metered", true).await;
    server.post_comment(&post.id, "Ana", "Counting").await;

    let response = server
        .client
        .get(server.url("/metrics"))
        .bearer_auth(server.create_test_token())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let body = response.text().await.unwrap();
    assert!(body.contains("comments_submitted_total"));
}
