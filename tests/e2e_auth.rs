//! E2E tests for moderator login and session endpoints

mod common;

use common::{ADMIN_PASSWORD, ADMIN_USERNAME, TestServer};
use quillpost::auth::{Session, create_session_token};
use serde_json::{Value, json};

async fn login(server: &TestServer, username: &str, password: &str) -> reqwest::Response {
    server
        .client
        .post(server.url("/api/auth/login"))
        .json(&json!({ "username": username, "password": password }))
        .send()
        .await
        .expect("request succeeds")
}

fn session_cookie(response: &reqwest::Response) -> String {
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header");
    set_cookie
        .split(';')
        .next()
        .expect("cookie pair")
        .to_string()
}

#[tokio::test]
async fn test_login_sets_http_only_session_cookie() {
    let server = TestServer::new().await;

    let response = login(&server, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    assert_eq!(response.status(), 200);

    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header")
        .to_string();
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));
    assert!(set_cookie.contains("Secure"));

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["username"], ADMIN_USERNAME);
    assert!(body["data"]["token"].as_str().is_some());
    assert!(body["data"]["expiresAt"].as_str().is_some());
}

#[tokio::test]
async fn test_login_rejects_wrong_credentials() {
    let server = TestServer::new().await;

    for (username, password) in [
        (ADMIN_USERNAME, "not-the-password"),
        ("intruder", ADMIN_PASSWORD),
        ("", ""),
    ] {
        let response = login(&server, username, password).await;
        assert_eq!(response.status(), 401);
        assert!(response.headers().get("set-cookie").is_none());

        let body: Value = response.json().await.unwrap();
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().is_some());
    }
}

#[tokio::test]
async fn test_session_cookie_grants_admin_access() {
    let server = TestServer::new().await;
    let response = login(&server, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let cookie = session_cookie(&response);

    let me = server
        .client
        .get(server.url("/api/auth/me"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(me.status(), 200);
    let body: Value = me.json().await.unwrap();
    assert_eq!(body["data"]["username"], ADMIN_USERNAME);
    assert!(body["data"].get("token").is_none());

    let dashboard = server
        .client
        .get(server.url("/api/admin/dashboard"))
        .header("Cookie", &cookie)
        .send()
        .await
        .unwrap();
    assert_eq!(dashboard.status(), 200);
}

#[tokio::test]
async fn test_bearer_token_from_login_grants_admin_access() {
    let server = TestServer::new().await;
    let body: Value = login(&server, ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .json()
        .await
        .unwrap();
    let token = body["data"]["token"].as_str().unwrap();

    let response = server
        .client
        .get(server.url("/api/admin/comments"))
        .bearer_auth(token)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_me_requires_session() {
    let server = TestServer::new().await;

    let response = server
        .client
        .get(server.url("/api/auth/me"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 401);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let server = TestServer::new().await;

    let response = server
        .client
        .post(server.url("/api/auth/logout"))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), 200);
    let set_cookie = response
        .headers()
        .get("set-cookie")
        .and_then(|v| v.to_str().ok())
        .expect("set-cookie header");
    assert!(set_cookie.starts_with("session="));
    assert!(set_cookie.contains("Max-Age=0"));
}

#[tokio::test]
async fn test_rejects_forged_expired_and_foreign_tokens() {
    let server = TestServer::new().await;
    let secret = server.state.config.auth.session_secret.clone();

    let expired = create_session_token(&Session::start(ADMIN_USERNAME, -60), &secret).unwrap();
    let foreign_user = create_session_token(&Session::start("someone-else", 3600), &secret).unwrap();
    let wrong_secret = create_session_token(
        &Session::start(ADMIN_USERNAME, 3600),
        "another-secret-that-is-32-bytes-long",
    )
    .unwrap();

    for token in [expired, foreign_user, wrong_secret, "garbage".to_string()] {
        let response = server
            .client
            .get(server.url("/api/admin/dashboard"))
            .bearer_auth(&token)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 401, "token {token} should be rejected");
    }
}
