//! E2E tests for comment submission, moderation and public threads

mod common;

use std::sync::Arc;

use common::{RejectingVerifier, TestServer, comment_body, record_id};
use quillpost::config::DeletePolicy;
use serde_json::{Value, json};

#[tokio::test]
async fn test_new_comment_is_pending_and_hidden() {
    let server = TestServer::new().await;
    let post = server.create_post("Autumn", true).await;

    let response = server.post_comment(&post.id, "Ana", "Lovely").await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["isApproved"], false);
    assert_eq!(body["data"]["blogId"], post.id.as_str());
    assert!(body["data"]["parentId"].is_null());
    assert!(body["data"].get("email").is_none());

    let threads = server.public_threads(&post.id).await;
    assert!(threads.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_approval_controls_public_visibility() {
    let server = TestServer::new().await;
    let post = server.create_post("Autumn", true).await;
    let body: Value = server
        .post_comment(&post.id, "Ana", "Lovely")
        .await
        .json()
        .await
        .unwrap();
    let comment_id = record_id(&body);

    let (status, approved) = server
        .admin_put(&format!("/api/admin/comments/{comment_id}/approve"), json!({}))
        .await;
    assert_eq!(status, 200);
    assert_eq!(approved["data"]["isApproved"], true);

    // Approving twice is not an error
    let (status, _) = server
        .admin_put(&format!("/api/admin/comments/{comment_id}/approve"), json!({}))
        .await;
    assert_eq!(status, 200);

    let threads = server.public_threads(&post.id).await;
    assert_eq!(threads.as_array().unwrap().len(), 1);
    assert_eq!(threads[0]["_id"], comment_id.as_str());
    assert_eq!(threads[0]["name"], "Ana");
    assert!(threads[0].get("email").is_none());
    assert!(threads[0]["replies"].as_array().unwrap().is_empty());

    let (status, revoked) = server
        .admin_put(
            &format!("/api/admin/comments/{comment_id}/unapprove"),
            json!({}),
        )
        .await;
    assert_eq!(status, 200);
    assert_eq!(revoked["data"]["isApproved"], false);

    let threads = server.public_threads(&post.id).await;
    assert!(threads.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reply_nesting_and_visibility() {
    let server = TestServer::new().await;
    let post = server.create_post("Winter", true).await;

    let body: Value = server
        .post_comment(&post.id, "Ana", "First")
        .await
        .json()
        .await
        .unwrap();
    let parent_id = record_id(&body);

    let response = server.post_reply(&parent_id, "Ben", "Agreed").await;
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    let reply_id = record_id(&body);
    assert_eq!(body["data"]["parentId"], parent_id.as_str());
    assert_eq!(body["data"]["blogId"], post.id.as_str());
    assert_eq!(body["data"]["isApproved"], false);

    // Reply to a reply is refused
    let response = server.post_reply(&reply_id, "Cy", "Deeper").await;
    assert_eq!(response.status(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    // An approved reply under a pending parent stays hidden
    server
        .admin_put(&format!("/api/admin/comments/{reply_id}/approve"), json!({}))
        .await;
    assert!(server.public_threads(&post.id).await.as_array().unwrap().is_empty());

    server
        .admin_put(&format!("/api/admin/comments/{parent_id}/approve"), json!({}))
        .await;
    let threads = server.public_threads(&post.id).await;
    assert_eq!(threads.as_array().unwrap().len(), 1);
    let replies = threads[0]["replies"].as_array().unwrap();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0]["_id"], reply_id.as_str());
}

#[tokio::test]
async fn test_reply_to_missing_comment_is_not_found() {
    let server = TestServer::new().await;

    let response = server.post_reply("01HNOTAREALCOMMENT", "Ana", "Hello?").await;
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_comment_on_missing_post_is_not_found() {
    let server = TestServer::new().await;

    let response = server.post_comment("01HNOTAREALPOST", "Ana", "Hello?").await;
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    let response = server
        .client
        .get(server.url("/api/blog/01HNOTAREALPOST/comments"))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
}

#[tokio::test]
async fn test_invalid_submissions_are_rejected() {
    let server = TestServer::new().await;
    let post = server.create_post("Spring", true).await;

    let cases = [
        json!({ "name": "", "email": "ana@example.com", "content": "x", "recaptchaToken": "t" }),
        json!({ "name": "Ana", "email": "not-an-email", "content": "x", "recaptchaToken": "t" }),
        json!({ "name": "Ana", "email": "ana@example.com", "content": "   ", "recaptchaToken": "t" }),
        json!({ "name": "Ana", "email": "ana@example.com", "content": "x" }),
        json!({ "name": "Ana", "email": "ana@example.com", "content": "x".repeat(5001), "recaptchaToken": "t" }),
    ];

    for body in cases {
        let response = server
            .client
            .post(server.url(&format!("/api/blog/{}/comments", post.id)))
            .json(&body)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 400, "body {body} should be rejected");
    }

    let (_, all) = server.admin_get("/api/admin/comments").await;
    assert_eq!(all["count"], 0);
}

#[tokio::test]
async fn test_failed_bot_verification_stores_nothing() {
    let server = TestServer::with_verifier(Arc::new(RejectingVerifier)).await;
    let post = server.create_post("Summer", true).await;

    let response = server.post_comment(&post.id, "Bot", "Buy now").await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["success"], false);

    let (_, all) = server.admin_get("/api/admin/comments").await;
    assert_eq!(all["count"], 0);
}

#[tokio::test]
async fn test_moderation_lists_include_pending_and_email() {
    let server = TestServer::new().await;
    let post = server.create_post("Dusk", true).await;

    let body: Value = server
        .post_comment(&post.id, "Ana", "One")
        .await
        .json()
        .await
        .unwrap();
    let first = record_id(&body);
    server.post_comment(&post.id, "Ben", "Two").await;
    server.post_reply(&first, "Cy", "Three").await;

    let (status, listed) = server
        .admin_get(&format!("/api/admin/blog/{}/comments", post.id))
        .await;
    assert_eq!(status, 200);
    assert_eq!(listed["count"], 3);
    let rows = listed["data"].as_array().unwrap();
    assert!(rows.iter().all(|row| row["email"].as_str().is_some()));
    assert!(rows.iter().all(|row| row["isApproved"] == false));

    let (status, all) = server.admin_get("/api/admin/comments").await;
    assert_eq!(status, 200);
    assert_eq!(all["count"], 3);
    assert_eq!(all["data"][0]["blog"]["_id"], post.id.as_str());
    assert_eq!(all["data"][0]["blog"]["title"], "Dusk");
}

#[tokio::test]
async fn test_orphan_delete_hides_replies() {
    let server = TestServer::new().await;
    let post = server.create_post("Night", true).await;

    let body: Value = server
        .post_comment(&post.id, "Ana", "Parent")
        .await
        .json()
        .await
        .unwrap();
    let parent_id = record_id(&body);
    let body: Value = server
        .post_reply(&parent_id, "Ben", "Child")
        .await
        .json()
        .await
        .unwrap();
    let reply_id = record_id(&body);

    for id in [&parent_id, &reply_id] {
        server
            .admin_put(&format!("/api/admin/comments/{id}/approve"), json!({}))
            .await;
    }

    let (status, _) = server
        .admin_delete(&format!("/api/admin/comments/{parent_id}"))
        .await;
    assert_eq!(status, 200);

    // Reply remains for moderators but has no public thread to sit in
    assert!(server.public_threads(&post.id).await.as_array().unwrap().is_empty());
    let (_, listed) = server
        .admin_get(&format!("/api/admin/blog/{}/comments", post.id))
        .await;
    assert_eq!(listed["count"], 1);
    assert_eq!(listed["data"][0]["_id"], reply_id.as_str());

    let (status, _) = server
        .admin_delete(&format!("/api/admin/comments/{parent_id}"))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_cascade_delete_removes_replies() {
    let server = TestServer::with_config(|config| {
        config.comments.delete_policy = DeletePolicy::Cascade;
    })
    .await;
    let post = server.create_post("Dawn", true).await;

    let body: Value = server
        .post_comment(&post.id, "Ana", "Parent")
        .await
        .json()
        .await
        .unwrap();
    let parent_id = record_id(&body);
    server.post_reply(&parent_id, "Ben", "Child").await;

    let (status, _) = server
        .admin_delete(&format!("/api/admin/comments/{parent_id}"))
        .await;
    assert_eq!(status, 200);

    let (_, listed) = server
        .admin_get(&format!("/api/admin/blog/{}/comments", post.id))
        .await;
    assert_eq!(listed["count"], 0);
}

#[tokio::test]
async fn test_public_threads_newest_first() {
    let server = TestServer::new().await;
    let post = server.create_post("Order", true).await;

    let mut ids = Vec::new();
    for name in ["Ana", "Ben", "Cy"] {
        let body: Value = server
            .post_comment(&post.id, name, "Hello")
            .await
            .json()
            .await
            .unwrap();
        let id = record_id(&body);
        server
            .admin_put(&format!("/api/admin/comments/{id}/approve"), json!({}))
            .await;
        ids.push(id);
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let response = server
        .client
        .get(server.url(&format!("/api/blog/{}/comments", post.id)))
        .send()
        .await
        .unwrap();
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["count"], 3);

    let listed: Vec<&str> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|thread| thread["_id"].as_str().unwrap())
        .collect();
    let expected: Vec<&str> = ids.iter().rev().map(String::as_str).collect();
    assert_eq!(listed, expected);
}

#[tokio::test]
async fn test_moderation_requires_authentication() {
    let server = TestServer::new().await;
    let post = server.create_post("Guarded", true).await;
    let body: Value = server
        .post_comment(&post.id, "Ana", "Hi")
        .await
        .json()
        .await
        .unwrap();
    let comment_id = record_id(&body);

    let response = server
        .client
        .put(server.url(&format!("/api/admin/comments/{comment_id}/approve")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = server
        .client
        .delete(server.url(&format!("/api/admin/comments/{comment_id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 401);

    let response = server.client.get(server.url("/api/admin/comments")).send().await.unwrap();
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_unknown_comment_moderation_is_not_found() {
    let server = TestServer::new().await;

    let (status, body) = server
        .admin_put("/api/admin/comments/01HNOTAREALCOMMENT/approve", json!({}))
        .await;
    assert_eq!(status, 404);
    assert_eq!(body["success"], false);

    let (status, _) = server
        .admin_put("/api/admin/comments/01HNOTAREALCOMMENT/unapprove", json!({}))
        .await;
    assert_eq!(status, 404);
}

#[tokio::test]
async fn test_comment_body_ignores_unknown_fields() {
    let server = TestServer::new().await;
    let post = server.create_post("Extra", true).await;

    let mut body = comment_body("Ana", "Hi");
    body["isApproved"] = json!(true);
    body["parentId"] = json!("sneaky");

    let response = server
        .client
        .post(server.url(&format!("/api/blog/{}/comments", post.id)))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["data"]["isApproved"], false);
    assert!(body["data"]["parentId"].is_null());
}
