//! Common test utilities for E2E tests

#![allow(dead_code)]

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use quillpost::data::{BlogPost, Database};
use quillpost::error::AppError;
use quillpost::service::BlogPostInput;
use quillpost::verification::BotVerifier;
use quillpost::{AppState, config};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "test-password";

/// Test server instance
pub struct TestServer {
    pub addr: String,
    pub state: AppState,
    pub _temp_dir: TempDir,
    pub client: reqwest::Client,
}

/// Verifier that turns every token down
pub struct RejectingVerifier;

#[async_trait]
impl BotVerifier for RejectingVerifier {
    async fn verify(&self, _token: &str) -> Result<bool, AppError> {
        Ok(false)
    }
}

/// Test configuration: local SQLite, bot verification off, fast retries
pub fn test_config(db_path: &Path) -> config::AppConfig {
    config::AppConfig {
        server: config::ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0, // Let OS assign port
            domain: "test.example.com".to_string(),
            protocol: "https".to_string(),
            cors_origins: vec!["https://www.test.example.com".to_string()],
        },
        database: config::DatabaseConfig {
            path: db_path.to_path_buf(),
        },
        auth: config::AuthConfig {
            admin_username: ADMIN_USERNAME.to_string(),
            admin_password_hash: quillpost::auth::hash_password(ADMIN_PASSWORD).unwrap(),
            session_secret: "test-secret-key-32-bytes-long!!!".to_string(),
            session_max_age: 604800,
        },
        captcha: config::CaptchaConfig {
            provider: config::CaptchaProvider::None,
            secret: None,
            verify_url: "http://127.0.0.1:9/siteverify".to_string(),
            timeout_ms: 2000,
        },
        comments: config::CommentsConfig {
            top_level_order: config::ThreadOrder::NewestFirst,
            delete_policy: config::DeletePolicy::Orphan,
            store_timeout_ms: 5000,
            max_content_length: 5000,
            read_retry: config::ReadRetryConfig {
                max_attempts: 3,
                base_delay_ms: 10,
            },
        },
        logging: config::LoggingConfig {
            level: "info".to_string(),
            format: "pretty".to_string(),
        },
    }
}

impl TestServer {
    /// Create a new test server instance
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    /// Create a test server after adjusting the default test configuration
    pub async fn with_config(adjust: impl FnOnce(&mut config::AppConfig)) -> Self {
        // Create temporary directory for test database
        let temp_dir = TempDir::new().unwrap();
        let mut config = test_config(&temp_dir.path().join("test.db"));
        adjust(&mut config);

        // Initialize app state
        let state = AppState::new(config).await.unwrap();
        Self::spawn(state, temp_dir).await
    }

    /// Create a test server with a specific bot verifier
    pub async fn with_verifier(verifier: Arc<dyn BotVerifier>) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir.path().join("test.db"));
        let db = Database::connect(&config.database.path).await.unwrap();

        let state = AppState::from_parts(config, Arc::new(db), verifier);
        Self::spawn(state, temp_dir).await
    }

    async fn spawn(state: AppState, temp_dir: TempDir) -> Self {
        // Create HTTP client
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(10))
            .build()
            .unwrap();

        // Bind to random port
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let addr_str = format!("http://{}", addr);

        let app = quillpost::build_router(state.clone());

        // Spawn server in background
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        // Wait a bit for server to start
        tokio::time::sleep(tokio::time::Duration::from_millis(100)).await;

        Self {
            addr: addr_str,
            state,
            _temp_dir: temp_dir,
            client,
        }
    }

    /// Get base URL for API requests
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.addr, path)
    }

    /// Create a moderator session token
    pub fn create_test_token(&self) -> String {
        use quillpost::auth::{Session, create_session_token};

        let auth = &self.state.config.auth;
        let session = Session::start(&auth.admin_username, auth.session_max_age);
        create_session_token(&session, &auth.session_secret).expect("Failed to create test token")
    }

    /// Create a blog post directly through the service layer
    pub async fn create_post(&self, title: &str, is_published: bool) -> BlogPost {
        self.state
            .blog
            .create(BlogPostInput {
                title: title.to_string(),
                excerpt: format!("{title} excerpt"),
                content: format!("<p>{title}</p>"),
                is_published,
                ..Default::default()
            })
            .await
            .unwrap()
    }

    /// POST a comment on a post as a reader
    pub async fn post_comment(&self, blog_id: &str, name: &str, content: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/blog/{blog_id}/comments")))
            .json(&comment_body(name, content))
            .send()
            .await
            .unwrap()
    }

    /// POST a reply to a comment as a reader
    pub async fn post_reply(&self, comment_id: &str, name: &str, content: &str) -> reqwest::Response {
        self.client
            .post(self.url(&format!("/api/comments/{comment_id}/replies")))
            .json(&comment_body(name, content))
            .send()
            .await
            .unwrap()
    }

    /// GET a path with a moderator bearer token and parse the JSON body
    pub async fn admin_get(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .get(self.url(path))
            .bearer_auth(self.create_test_token())
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    /// PUT a path with a moderator bearer token and parse the JSON body
    pub async fn admin_put(&self, path: &str, body: Value) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .put(self.url(path))
            .bearer_auth(self.create_test_token())
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    /// POST to a path with a moderator bearer token and parse the JSON body
    pub async fn admin_post(&self, path: &str, body: Value) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .post(self.url(path))
            .bearer_auth(self.create_test_token())
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    /// DELETE a path with a moderator bearer token and parse the JSON body
    pub async fn admin_delete(&self, path: &str) -> (reqwest::StatusCode, Value) {
        let response = self
            .client
            .delete(self.url(path))
            .bearer_auth(self.create_test_token())
            .send()
            .await
            .unwrap();
        let status = response.status();
        (status, response.json().await.unwrap())
    }

    /// Public comment threads of a post
    pub async fn public_threads(&self, blog_id: &str) -> Value {
        let response = self
            .client
            .get(self.url(&format!("/api/blog/{blog_id}/comments")))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), 200);
        let body: Value = response.json().await.unwrap();
        body["data"].clone()
    }
}

/// Comment body with a token the test verifier accepts
pub fn comment_body(name: &str, content: &str) -> Value {
    json!({
        "name": name,
        "email": format!("{}@example.com", name.to_lowercase()),
        "content": content,
        "recaptchaToken": "test-token",
    })
}

/// Pull the `_id` out of an enveloped record
pub fn record_id(body: &Value) -> String {
    body["data"]["_id"]
        .as_str()
        .expect("record id")
        .to_string()
}
