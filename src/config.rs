//! Configuration management
//!
//! Loads configuration from:
//! 1. Default values
//! 2. Configuration file (config/default.toml, config/local.toml)
//! 3. Environment variables (override)

use serde::Deserialize;
use std::{net::IpAddr, path::PathBuf, time::Duration};

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub captcha: CaptchaConfig,
    pub comments: CommentsConfig,
    pub logging: LoggingConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0")
    pub host: String,
    /// Port number (e.g., 5000)
    pub port: u16,
    /// Public domain (e.g., "api.example.com")
    pub domain: String,
    /// Protocol ("http" or "https")
    pub protocol: String,
    /// Extra origins allowed for CORS (the front-end site)
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// Get the base URL for the API
    ///
    /// # Returns
    /// Full URL like "https://api.example.com"
    pub fn base_url(&self) -> String {
        format!("{}://{}", self.protocol, self.domain)
    }
}

/// Database configuration (SQLite only)
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Path to SQLite database file
    pub path: PathBuf,
}

/// Moderator authentication configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// The single moderator account name
    pub admin_username: String,
    /// Argon2id password hash in PHC string form (`$argon2id$...`)
    pub admin_password_hash: String,
    /// Session secret key (32+ bytes)
    pub session_secret: String,
    /// Session max age in seconds (default: 604800 = 7 days)
    pub session_max_age: i64,
}

/// Bot verification backend
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CaptchaProvider {
    /// Google reCAPTCHA siteverify
    #[default]
    Recaptcha,
    /// Accept any non-empty token (local development and tests)
    None,
}

/// Bot verification configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CaptchaConfig {
    #[serde(default)]
    pub provider: CaptchaProvider,
    /// Server-side secret issued by the provider
    pub secret: Option<String>,
    /// Verification endpoint
    pub verify_url: String,
    /// Deadline for a single verification call
    pub timeout_ms: u64,
}

impl CaptchaConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Ordering of top-level comments in the public thread view
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ThreadOrder {
    #[default]
    NewestFirst,
    OldestFirst,
}

/// What happens to replies when their parent comment is deleted
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Replies stay in storage and drop out of the public view
    #[default]
    Orphan,
    /// Replies are deleted together with their parent
    Cascade,
}

/// Comment thread configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CommentsConfig {
    #[serde(default)]
    pub top_level_order: ThreadOrder,
    #[serde(default)]
    pub delete_policy: DeletePolicy,
    /// Deadline for a single content store call
    pub store_timeout_ms: u64,
    /// Maximum comment body length in characters
    pub max_content_length: usize,
    pub read_retry: ReadRetryConfig,
}

impl CommentsConfig {
    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

/// Backoff settings for read paths
#[derive(Debug, Clone, Deserialize)]
pub struct ReadRetryConfig {
    /// Total attempts including the first one
    pub max_attempts: u32,
    /// Delay unit; the n-th retry waits `base_delay_ms * 2^n`
    pub base_delay_ms: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error
    pub level: String,
    /// Log format: "pretty" or "json"
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file and environment
    ///
    /// # Loading Order
    /// 1. Default values
    /// 2. config/default.toml (if exists)
    /// 3. config/local.toml (if exists)
    /// 4. Environment variables (QUILLPOST__*)
    ///
    /// # Errors
    /// Returns error if configuration is invalid
    pub fn load() -> Result<Self, crate::error::AppError> {
        use config::{Config, Environment, File};

        let config = Config::builder()
            // Start with default values
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 5000)?
            .set_default("server.protocol", "http")?
            .set_default("database.path", "data/quillpost.db")?
            .set_default("auth.admin_username", "admin")?
            .set_default("auth.session_max_age", 604800)?
            .set_default("captcha.provider", "recaptcha")?
            .set_default(
                "captcha.verify_url",
                "https://www.google.com/recaptcha/api/siteverify",
            )?
            .set_default("captcha.timeout_ms", 5000)?
            .set_default("comments.top_level_order", "newest_first")?
            .set_default("comments.delete_policy", "orphan")?
            .set_default("comments.store_timeout_ms", 5000)?
            .set_default("comments.max_content_length", 5000)?
            .set_default("comments.read_retry.max_attempts", 3)?
            .set_default("comments.read_retry.base_delay_ms", 500)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // Load from config/default.toml if it exists
            .add_source(File::with_name("config/default").required(false))
            // Load from config/local.toml if it exists (overrides default)
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables (QUILLPOST__*)
            .add_source(
                Environment::with_prefix("QUILLPOST")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;

        let app_config: Self = config
            .try_deserialize()
            .map_err(|e| crate::error::AppError::Config(e.to_string()))?;
        app_config.validate()?;
        Ok(app_config)
    }

    pub fn should_use_secure_cookies(&self) -> bool {
        self.server.protocol.eq_ignore_ascii_case("https")
            || !is_local_server_domain(&self.server.domain)
    }

    pub(crate) fn validate(&self) -> Result<(), crate::error::AppError> {
        const MIN_SESSION_SECRET_BYTES: usize = 32;

        if self.auth.session_secret.as_bytes().len() < MIN_SESSION_SECRET_BYTES {
            return Err(crate::error::AppError::Config(format!(
                "auth.session_secret must be at least {} bytes",
                MIN_SESSION_SECRET_BYTES
            )));
        }

        if self.auth.session_max_age <= 0 {
            return Err(crate::error::AppError::Config(
                "auth.session_max_age must be greater than 0".to_string(),
            ));
        }

        let password_is_argon2id = argon2::PasswordHash::new(&self.auth.admin_password_hash)
            .is_ok_and(|hash| hash.algorithm == argon2::Algorithm::Argon2id.ident());
        if !password_is_argon2id {
            return Err(crate::error::AppError::Config(
                "auth.admin_password_hash must be an Argon2id PHC string ($argon2id$...)"
                    .to_string(),
            ));
        }

        if self.captcha.provider == CaptchaProvider::Recaptcha
            && self
                .captcha
                .secret
                .as_deref()
                .map(str::trim)
                .is_none_or(str::is_empty)
        {
            return Err(crate::error::AppError::Config(
                "captcha.secret is required when captcha.provider=recaptcha".to_string(),
            ));
        }

        if self.comments.read_retry.max_attempts == 0 {
            return Err(crate::error::AppError::Config(
                "comments.read_retry.max_attempts must be at least 1".to_string(),
            ));
        }

        if self.captcha.provider == CaptchaProvider::None {
            tracing::warn!("Bot verification disabled; any non-empty token is accepted");
        }

        if !self.should_use_secure_cookies() {
            let host = normalized_server_host(&self.server.domain);
            tracing::warn!(
                host = %host,
                protocol = %self.server.protocol,
                "Using insecure session cookies for local development"
            );
        } else if !self.server.protocol.eq_ignore_ascii_case("https") {
            return Err(crate::error::AppError::Config(
                "server.protocol must be https for non-local server domains".to_string(),
            ));
        }

        Ok(())
    }
}

fn normalized_server_host(domain: &str) -> String {
    let trimmed = domain.trim();
    let parsed_host = url::Url::parse(&format!("http://{trimmed}"))
        .ok()
        .and_then(|url| url.host_str().map(|host| host.to_string()));
    let host = parsed_host.unwrap_or_else(|| trimmed.to_string());
    host.trim_end_matches('.').to_ascii_lowercase()
}

fn is_local_server_domain(domain: &str) -> bool {
    let host = normalized_server_host(domain);
    if host == "localhost" || host.ends_with(".localhost") {
        return true;
    }

    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback() || ip.is_unspecified();
    }

    false
}
