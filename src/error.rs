//! Error types for Quillpost
//!
//! All errors in the application are converted to `AppError`,
//! which implements `IntoResponse` for proper HTTP error responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

/// Application-wide error type
///
/// Every failure is per-request: nothing here is fatal to the process.
/// Handlers return it directly and the `IntoResponse` impl turns it into
/// the `{"success": false, "error": ...}` envelope.
#[derive(Debug, Error)]
pub enum AppError {
    /// Referenced record does not exist (404)
    ///
    /// The payload names the kind of record, e.g. "Blog post".
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Authentication required (401)
    #[error("Authentication required")]
    Unauthorized,

    /// Missing or malformed input (400)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Bot verification rejected the submission (400)
    #[error("Verification failed: {0}")]
    Verification(String),

    /// Attempted to reply to a reply (422)
    #[error("Replies can only be attached to top-level comments")]
    InvalidNesting,

    /// Record collides with an existing one (409)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// A collaborator call exceeded its deadline (504)
    #[error("Timed out waiting for {0}")]
    Timeout(&'static str),

    /// Content store failure (500)
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// HTTP client error (502)
    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    /// Configuration error (500)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Signing error (500)
    #[error("Encryption error: {0}")]
    Encryption(String),

    /// Internal server error (500)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    /// Whether retrying the same read could plausibly succeed.
    ///
    /// Only deadline expiry, pool exhaustion, I/O failures and SQLite
    /// busy/locked conditions qualify.
    pub fn is_transient(&self) -> bool {
        match self {
            AppError::Timeout(_) => true,
            AppError::Database(sqlx::Error::PoolTimedOut | sqlx::Error::Io(_)) => true,
            AppError::Database(sqlx::Error::Database(db_error)) => matches!(
                db_error.code().as_deref(),
                Some("5") | Some("6") // SQLITE_BUSY, SQLITE_LOCKED
            ),
            _ => false,
        }
    }

    /// Short machine-readable label used in metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "not_found",
            AppError::Unauthorized => "unauthorized",
            AppError::Validation(_) => "validation",
            AppError::Verification(_) => "verification",
            AppError::InvalidNesting => "invalid_nesting",
            AppError::Conflict(_) => "conflict",
            AppError::Timeout(_) => "timeout",
            AppError::Database(_) => "database",
            AppError::HttpClient(_) => "http_client",
            AppError::Config(_) => "config",
            AppError::Encryption(_) => "encryption",
            AppError::Internal(_) => "internal",
        }
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::Validation(_) | AppError::Verification(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidNesting => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            AppError::HttpClient(_) => StatusCode::BAD_GATEWAY,
            AppError::Database(_)
            | AppError::Config(_)
            | AppError::Encryption(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl IntoResponse for AppError {
    /// Convert error to HTTP response
    ///
    /// Store and internal failures are logged with full detail but reported
    /// to the caller with a generic message.
    fn into_response(self) -> Response {
        use axum::Json;

        let status = self.status_code();
        let error_message = match &self {
            AppError::Validation(msg) | AppError::Verification(msg) | AppError::Conflict(msg) => {
                msg.clone()
            }
            AppError::Database(error) => {
                tracing::error!(%error, "Database error while handling request");
                "Database error".to_string()
            }
            AppError::Internal(error) => {
                tracing::error!(error = %error, "Internal error while handling request");
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        crate::metrics::ERRORS_TOTAL
            .with_label_values(&[self.kind()])
            .inc();

        let body = Json(serde_json::json!({
            "success": false,
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
