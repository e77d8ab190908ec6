//! Google reCAPTCHA siteverify client

use async_trait::async_trait;
use serde::Deserialize;

use super::BotVerifier;
use crate::error::AppError;

/// Response body of the siteverify endpoint
#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
    #[serde(default)]
    hostname: Option<String>,
}

/// reCAPTCHA verifier
pub struct RecaptchaVerifier {
    http_client: reqwest::Client,
    verify_url: String,
    secret: String,
}

impl RecaptchaVerifier {
    /// Create new reCAPTCHA verifier
    ///
    /// # Arguments
    /// * `http_client` - Shared HTTP client
    /// * `verify_url` - Siteverify endpoint
    /// * `secret` - Server-side secret key
    pub fn new(http_client: reqwest::Client, verify_url: String, secret: String) -> Self {
        Self {
            http_client,
            verify_url,
            secret,
        }
    }
}

#[async_trait]
impl BotVerifier for RecaptchaVerifier {
    async fn verify(&self, token: &str) -> Result<bool, AppError> {
        let response = self
            .http_client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(transport_error)?;

        let body: SiteVerifyResponse = response.json().await.map_err(transport_error)?;

        if !body.success {
            tracing::info!(
                error_codes = ?body.error_codes,
                "reCAPTCHA rejected token"
            );
        } else {
            tracing::debug!(hostname = ?body.hostname, "reCAPTCHA token accepted");
        }

        Ok(body.success)
    }
}

/// A client-side timeout is the same condition as a missed deadline
fn transport_error(error: reqwest::Error) -> AppError {
    if error.is_timeout() {
        AppError::Timeout("bot verification")
    } else {
        AppError::HttpClient(error)
    }
}
