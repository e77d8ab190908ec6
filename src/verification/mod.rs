//! Bot verification
//!
//! Public submissions carry a CAPTCHA token that must be checked with an
//! external service before anything is stored.

mod recaptcha;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use crate::config::{CaptchaConfig, CaptchaProvider};
use crate::error::AppError;
use crate::metrics::BOT_VERIFICATIONS_TOTAL;
use crate::service::with_deadline;

pub use recaptcha::RecaptchaVerifier;

/// External bot-verification service
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BotVerifier: Send + Sync {
    /// Check a client-supplied token.
    ///
    /// # Returns
    /// `true` if the service vouches for the token.
    ///
    /// # Errors
    /// Transport or protocol failures; a rejected token is `Ok(false)`.
    async fn verify(&self, token: &str) -> Result<bool, AppError>;
}

/// Verifier that accepts every non-empty token
///
/// Used with `captcha.provider = "none"` for local development and tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticVerifier;

#[async_trait]
impl BotVerifier for StaticVerifier {
    async fn verify(&self, token: &str) -> Result<bool, AppError> {
        Ok(!token.trim().is_empty())
    }
}

/// Build the verifier selected by configuration
///
/// # Errors
/// Returns `Config` if reCAPTCHA is selected without a secret
pub fn build_verifier(
    config: &CaptchaConfig,
    http_client: reqwest::Client,
) -> Result<Arc<dyn BotVerifier>, AppError> {
    match config.provider {
        CaptchaProvider::Recaptcha => {
            let secret = config
                .secret
                .as_deref()
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    AppError::Config(
                        "captcha.secret is required when captcha.provider=recaptcha".to_string(),
                    )
                })?;
            Ok(Arc::new(RecaptchaVerifier::new(
                http_client,
                config.verify_url.clone(),
                secret.to_string(),
            )))
        }
        CaptchaProvider::None => Ok(Arc::new(StaticVerifier)),
    }
}

/// Gate a public submission on bot verification.
///
/// # Errors
/// - `Verification` if the token is blank or rejected
/// - `Timeout` if the service does not answer within `deadline`
/// - `HttpClient` on transport failure
pub async fn require_human(
    verifier: &dyn BotVerifier,
    token: &str,
    deadline: Duration,
) -> Result<(), AppError> {
    let token = token.trim();
    if token.is_empty() {
        BOT_VERIFICATIONS_TOTAL.with_label_values(&["missing"]).inc();
        return Err(AppError::Verification(
            "Bot verification token is required".to_string(),
        ));
    }

    let outcome = with_deadline(
        "bot verification",
        "captcha_verify",
        deadline,
        verifier.verify(token),
    )
    .await;

    match outcome {
        Ok(true) => {
            BOT_VERIFICATIONS_TOTAL.with_label_values(&["passed"]).inc();
            Ok(())
        }
        Ok(false) => {
            BOT_VERIFICATIONS_TOTAL.with_label_values(&["rejected"]).inc();
            Err(AppError::Verification(
                "Bot verification failed".to_string(),
            ))
        }
        Err(error) => {
            BOT_VERIFICATIONS_TOTAL.with_label_values(&["error"]).inc();
            tracing::warn!(error = %error, "Bot verification call failed");
            Err(error)
        }
    }
}
