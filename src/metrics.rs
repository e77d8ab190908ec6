//! Prometheus metrics registry and instruments.
//!
//! This module is framework-agnostic and can be used from any layer.

use lazy_static::lazy_static;
use prometheus::{HistogramOpts, IntCounter, IntCounterVec, Opts, Registry};
use std::time::Duration;

lazy_static! {
    /// Global Prometheus registry
    pub static ref REGISTRY: Registry = Registry::new();

    // Comment Metrics
    pub static ref COMMENTS_SUBMITTED_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("quillpost_comments_submitted_total", "Total number of accepted comment submissions"),
        &["kind"]
    ).expect("metric can be created");
    pub static ref COMMENT_MODERATION_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("quillpost_comment_moderation_total", "Total number of moderator actions on comments"),
        &["action"]
    ).expect("metric can be created");
    pub static ref BOT_VERIFICATIONS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("quillpost_bot_verifications_total", "Total number of bot verification checks"),
        &["outcome"]
    ).expect("metric can be created");
    pub static ref READ_RETRIES_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("quillpost_read_retries_total", "Total number of retried read operations"),
        &["operation"]
    ).expect("metric can be created");

    // Database Metrics
    pub static ref DB_QUERY_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "quillpost_db_query_duration_seconds",
            "Content store call duration in seconds"
        ).buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
        &["operation"]
    ).expect("metric can be created");

    // Bot Verification Metrics
    pub static ref BOT_VERIFICATION_DURATION_SECONDS: prometheus::HistogramVec = prometheus::HistogramVec::new(
        HistogramOpts::new(
            "quillpost_bot_verification_duration_seconds",
            "Bot verification service call duration in seconds"
        ).buckets(vec![0.01, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0]),
        &["operation"]
    ).expect("metric can be created");

    // Blog Metrics
    pub static ref BLOG_LIKES_TOTAL: IntCounter = IntCounter::new(
        "quillpost_blog_likes_total",
        "Total number of blog post likes"
    ).expect("metric can be created");

    // Error Metrics
    pub static ref ERRORS_TOTAL: IntCounterVec = IntCounterVec::new(
        Opts::new("quillpost_errors_total", "Total number of errors returned to callers"),
        &["error_type"]
    ).expect("metric can be created");
}

/// Initialize metrics registry.
///
/// Safe to call more than once; repeated registrations are ignored.
pub fn init_metrics() {
    let collectors: Vec<Box<dyn prometheus::core::Collector>> = vec![
        Box::new(COMMENTS_SUBMITTED_TOTAL.clone()),
        Box::new(COMMENT_MODERATION_TOTAL.clone()),
        Box::new(BOT_VERIFICATIONS_TOTAL.clone()),
        Box::new(READ_RETRIES_TOTAL.clone()),
        Box::new(DB_QUERY_DURATION_SECONDS.clone()),
        Box::new(BOT_VERIFICATION_DURATION_SECONDS.clone()),
        Box::new(BLOG_LIKES_TOTAL.clone()),
        Box::new(ERRORS_TOTAL.clone()),
    ];

    let mut registered = 0usize;
    for collector in collectors {
        match REGISTRY.register(collector) {
            Ok(()) => registered += 1,
            Err(prometheus::Error::AlreadyReg) => {}
            Err(error) => tracing::warn!(%error, "Failed to register metric"),
        }
    }

    tracing::info!(registered, "Metrics registry initialized");
}

/// Record how long a collaborator call took, in that collaborator's histogram.
pub fn observe_collaborator_call(collaborator: &str, operation: &str, elapsed: Duration) {
    let histogram = match collaborator {
        "content store" => &*DB_QUERY_DURATION_SECONDS,
        "bot verification" => &*BOT_VERIFICATION_DURATION_SECONDS,
        _ => {
            tracing::debug!(collaborator, operation, "No duration histogram for collaborator");
            return;
        }
    };

    histogram
        .with_label_values(&[operation])
        .observe(elapsed.as_secs_f64());
}
