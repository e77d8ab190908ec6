//! API layer
//!
//! HTTP handlers for:
//! - Public blog, comments and site pages
//! - Admin back-office API
//! - Metrics (Prometheus)

mod admin;
mod blog;
mod converters;
pub mod dto;
pub mod metrics;
mod site;

pub use converters::*;
pub use dto::*;

pub use admin::admin_router;
pub use blog::blog_router;
pub use metrics::metrics_router;
pub use site::site_router;
