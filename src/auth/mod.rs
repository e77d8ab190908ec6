//! Moderator authentication
//!
//! Handles:
//! - Password login for the configured moderator
//! - Signed session tokens
//! - Authentication middleware

mod login;
mod middleware;
pub mod session;

pub use login::{auth_router, hash_password};
pub use middleware::{CurrentUser, SESSION_COOKIE, require_auth};
pub use session::{Session, create_session_token, verify_session_token};
