//! Data layer module
//!
//! Handles all data persistence:
//! - SQLite database operations
//! - Comment store seam for the thread manager

mod database;
mod models;
mod store;

pub use database::Database;
pub use models::*;
pub use store::CommentStore;

#[cfg(test)]
pub use store::MockCommentStore;
