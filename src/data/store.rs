//! Content store seam used by the comment thread manager.

use async_trait::async_trait;

use super::database::Database;
use super::models::{Comment, CommentWithPost};
use crate::config::DeletePolicy;
use crate::error::AppError;

/// Persistence operations the comment service depends on.
///
/// `Database` is the production implementation; tests substitute a mock.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CommentStore: Send + Sync {
    async fn post_exists(&self, blog_id: &str) -> Result<bool, AppError>;

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, AppError>;

    async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError>;

    /// All comments of a post regardless of approval state.
    async fn comments_for_post(&self, blog_id: &str) -> Result<Vec<Comment>, AppError>;

    async fn all_comments_with_posts(&self) -> Result<Vec<CommentWithPost>, AppError>;

    /// Returns `false` when no comment has this ID.
    async fn set_approval(&self, id: &str, approved: bool) -> Result<bool, AppError>;

    /// Returns the number of removed rows; 0 when the comment is missing.
    async fn delete_comment(&self, id: &str, policy: DeletePolicy) -> Result<u64, AppError>;
}

#[async_trait]
impl CommentStore for Database {
    async fn post_exists(&self, blog_id: &str) -> Result<bool, AppError> {
        self.blog_post_exists(blog_id).await
    }

    async fn find_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        self.get_comment(id).await
    }

    async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        Database::insert_comment(self, comment).await
    }

    async fn comments_for_post(&self, blog_id: &str) -> Result<Vec<Comment>, AppError> {
        self.get_comments_by_blog(blog_id).await
    }

    async fn all_comments_with_posts(&self) -> Result<Vec<CommentWithPost>, AppError> {
        self.get_all_comments_with_posts().await
    }

    async fn set_approval(&self, id: &str, approved: bool) -> Result<bool, AppError> {
        self.set_comment_approval(id, approved).await
    }

    async fn delete_comment(&self, id: &str, policy: DeletePolicy) -> Result<u64, AppError> {
        match policy {
            DeletePolicy::Orphan => Ok(u64::from(Database::delete_comment(self, id).await?)),
            DeletePolicy::Cascade => self.delete_comment_with_replies(id).await,
        }
    }
}
