//! Comment service
//!
//! The comment thread manager: public comment and reply submission,
//! the moderation workflow, and the moderation and public read views.
//!
//! Comments start pending and only an explicit moderator approval makes
//! them public. Replies hang off top-level comments only.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use super::retry::{RetryPolicy, retry_read, with_deadline};
use super::thread::{CommentThread, assemble_public_threads};
use super::validate;
use crate::config::{AppConfig, DeletePolicy, ThreadOrder};
use crate::data::{Comment, CommentStore, CommentWithPost, EntityId};
use crate::error::AppError;
use crate::metrics::{COMMENT_MODERATION_TOTAL, COMMENTS_SUBMITTED_TOTAL};
use crate::verification::{BotVerifier, require_human};

/// Author-supplied fields of a comment or reply
#[derive(Debug, Clone, Default)]
pub struct CommentInput {
    pub name: String,
    pub email: String,
    pub content: String,
}

/// Tunables for the comment service
#[derive(Debug, Clone)]
pub struct CommentSettings {
    pub top_level_order: ThreadOrder,
    pub delete_policy: DeletePolicy,
    pub store_timeout: Duration,
    pub verify_timeout: Duration,
    pub max_content_length: usize,
    pub read_retry: RetryPolicy,
}

impl CommentSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            top_level_order: config.comments.top_level_order,
            delete_policy: config.comments.delete_policy,
            store_timeout: config.comments.store_timeout(),
            verify_timeout: config.captcha.timeout(),
            max_content_length: config.comments.max_content_length,
            read_retry: RetryPolicy::from(&config.comments.read_retry),
        }
    }
}

/// Comment service
pub struct CommentService {
    store: Arc<dyn CommentStore>,
    verifier: Arc<dyn BotVerifier>,
    settings: CommentSettings,
}

impl CommentService {
    /// Create new comment service
    pub fn new(
        store: Arc<dyn CommentStore>,
        verifier: Arc<dyn BotVerifier>,
        settings: CommentSettings,
    ) -> Self {
        Self {
            store,
            verifier,
            settings,
        }
    }

    // =========================================================================
    // Public submissions
    // =========================================================================

    /// Submit a top-level comment on a blog post
    ///
    /// # Arguments
    /// * `blog_id` - Target blog post ID
    /// * `input` - Author name, email and body
    /// * `bot_token` - CAPTCHA token from the client
    ///
    /// # Returns
    /// The stored comment, pending approval
    ///
    /// # Errors
    /// `Validation`, `Verification`, `NotFound` (post), `Timeout`, `Database`
    pub async fn submit_comment(
        &self,
        blog_id: &str,
        input: CommentInput,
        bot_token: &str,
    ) -> Result<Comment, AppError> {
        let input = self.validate_input(input)?;
        require_human(self.verifier.as_ref(), bot_token, self.settings.verify_timeout).await?;

        if !self
            .store_call("post_exists", self.store.post_exists(blog_id))
            .await?
        {
            return Err(AppError::NotFound("Blog post"));
        }

        let comment = new_comment(blog_id.to_string(), None, input);
        self.store_call("insert_comment", self.store.insert_comment(&comment))
            .await?;

        COMMENTS_SUBMITTED_TOTAL
            .with_label_values(&["comment"])
            .inc();
        tracing::info!(
            comment_id = %comment.id,
            blog_id = %comment.blog_id,
            "Comment submitted for moderation"
        );

        Ok(comment)
    }

    /// Submit a reply to a top-level comment
    ///
    /// The reply inherits the parent's blog post.
    ///
    /// # Errors
    /// `Validation`, `Verification`, `NotFound` (parent), `InvalidNesting`
    /// when the parent is itself a reply, `Timeout`, `Database`
    pub async fn submit_reply(
        &self,
        parent_id: &str,
        input: CommentInput,
        bot_token: &str,
    ) -> Result<Comment, AppError> {
        let input = self.validate_input(input)?;
        require_human(self.verifier.as_ref(), bot_token, self.settings.verify_timeout).await?;

        let parent = self
            .store_call("find_comment", self.store.find_comment(parent_id))
            .await?
            .ok_or(AppError::NotFound("Comment"))?;

        if parent.is_reply() {
            tracing::debug!(parent_id, "Rejected reply to a reply");
            return Err(AppError::InvalidNesting);
        }

        let reply = new_comment(parent.blog_id, Some(parent.id), input);
        self.store_call("insert_comment", self.store.insert_comment(&reply))
            .await?;

        COMMENTS_SUBMITTED_TOTAL.with_label_values(&["reply"]).inc();
        tracing::info!(
            comment_id = %reply.id,
            parent_id,
            blog_id = %reply.blog_id,
            "Reply submitted for moderation"
        );

        Ok(reply)
    }

    // =========================================================================
    // Moderation
    // =========================================================================

    /// Approve a comment; approving twice is not an error
    pub async fn approve(&self, id: &str) -> Result<Comment, AppError> {
        let comment = self.set_approval(id, true).await?;
        COMMENT_MODERATION_TOTAL
            .with_label_values(&["approve"])
            .inc();
        tracing::info!(comment_id = %id, "Comment approved");
        Ok(comment)
    }

    /// Take a comment back out of public view
    pub async fn revoke_approval(&self, id: &str) -> Result<Comment, AppError> {
        let comment = self.set_approval(id, false).await?;
        COMMENT_MODERATION_TOTAL
            .with_label_values(&["revoke"])
            .inc();
        tracing::info!(comment_id = %id, "Comment approval revoked");
        Ok(comment)
    }

    /// Hard-delete a comment
    ///
    /// Under the orphan policy replies stay in storage and drop out of the
    /// public view; under the cascade policy they are deleted too.
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        let policy = self.settings.delete_policy;
        let removed = self
            .store_call("delete_comment", self.store.delete_comment(id, policy))
            .await?;

        if removed == 0 {
            return Err(AppError::NotFound("Comment"));
        }

        COMMENT_MODERATION_TOTAL
            .with_label_values(&["delete"])
            .inc();
        tracing::info!(comment_id = %id, ?policy, removed, "Comment deleted");
        Ok(())
    }

    // =========================================================================
    // Read views
    // =========================================================================

    /// Every comment of a post, pending and replies included, newest first
    pub async fn list_for_moderation(&self, blog_id: &str) -> Result<Vec<Comment>, AppError> {
        let mut comments = retry_read(self.settings.read_retry, "list_for_moderation", move || {
            self.load_post_comments(blog_id)
        })
        .await?;

        comments.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        Ok(comments)
    }

    /// Approved two-level thread view of a post
    pub async fn list_for_public_display(
        &self,
        blog_id: &str,
    ) -> Result<Vec<CommentThread>, AppError> {
        let comments = retry_read(
            self.settings.read_retry,
            "list_for_public_display",
            move || self.load_post_comments(blog_id),
        )
        .await?;

        Ok(assemble_public_threads(
            comments,
            self.settings.top_level_order,
        ))
    }

    /// Every comment across all posts with its post summary, newest first
    pub async fn list_all_for_moderation(&self) -> Result<Vec<CommentWithPost>, AppError> {
        let mut rows = retry_read(
            self.settings.read_retry,
            "list_all_for_moderation",
            move || self.store_call("all_comments", self.store.all_comments_with_posts()),
        )
        .await?;

        rows.sort_by(|a, b| {
            b.comment
                .created_at
                .cmp(&a.comment.created_at)
                .then_with(|| b.comment.id.cmp(&a.comment.id))
        });
        Ok(rows)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    fn validate_input(&self, input: CommentInput) -> Result<CommentInput, AppError> {
        let name = validate::required("Name", &input.name)?;
        validate::max_chars("Name", &name, validate::MAX_NAME_CHARS)?;
        let email = validate::email(&input.email)?;
        let content = validate::required("Content", &input.content)?;
        validate::max_chars("Content", &content, self.settings.max_content_length)?;

        Ok(CommentInput {
            name,
            email,
            content,
        })
    }

    async fn set_approval(&self, id: &str, approved: bool) -> Result<Comment, AppError> {
        let matched = self
            .store_call("set_approval", self.store.set_approval(id, approved))
            .await?;
        if !matched {
            return Err(AppError::NotFound("Comment"));
        }

        self.store_call("find_comment", self.store.find_comment(id))
            .await?
            .ok_or(AppError::NotFound("Comment"))
    }

    async fn load_post_comments(&self, blog_id: &str) -> Result<Vec<Comment>, AppError> {
        if !self
            .store_call("post_exists", self.store.post_exists(blog_id))
            .await?
        {
            return Err(AppError::NotFound("Blog post"));
        }

        self.store_call("comments_for_post", self.store.comments_for_post(blog_id))
            .await
    }

    async fn store_call<T, F>(&self, operation: &'static str, future: F) -> Result<T, AppError>
    where
        F: Future<Output = Result<T, AppError>>,
    {
        with_deadline(
            "content store",
            operation,
            self.settings.store_timeout,
            future,
        )
        .await
    }
}

fn new_comment(blog_id: String, parent_id: Option<String>, input: CommentInput) -> Comment {
    Comment {
        id: EntityId::new().0,
        blog_id,
        parent_id,
        name: input.name,
        email: input.email,
        content: input.content,
        is_approved: false,
        created_at: Utc::now(),
    }
}
