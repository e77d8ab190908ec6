//! Blog service
//!
//! Public reads of published posts, likes, and admin post management.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use slug::slugify;

use super::retry::{RetryPolicy, retry_read, with_deadline};
use super::validate;
use crate::data::{BlogPost, Database, EntityId};
use crate::error::AppError;
use crate::metrics::BLOG_LIKES_TOTAL;

const MAX_TITLE_CHARS: usize = 200;
const MAX_SLUG_SUFFIX_ATTEMPTS: usize = 32;

/// Editable fields of a blog post
#[derive(Debug, Clone, Default)]
pub struct BlogPostInput {
    pub title: String,
    /// Derived from the title on create when omitted; kept on update
    pub slug: Option<String>,
    pub excerpt: String,
    /// HTML body; sanitized before storage
    pub content: String,
    pub image: Option<String>,
    /// Display date; defaults to now on create
    pub date: Option<DateTime<Utc>>,
    pub is_published: bool,
    pub tags: Vec<String>,
}

/// Check the `lowercase-words-with-dashes` slug shape.
pub fn is_valid_slug(slug: &str) -> bool {
    !slug.is_empty()
        && slug.split('-').all(|part| {
            !part.is_empty()
                && part
                    .bytes()
                    .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit())
        })
}

/// Blog service
pub struct BlogService {
    db: Arc<Database>,
    store_timeout: Duration,
    read_retry: RetryPolicy,
}

impl BlogService {
    /// Create new blog service
    pub fn new(db: Arc<Database>, store_timeout: Duration, read_retry: RetryPolicy) -> Self {
        Self {
            db,
            store_timeout,
            read_retry,
        }
    }

    // =========================================================================
    // Public
    // =========================================================================

    /// Published posts, newest display date first
    pub async fn list_published(&self) -> Result<Vec<BlogPost>, AppError> {
        retry_read(self.read_retry, "list_published_posts", move || {
            with_deadline(
                "content store",
                "list_blog_posts",
                self.store_timeout,
                self.db.list_blog_posts(true),
            )
        })
        .await
    }

    /// Published post by slug
    ///
    /// Anything after a `?` is ignored, so a slug copied together with its
    /// query string still resolves. Drafts are reported as not found.
    pub async fn get_published_by_slug(&self, slug: &str) -> Result<BlogPost, AppError> {
        let slug = slug.split('?').next().unwrap_or_default().trim();
        if slug.is_empty() {
            return Err(AppError::NotFound("Blog post"));
        }

        let post = retry_read(self.read_retry, "get_post_by_slug", move || {
            with_deadline(
                "content store",
                "get_blog_post_by_slug",
                self.store_timeout,
                self.db.get_blog_post_by_slug(slug),
            )
        })
        .await?;

        post.filter(|p| p.is_published)
            .ok_or(AppError::NotFound("Blog post"))
    }

    /// Add one like to a published post
    pub async fn like(&self, id: &str) -> Result<BlogPost, AppError> {
        let post = with_deadline(
            "content store",
            "increment_blog_post_likes",
            self.store_timeout,
            self.db.increment_blog_post_likes(id),
        )
        .await?
        .ok_or(AppError::NotFound("Blog post"))?;

        BLOG_LIKES_TOTAL.inc();
        tracing::debug!(post_id = %id, likes = post.likes, "Blog post liked");
        Ok(post)
    }

    // =========================================================================
    // Admin
    // =========================================================================

    /// All posts including drafts
    pub async fn list_all(&self) -> Result<Vec<BlogPost>, AppError> {
        self.store(self.db.list_blog_posts(false)).await
    }

    /// Post by ID regardless of publication state
    pub async fn get(&self, id: &str) -> Result<BlogPost, AppError> {
        self.store(self.db.get_blog_post(id))
            .await?
            .ok_or(AppError::NotFound("Blog post"))
    }

    /// Create a post
    ///
    /// # Errors
    /// `Validation` for bad input, `Conflict` if an explicit slug is taken
    pub async fn create(&self, input: BlogPostInput) -> Result<BlogPost, AppError> {
        let input = validate_post(input)?;
        let slug = match input.slug.clone() {
            Some(slug) => slug,
            None => self.unique_slug_for(&input.title).await?,
        };

        let now = Utc::now();
        let post = BlogPost {
            id: EntityId::new().0,
            title: input.title,
            slug,
            excerpt: input.excerpt,
            content: input.content,
            image: input.image,
            date: input.date.unwrap_or(now),
            likes: 0,
            is_published: input.is_published,
            tags: input.tags,
            created_at: now,
            updated_at: now,
        };

        self.store(self.db.insert_blog_post(&post)).await?;
        tracing::info!(post_id = %post.id, slug = %post.slug, "Blog post created");
        Ok(post)
    }

    /// Replace the editable fields of a post
    pub async fn update(&self, id: &str, input: BlogPostInput) -> Result<BlogPost, AppError> {
        let input = validate_post(input)?;
        let existing = self.get(id).await?;

        let post = BlogPost {
            title: input.title,
            slug: input.slug.unwrap_or(existing.slug),
            excerpt: input.excerpt,
            content: input.content,
            image: input.image,
            date: input.date.unwrap_or(existing.date),
            is_published: input.is_published,
            tags: input.tags,
            updated_at: Utc::now(),
            ..existing
        };

        if !self.store(self.db.update_blog_post(&post)).await? {
            return Err(AppError::NotFound("Blog post"));
        }
        tracing::info!(post_id = %post.id, "Blog post updated");
        Ok(post)
    }

    /// Delete a post and its comments
    pub async fn delete(&self, id: &str) -> Result<(), AppError> {
        if !self.store(self.db.delete_blog_post(id)).await? {
            return Err(AppError::NotFound("Blog post"));
        }
        tracing::info!(post_id = %id, "Blog post deleted");
        Ok(())
    }

    async fn unique_slug_for(&self, title: &str) -> Result<String, AppError> {
        let base = slugify(title);
        if base.is_empty() {
            return Err(AppError::Validation(
                "Slug cannot be derived from the title; provide one".to_string(),
            ));
        }

        for attempt in 1..=MAX_SLUG_SUFFIX_ATTEMPTS {
            let candidate = if attempt == 1 {
                base.clone()
            } else {
                format!("{base}-{attempt}")
            };
            if self
                .store(self.db.get_blog_post_by_slug(&candidate))
                .await?
                .is_none()
            {
                return Ok(candidate);
            }
        }

        Err(AppError::Conflict(format!(
            "No free slug left for '{base}'"
        )))
    }

    async fn store<T>(
        &self,
        future: impl std::future::Future<Output = Result<T, AppError>>,
    ) -> Result<T, AppError> {
        with_deadline("content store", "blog_admin", self.store_timeout, future).await
    }
}

fn validate_post(input: BlogPostInput) -> Result<BlogPostInput, AppError> {
    let title = validate::required("Title", &input.title)?;
    validate::max_chars("Title", &title, MAX_TITLE_CHARS)?;

    let slug = match input.slug.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(slug) if is_valid_slug(slug) => Some(slug.to_string()),
        Some(_) => {
            return Err(AppError::Validation(
                "Slug may only contain lowercase letters, digits and single dashes".to_string(),
            ));
        }
    };

    let content = ammonia::clean(&validate::required("Content", &input.content)?);
    let image = match input.image.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(url) => Some(validate::http_url("Image", url)?),
    };

    let mut tags: Vec<String> = Vec::new();
    for tag in input.tags {
        let tag = tag.trim().to_string();
        if !tag.is_empty() && !tags.contains(&tag) {
            tags.push(tag);
        }
    }

    Ok(BlogPostInput {
        title,
        slug,
        excerpt: input.excerpt.trim().to_string(),
        content,
        image,
        date: input.date,
        is_published: input.is_published,
        tags,
    })
}
