//! SQLite database operations
//!
//! All Content Store access goes through this module.
//! Each method is a single unit of work; SQLite serializes concurrent
//! writers and the last write wins.

use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::models::*;
use crate::error::AppError;

const BLOG_POST_COLUMNS: &str = "id, title, slug, excerpt, content, image, date, likes, \
     is_published, tags, created_at, updated_at";

/// Raw `blog_posts` row; tags are stored as a JSON array string.
#[derive(sqlx::FromRow)]
struct BlogPostRow {
    id: String,
    title: String,
    slug: String,
    excerpt: String,
    content: String,
    image: Option<String>,
    date: DateTime<Utc>,
    likes: i64,
    is_published: bool,
    tags: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BlogPostRow> for BlogPost {
    fn from(row: BlogPostRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            slug: row.slug,
            excerpt: row.excerpt,
            content: row.content,
            image: row.image,
            date: row.date,
            likes: row.likes,
            is_published: row.is_published,
            tags: parse_tags(&row.tags),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn parse_tags(raw: &str) -> Vec<String> {
    serde_json::from_str::<Vec<String>>(raw).unwrap_or_else(|error| {
        tracing::warn!(%error, raw, "Ignoring malformed blog post tags");
        Vec::new()
    })
}

fn encode_tags(tags: &[String]) -> Result<String, AppError> {
    serde_json::to_string(tags)
        .map_err(|error| AppError::Internal(anyhow::anyhow!("failed to encode tags: {error}")))
}

/// Comment row joined with its post
#[derive(sqlx::FromRow)]
struct CommentWithPostRow {
    id: String,
    blog_id: String,
    parent_id: Option<String>,
    name: String,
    email: String,
    content: String,
    is_approved: bool,
    created_at: DateTime<Utc>,
    post_title: String,
    post_slug: String,
}

impl From<CommentWithPostRow> for CommentWithPost {
    fn from(row: CommentWithPostRow) -> Self {
        Self {
            post: BlogPostSummary {
                id: row.blog_id.clone(),
                title: row.post_title,
                slug: row.post_slug,
            },
            comment: Comment {
                id: row.id,
                blog_id: row.blog_id,
                parent_id: row.parent_id,
                name: row.name,
                email: row.email,
                content: row.content,
                is_approved: row.is_approved,
                created_at: row.created_at,
            },
        }
    }
}

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self, AppError> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        // Create connection string
        let connection_string = format!("sqlite:{}?mode=rwc", path.display());

        // Create connection pool
        let pool = SqlitePool::connect(&connection_string).await?;

        // Run migrations
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Blog posts
    // =========================================================================

    /// Get blog post by ID
    pub async fn get_blog_post(&self, id: &str) -> Result<Option<BlogPost>, AppError> {
        let query = format!("SELECT {BLOG_POST_COLUMNS} FROM blog_posts WHERE id = ?");
        let row = sqlx::query_as::<_, BlogPostRow>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(BlogPost::from))
    }

    /// Get blog post by slug
    pub async fn get_blog_post_by_slug(&self, slug: &str) -> Result<Option<BlogPost>, AppError> {
        let query = format!("SELECT {BLOG_POST_COLUMNS} FROM blog_posts WHERE slug = ?");
        let row = sqlx::query_as::<_, BlogPostRow>(&query)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(BlogPost::from))
    }

    /// Check whether a blog post exists without loading it
    pub async fn blog_post_exists(&self, id: &str) -> Result<bool, AppError> {
        let exists = sqlx::query_scalar::<_, i64>("SELECT 1 FROM blog_posts WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(exists.is_some())
    }

    /// List blog posts, newest display date first
    ///
    /// # Arguments
    /// * `published_only` - Exclude drafts
    pub async fn list_blog_posts(&self, published_only: bool) -> Result<Vec<BlogPost>, AppError> {
        let filter = if published_only {
            "WHERE is_published = 1"
        } else {
            ""
        };
        let query = format!(
            "SELECT {BLOG_POST_COLUMNS} FROM blog_posts {filter} ORDER BY date DESC, id DESC"
        );
        let rows = sqlx::query_as::<_, BlogPostRow>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(BlogPost::from).collect())
    }

    /// Insert a new blog post
    ///
    /// # Errors
    /// Returns `Conflict` if the slug is already taken
    pub async fn insert_blog_post(&self, post: &BlogPost) -> Result<(), AppError> {
        let tags = encode_tags(&post.tags)?;
        sqlx::query(
            r#"
            INSERT INTO blog_posts (
                id, title, slug, excerpt, content, image, date, likes,
                is_published, tags, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&post.id)
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.image)
        .bind(post.date)
        .bind(post.likes)
        .bind(post.is_published)
        .bind(tags)
        .bind(post.created_at)
        .bind(post.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| map_slug_conflict(error, &post.slug))?;

        Ok(())
    }

    /// Update editable fields of a blog post
    ///
    /// `likes` and `created_at` are never touched here.
    ///
    /// # Returns
    /// `true` if updated, `false` if no matching row exists.
    pub async fn update_blog_post(&self, post: &BlogPost) -> Result<bool, AppError> {
        let tags = encode_tags(&post.tags)?;
        let result = sqlx::query(
            r#"
            UPDATE blog_posts
            SET title = ?, slug = ?, excerpt = ?, content = ?, image = ?, date = ?,
                is_published = ?, tags = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&post.title)
        .bind(&post.slug)
        .bind(&post.excerpt)
        .bind(&post.content)
        .bind(&post.image)
        .bind(post.date)
        .bind(post.is_published)
        .bind(tags)
        .bind(post.updated_at)
        .bind(&post.id)
        .execute(&self.pool)
        .await
        .map_err(|error| map_slug_conflict(error, &post.slug))?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete blog post by ID (its comments go with it)
    pub async fn delete_blog_post(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM blog_posts WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Increment the like counter of a published post
    ///
    /// # Returns
    /// The updated post, or None if no published post has this ID.
    pub async fn increment_blog_post_likes(&self, id: &str) -> Result<Option<BlogPost>, AppError> {
        let result =
            sqlx::query("UPDATE blog_posts SET likes = likes + 1 WHERE id = ? AND is_published = 1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_blog_post(id).await
    }

    // =========================================================================
    // Comments
    // =========================================================================

    /// Get comment by ID
    pub async fn get_comment(&self, id: &str) -> Result<Option<Comment>, AppError> {
        let comment = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(comment)
    }

    /// Insert a new comment or reply
    pub async fn insert_comment(&self, comment: &Comment) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO comments (
                id, blog_id, parent_id, name, email, content, is_approved, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&comment.id)
        .bind(&comment.blog_id)
        .bind(&comment.parent_id)
        .bind(&comment.name)
        .bind(&comment.email)
        .bind(&comment.content)
        .bind(comment.is_approved)
        .bind(comment.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get every comment attached to a blog post, in no particular order
    ///
    /// Includes pending comments and replies; callers decide ordering
    /// and visibility.
    pub async fn get_comments_by_blog(&self, blog_id: &str) -> Result<Vec<Comment>, AppError> {
        let comments = sqlx::query_as::<_, Comment>("SELECT * FROM comments WHERE blog_id = ?")
            .bind(blog_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(comments)
    }

    /// Get every comment across all posts, joined with its post
    pub async fn get_all_comments_with_posts(&self) -> Result<Vec<CommentWithPost>, AppError> {
        let rows = sqlx::query_as::<_, CommentWithPostRow>(
            r#"
            SELECT c.id, c.blog_id, c.parent_id, c.name, c.email, c.content,
                   c.is_approved, c.created_at,
                   p.title AS post_title, p.slug AS post_slug
            FROM comments c
            JOIN blog_posts p ON p.id = c.blog_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(CommentWithPost::from).collect())
    }

    /// Set the approval flag of a comment
    ///
    /// # Returns
    /// `true` if a row matched (even when the flag already had this value).
    pub async fn set_comment_approval(&self, id: &str, approved: bool) -> Result<bool, AppError> {
        let result = sqlx::query("UPDATE comments SET is_approved = ? WHERE id = ?")
            .bind(approved)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a single comment by ID; replies are left in place
    pub async fn delete_comment(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Delete a comment together with its replies in one transaction
    ///
    /// # Returns
    /// Number of rows removed (0 if the comment did not exist).
    pub async fn delete_comment_with_replies(&self, id: &str) -> Result<u64, AppError> {
        let mut tx = self.pool.begin().await?;

        let parent = sqlx::query("DELETE FROM comments WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if parent.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(0);
        }

        let replies = sqlx::query("DELETE FROM comments WHERE parent_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(parent.rows_affected() + replies.rows_affected())
    }

    // =========================================================================
    // Contact messages
    // =========================================================================

    /// Insert a contact form message
    pub async fn insert_contact_message(&self, message: &ContactMessage) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO contact_messages (
                id, name, email, subject, message, is_read, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&message.id)
        .bind(&message.name)
        .bind(&message.email)
        .bind(&message.subject)
        .bind(&message.message)
        .bind(message.is_read)
        .bind(message.created_at)
        .bind(message.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// List contact messages, newest first
    pub async fn list_contact_messages(&self) -> Result<Vec<ContactMessage>, AppError> {
        let messages = sqlx::query_as::<_, ContactMessage>(
            "SELECT * FROM contact_messages ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(messages)
    }

    /// Mark a contact message read or unread
    ///
    /// # Returns
    /// The updated message, or None if it does not exist.
    pub async fn set_contact_message_read(
        &self,
        id: &str,
        is_read: bool,
    ) -> Result<Option<ContactMessage>, AppError> {
        let result =
            sqlx::query("UPDATE contact_messages SET is_read = ?, updated_at = ? WHERE id = ?")
                .bind(is_read)
                .bind(Utc::now())
                .bind(id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let message =
            sqlx::query_as::<_, ContactMessage>("SELECT * FROM contact_messages WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(message)
    }

    /// Delete a contact message
    pub async fn delete_contact_message(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM contact_messages WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Subscribers
    // =========================================================================

    /// Get subscriber by (lowercased) email
    pub async fn get_subscriber_by_email(
        &self,
        email: &str,
    ) -> Result<Option<Subscriber>, AppError> {
        let subscriber = sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers WHERE email = ?")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(subscriber)
    }

    /// Insert a new subscriber
    ///
    /// # Errors
    /// Returns `Conflict` if the email is already present
    pub async fn insert_subscriber(&self, subscriber: &Subscriber) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO subscribers (id, email, name, is_active, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&subscriber.id)
        .bind(&subscriber.email)
        .bind(&subscriber.name)
        .bind(subscriber.is_active)
        .bind(subscriber.created_at)
        .bind(subscriber.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|error| match error {
            sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
                AppError::Conflict("This email is already subscribed".to_string())
            }
            other => AppError::Database(other),
        })?;

        Ok(())
    }

    /// List subscribers, newest first
    pub async fn list_subscribers(&self) -> Result<Vec<Subscriber>, AppError> {
        let subscribers = sqlx::query_as::<_, Subscriber>(
            "SELECT * FROM subscribers ORDER BY created_at DESC, id DESC",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(subscribers)
    }

    /// Set the active flag of a subscriber, optionally updating the name
    ///
    /// # Returns
    /// The updated subscriber, or None if it does not exist.
    pub async fn set_subscriber_active(
        &self,
        id: &str,
        is_active: bool,
        name: Option<&str>,
    ) -> Result<Option<Subscriber>, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE subscribers
            SET is_active = ?, name = COALESCE(?, name), updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(is_active)
        .bind(name)
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        let subscriber = sqlx::query_as::<_, Subscriber>("SELECT * FROM subscribers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(subscriber)
    }

    /// Delete a subscriber
    pub async fn delete_subscriber(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM subscribers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Gallery
    // =========================================================================

    /// Get gallery image by ID
    pub async fn get_gallery_image(&self, id: &str) -> Result<Option<GalleryImage>, AppError> {
        let image = sqlx::query_as::<_, GalleryImage>("SELECT * FROM gallery_images WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(image)
    }

    /// List gallery images by display order
    ///
    /// # Arguments
    /// * `active_only` - Exclude hidden images
    pub async fn list_gallery_images(
        &self,
        active_only: bool,
    ) -> Result<Vec<GalleryImage>, AppError> {
        let filter = if active_only {
            "WHERE is_active = 1"
        } else {
            ""
        };
        let query = format!(
            "SELECT * FROM gallery_images {filter} ORDER BY display_order ASC, created_at ASC, id ASC"
        );
        let images = sqlx::query_as::<_, GalleryImage>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(images)
    }

    /// Insert or fully replace a gallery image
    pub async fn upsert_gallery_image(&self, image: &GalleryImage) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO gallery_images (
                id, title, description, image_url, display_order, is_active,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                title = excluded.title,
                description = excluded.description,
                image_url = excluded.image_url,
                display_order = excluded.display_order,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&image.id)
        .bind(&image.title)
        .bind(&image.description)
        .bind(&image.image_url)
        .bind(image.display_order)
        .bind(image.is_active)
        .bind(image.created_at)
        .bind(image.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete a gallery image
    pub async fn delete_gallery_image(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM gallery_images WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Social links
    // =========================================================================

    /// Get social link by ID
    pub async fn get_social_link(&self, id: &str) -> Result<Option<SocialLink>, AppError> {
        let link = sqlx::query_as::<_, SocialLink>("SELECT * FROM social_links WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(link)
    }

    /// List social links by display order
    ///
    /// # Arguments
    /// * `active_only` - Exclude hidden links
    pub async fn list_social_links(&self, active_only: bool) -> Result<Vec<SocialLink>, AppError> {
        let filter = if active_only {
            "WHERE is_active = 1"
        } else {
            ""
        };
        let query = format!(
            "SELECT * FROM social_links {filter} ORDER BY display_order ASC, created_at ASC, id ASC"
        );
        let links = sqlx::query_as::<_, SocialLink>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(links)
    }

    /// Insert or fully replace a social link
    pub async fn upsert_social_link(&self, link: &SocialLink) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO social_links (
                id, platform, url, display_order, is_active, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                platform = excluded.platform,
                url = excluded.url,
                display_order = excluded.display_order,
                is_active = excluded.is_active,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&link.id)
        .bind(&link.platform)
        .bind(&link.url)
        .bind(link.display_order)
        .bind(link.is_active)
        .bind(link.created_at)
        .bind(link.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Flip the active flag of a social link
    ///
    /// # Returns
    /// The updated link, or None if it does not exist.
    pub async fn toggle_social_link(&self, id: &str) -> Result<Option<SocialLink>, AppError> {
        let result = sqlx::query(
            "UPDATE social_links SET is_active = NOT is_active, updated_at = ? WHERE id = ?",
        )
        .bind(Utc::now())
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }

        self.get_social_link(id).await
    }

    /// Delete a social link
    pub async fn delete_social_link(&self, id: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM social_links WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Count records for the admin dashboard in a single round trip
    pub async fn dashboard_counts(&self) -> Result<DashboardCounts, AppError> {
        let counts = sqlx::query_as::<_, DashboardCounts>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM blog_posts) AS posts_total,
                (SELECT COUNT(*) FROM blog_posts WHERE is_published = 1) AS posts_published,
                (SELECT COUNT(*) FROM comments) AS comments_total,
                (SELECT COUNT(*) FROM comments WHERE is_approved = 0) AS comments_pending,
                (SELECT COUNT(*) FROM gallery_images) AS gallery_images,
                (SELECT COUNT(*) FROM social_links) AS social_total,
                (SELECT COUNT(*) FROM social_links WHERE is_active = 1) AS social_active,
                (SELECT COUNT(*) FROM contact_messages WHERE is_read = 0) AS unread_messages,
                (SELECT COUNT(*) FROM subscribers WHERE is_active = 1) AS active_subscribers
            "#,
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(counts)
    }
}

fn map_slug_conflict(error: sqlx::Error, slug: &str) -> AppError {
    match error {
        sqlx::Error::Database(db_error) if db_error.is_unique_violation() => {
            AppError::Conflict(format!("A blog post with slug '{slug}' already exists"))
        }
        other => AppError::Database(other),
    }
}
