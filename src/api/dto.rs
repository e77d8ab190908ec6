//! API request and response DTOs
//!
//! Field names are camelCase and record IDs serialize as `_id`, the shape
//! the site front-end consumes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Envelope
// =============================================================================

/// Success envelope: `{"success": true, "data": ..., "count"?: n}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            count: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> Self {
        let count = data.len();
        Self {
            success: true,
            data,
            count: Some(count),
        }
    }
}

/// Payload for operations that only confirm success
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// =============================================================================
// Blog
// =============================================================================

/// Blog post response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPostResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
    pub excerpt: String,
    pub content: String,
    pub image: Option<String>,
    pub date: DateTime<Utc>,
    pub likes: i64,
    pub is_published: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Blog post create/update request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BlogPostRequest {
    pub title: String,
    pub slug: Option<String>,
    pub excerpt: String,
    pub content: String,
    pub image: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub is_published: bool,
    pub tags: Vec<String>,
}

/// Post reference carried by moderation rows
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostSummaryResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub slug: String,
}

// =============================================================================
// Comments
// =============================================================================

/// Comment or reply submission
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CommentRequest {
    pub name: String,
    pub email: String,
    pub content: String,
    pub recaptcha_token: String,
}

/// Comment as shown publicly; never carries the author's email
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicCommentResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub blog_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    /// Present on top-level comments only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replies: Option<Vec<PublicCommentResponse>>,
}

/// Comment as shown to moderators
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModerationCommentResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub blog_id: String,
    pub parent_id: Option<String>,
    pub name: String,
    pub email: String,
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blog: Option<PostSummaryResponse>,
}

// =============================================================================
// Contact & subscriptions
// =============================================================================

/// Contact form submission
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub recaptcha_token: String,
}

/// Contact message response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessageResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Newsletter subscription request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionRequest {
    pub email: String,
    pub name: Option<String>,
    pub recaptcha_token: String,
}

/// Subscriber response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriberResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Toggle request for records with an active flag
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetActiveRequest {
    pub is_active: bool,
}

// =============================================================================
// Gallery & social
// =============================================================================

fn default_true() -> bool {
    true
}

/// Gallery image create/update request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Gallery image response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GalleryImageResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Social link create/update request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinkRequest {
    #[serde(default)]
    pub platform: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub display_order: i64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// Social link response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SocialLinkResponse {
    #[serde(rename = "_id")]
    pub id: String,
    pub platform: String,
    pub url: String,
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Dashboard
// =============================================================================

/// Admin dashboard statistics
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardResponse {
    pub blog_posts: PostStats,
    pub comments: CommentStats,
    pub gallery_images: i64,
    pub social_links: SocialStats,
    pub unread_messages: i64,
    pub active_subscribers: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostStats {
    pub total: i64,
    pub published: i64,
    pub drafts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentStats {
    pub total: i64,
    pub pending: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialStats {
    pub total: i64,
    pub active: i64,
    pub inactive: i64,
}

// =============================================================================
// Auth
// =============================================================================

/// Moderator login request
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Moderator session info
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub username: String,
    pub expires_at: DateTime<Utc>,
    /// Only returned on login
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}
