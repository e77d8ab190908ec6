//! Data models
//!
//! Rust structs representing Content Store records.
//! All models use ULID for IDs and chrono for timestamps.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// ID Types
// =============================================================================

/// Entity ID wrapper (ULID format, 26 characters)
///
/// Example: "01ARZ3NDEKTSV4RRFFQ69G5FAV"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub String);

impl EntityId {
    /// Generate a new ULID
    pub fn new() -> Self {
        Self(ulid::Ulid::new().to_string())
    }

    /// Create from existing string
    pub fn from_string(s: String) -> Self {
        Self(s)
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Blog posts
// =============================================================================

/// A published or draft blog post
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlogPost {
    pub id: String,
    pub title: String,
    /// URL-safe unique key
    pub slug: String,
    pub excerpt: String,
    /// Sanitized HTML body
    pub content: String,
    /// Cover image URL
    pub image: Option<String>,
    /// Display date chosen by the author
    pub date: DateTime<Utc>,
    /// Only ever incremented
    pub likes: i64,
    pub is_published: bool,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Minimal post reference attached to moderation rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogPostSummary {
    pub id: String,
    pub title: String,
    pub slug: String,
}

// =============================================================================
// Comments
// =============================================================================

/// A comment or reply attached to a blog post
///
/// `parent_id = None` marks a top-level comment. Replies point at a
/// top-level comment only; the parent may have been deleted since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Comment {
    pub id: String,
    pub blog_id: String,
    pub parent_id: Option<String>,
    /// Author display name
    pub name: String,
    /// Moderation contact only, never shown publicly
    pub email: String,
    /// Plain text body
    pub content: String,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
}

impl Comment {
    pub fn is_reply(&self) -> bool {
        self.parent_id.is_some()
    }
}

/// Comment joined with the post it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentWithPost {
    pub comment: Comment,
    pub post: BlogPostSummary,
}

// =============================================================================
// Contact & subscriptions
// =============================================================================

/// Message sent through the public contact form
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct ContactMessage {
    pub id: String,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub is_read: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Newsletter subscriber
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscriber {
    pub id: String,
    /// Stored lowercased; unique
    pub email: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Showcase (gallery + social)
// =============================================================================

/// Gallery image shown on the home page
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct GalleryImage {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub image_url: String,
    /// Sort key, ascending
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Link to an external social media post or profile
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SocialLink {
    pub id: String,
    /// Values: instagram, facebook, twitter
    pub platform: String,
    pub url: String,
    /// Sort key, ascending
    pub display_order: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Supported social platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialPlatform {
    Instagram,
    Facebook,
    Twitter,
}

impl SocialPlatform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Facebook => "facebook",
            Self::Twitter => "twitter",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "instagram" => Some(Self::Instagram),
            "facebook" => Some(Self::Facebook),
            "twitter" => Some(Self::Twitter),
            _ => None,
        }
    }
}

// =============================================================================
// Dashboard
// =============================================================================

/// Aggregate counts for the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct DashboardCounts {
    pub posts_total: i64,
    pub posts_published: i64,
    pub comments_total: i64,
    pub comments_pending: i64,
    pub gallery_images: i64,
    pub social_total: i64,
    pub social_active: i64,
    pub unread_messages: i64,
    pub active_subscribers: i64,
}
