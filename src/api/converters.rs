//! Conversion functions between data models, service inputs and API DTOs

use crate::api::dto::*;
use crate::data::{
    BlogPost, BlogPostSummary, Comment, CommentWithPost, ContactMessage, DashboardCounts,
    GalleryImage, SocialLink, Subscriber,
};
use crate::service::{
    BlogPostInput, CommentInput, CommentThread, ContactInput, GalleryImageInput, SocialLinkInput,
    SubscriptionInput,
};

/// Convert BlogPost to BlogPostResponse
pub fn blog_post_to_response(post: BlogPost) -> BlogPostResponse {
    BlogPostResponse {
        id: post.id,
        title: post.title,
        slug: post.slug,
        excerpt: post.excerpt,
        content: post.content,
        image: post.image,
        date: post.date,
        likes: post.likes,
        is_published: post.is_published,
        tags: post.tags,
        created_at: post.created_at,
        updated_at: post.updated_at,
    }
}

fn post_summary_to_response(post: BlogPostSummary) -> PostSummaryResponse {
    PostSummaryResponse {
        id: post.id,
        title: post.title,
        slug: post.slug,
    }
}

/// Public view of a single comment (email stripped)
pub fn comment_to_public_response(comment: Comment) -> PublicCommentResponse {
    PublicCommentResponse {
        id: comment.id,
        blog_id: comment.blog_id,
        parent_id: comment.parent_id,
        name: comment.name,
        content: comment.content,
        is_approved: comment.is_approved,
        created_at: comment.created_at,
        replies: None,
    }
}

/// Public view of a comment thread
pub fn thread_to_response(thread: CommentThread) -> PublicCommentResponse {
    let replies = thread
        .replies
        .into_iter()
        .map(comment_to_public_response)
        .collect();

    PublicCommentResponse {
        replies: Some(replies),
        ..comment_to_public_response(thread.comment)
    }
}

/// Moderator view of a comment
pub fn comment_to_moderation_response(comment: Comment) -> ModerationCommentResponse {
    ModerationCommentResponse {
        id: comment.id,
        blog_id: comment.blog_id,
        parent_id: comment.parent_id,
        name: comment.name,
        email: comment.email,
        content: comment.content,
        is_approved: comment.is_approved,
        created_at: comment.created_at,
        blog: None,
    }
}

/// Moderator view of a comment with its post
pub fn comment_with_post_to_response(row: CommentWithPost) -> ModerationCommentResponse {
    ModerationCommentResponse {
        blog: Some(post_summary_to_response(row.post)),
        ..comment_to_moderation_response(row.comment)
    }
}

/// Convert ContactMessage to ContactMessageResponse
pub fn contact_message_to_response(message: ContactMessage) -> ContactMessageResponse {
    ContactMessageResponse {
        id: message.id,
        name: message.name,
        email: message.email,
        subject: message.subject,
        message: message.message,
        is_read: message.is_read,
        created_at: message.created_at,
        updated_at: message.updated_at,
    }
}

/// Convert Subscriber to SubscriberResponse
pub fn subscriber_to_response(subscriber: Subscriber) -> SubscriberResponse {
    SubscriberResponse {
        id: subscriber.id,
        email: subscriber.email,
        name: subscriber.name,
        is_active: subscriber.is_active,
        created_at: subscriber.created_at,
        updated_at: subscriber.updated_at,
    }
}

/// Convert GalleryImage to GalleryImageResponse
pub fn gallery_image_to_response(image: GalleryImage) -> GalleryImageResponse {
    GalleryImageResponse {
        id: image.id,
        title: image.title,
        description: image.description,
        image_url: image.image_url,
        display_order: image.display_order,
        is_active: image.is_active,
        created_at: image.created_at,
        updated_at: image.updated_at,
    }
}

/// Convert SocialLink to SocialLinkResponse
pub fn social_link_to_response(link: SocialLink) -> SocialLinkResponse {
    SocialLinkResponse {
        id: link.id,
        platform: link.platform,
        url: link.url,
        display_order: link.display_order,
        is_active: link.is_active,
        created_at: link.created_at,
        updated_at: link.updated_at,
    }
}

/// Convert DashboardCounts to DashboardResponse
pub fn dashboard_to_response(counts: DashboardCounts) -> DashboardResponse {
    DashboardResponse {
        blog_posts: PostStats {
            total: counts.posts_total,
            published: counts.posts_published,
            drafts: counts.posts_total - counts.posts_published,
        },
        comments: CommentStats {
            total: counts.comments_total,
            pending: counts.comments_pending,
        },
        gallery_images: counts.gallery_images,
        social_links: SocialStats {
            total: counts.social_total,
            active: counts.social_active,
            inactive: counts.social_total - counts.social_active,
        },
        unread_messages: counts.unread_messages,
        active_subscribers: counts.active_subscribers,
    }
}

// =============================================================================
// Requests
// =============================================================================

impl From<CommentRequest> for CommentInput {
    fn from(request: CommentRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
            content: request.content,
        }
    }
}

impl From<ContactRequest> for ContactInput {
    fn from(request: ContactRequest) -> Self {
        Self {
            name: request.name,
            email: request.email,
            subject: request.subject,
            message: request.message,
        }
    }
}

impl From<SubscriptionRequest> for SubscriptionInput {
    fn from(request: SubscriptionRequest) -> Self {
        Self {
            email: request.email,
            name: request.name,
        }
    }
}

impl From<BlogPostRequest> for BlogPostInput {
    fn from(request: BlogPostRequest) -> Self {
        Self {
            title: request.title,
            slug: request.slug,
            excerpt: request.excerpt,
            content: request.content,
            image: request.image,
            date: request.date,
            is_published: request.is_published,
            tags: request.tags,
        }
    }
}

impl From<GalleryImageRequest> for GalleryImageInput {
    fn from(request: GalleryImageRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            image_url: request.image_url,
            display_order: request.display_order,
            is_active: request.is_active,
        }
    }
}

impl From<SocialLinkRequest> for SocialLinkInput {
    fn from(request: SocialLinkRequest) -> Self {
        Self {
            platform: request.platform,
            url: request.url,
            display_order: request.display_order,
            is_active: request.is_active,
        }
    }
}
