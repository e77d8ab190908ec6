//! Admin API endpoints
//!
//! Back-office endpoints for the moderator.
//! All routes require authentication; `build_router` wraps this router
//! in [`crate::auth::require_auth`].

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
};

use super::converters::*;
use super::dto::*;
use crate::AppState;
use crate::error::AppError;
use crate::service::with_deadline;

/// Create admin router
///
/// Routes (nested under /api/admin):
/// - GET /dashboard - Site statistics
/// - GET|POST /blog, GET|PUT|DELETE /blog/:id - Blog posts
/// - GET /blog/:id/comments - Every comment of a post
/// - GET /comments - Every comment with its post
/// - PUT /comments/:id/approve, PUT /comments/:id/unapprove, DELETE /comments/:id
/// - GET /messages, PUT /messages/:id/read, PUT /messages/:id/unread, DELETE /messages/:id
/// - GET /subscribers, PUT /subscribers/:id/active, DELETE /subscribers/:id
/// - GET|POST /gallery, PUT|DELETE /gallery/:id
/// - GET|POST /social, PUT|DELETE /social/:id, PUT /social/:id/toggle
pub fn admin_router() -> Router<AppState> {
    Router::new()
        .route("/dashboard", get(dashboard))
        // Blog posts
        .route("/blog", get(list_posts).post(create_post))
        .route(
            "/blog/:id",
            get(get_post).put(update_post).delete(delete_post),
        )
        .route("/blog/:id/comments", get(list_post_comments))
        // Comment moderation
        .route("/comments", get(list_all_comments))
        .route("/comments/:id/approve", put(approve_comment))
        .route("/comments/:id/unapprove", put(unapprove_comment))
        .route("/comments/:id", axum::routing::delete(delete_comment))
        // Contact messages
        .route("/messages", get(list_messages))
        .route("/messages/:id/read", put(mark_message_read))
        .route("/messages/:id/unread", put(mark_message_unread))
        .route("/messages/:id", axum::routing::delete(delete_message))
        // Subscribers
        .route("/subscribers", get(list_subscribers))
        .route("/subscribers/:id/active", put(set_subscriber_active))
        .route("/subscribers/:id", axum::routing::delete(delete_subscriber))
        // Gallery
        .route("/gallery", get(list_gallery).post(create_gallery_image))
        .route(
            "/gallery/:id",
            put(update_gallery_image).delete(delete_gallery_image),
        )
        // Social links
        .route("/social", get(list_social).post(create_social_link))
        .route(
            "/social/:id",
            put(update_social_link).delete(delete_social_link),
        )
        .route("/social/:id/toggle", put(toggle_social_link))
}

type Created<T> = (StatusCode, Json<ApiResponse<T>>);

fn deleted(what: &str) -> Json<ApiResponse<MessageResponse>> {
    Json(ApiResponse::ok(MessageResponse::new(format!(
        "{what} deleted"
    ))))
}

// =============================================================================
// Dashboard
// =============================================================================

/// GET /api/admin/dashboard
async fn dashboard(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<DashboardResponse>>, AppError> {
    let counts = with_deadline(
        "content store",
        "dashboard_counts",
        state.config.comments.store_timeout(),
        state.db.dashboard_counts(),
    )
    .await?;

    Ok(Json(ApiResponse::ok(dashboard_to_response(counts))))
}

// =============================================================================
// Blog posts
// =============================================================================

/// GET /api/admin/blog
///
/// Drafts included.
async fn list_posts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BlogPostResponse>>>, AppError> {
    let posts = state.blog.list_all().await?;
    Ok(Json(ApiResponse::list(
        posts.into_iter().map(blog_post_to_response).collect(),
    )))
}

/// POST /api/admin/blog
async fn create_post(
    State(state): State<AppState>,
    Json(request): Json<BlogPostRequest>,
) -> Result<Created<BlogPostResponse>, AppError> {
    let post = state.blog.create(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(blog_post_to_response(post))),
    ))
}

/// GET /api/admin/blog/:id
async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BlogPostResponse>>, AppError> {
    let post = state.blog.get(&id).await?;
    Ok(Json(ApiResponse::ok(blog_post_to_response(post))))
}

/// PUT /api/admin/blog/:id
async fn update_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<BlogPostRequest>,
) -> Result<Json<ApiResponse<BlogPostResponse>>, AppError> {
    let post = state.blog.update(&id, request.into()).await?;
    Ok(Json(ApiResponse::ok(blog_post_to_response(post))))
}

/// DELETE /api/admin/blog/:id
///
/// The post's comments go with it.
async fn delete_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    state.blog.delete(&id).await?;
    Ok(deleted("Blog post"))
}

// =============================================================================
// Comment moderation
// =============================================================================

/// GET /api/admin/blog/:id/comments
async fn list_post_comments(
    State(state): State<AppState>,
    Path(blog_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<ModerationCommentResponse>>>, AppError> {
    let comments = state.comments.list_for_moderation(&blog_id).await?;
    Ok(Json(ApiResponse::list(
        comments
            .into_iter()
            .map(comment_to_moderation_response)
            .collect(),
    )))
}

/// GET /api/admin/comments
async fn list_all_comments(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ModerationCommentResponse>>>, AppError> {
    let rows = state.comments.list_all_for_moderation().await?;
    Ok(Json(ApiResponse::list(
        rows.into_iter().map(comment_with_post_to_response).collect(),
    )))
}

/// PUT /api/admin/comments/:id/approve
async fn approve_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ModerationCommentResponse>>, AppError> {
    let comment = state.comments.approve(&id).await?;
    Ok(Json(ApiResponse::ok(comment_to_moderation_response(
        comment,
    ))))
}

/// PUT /api/admin/comments/:id/unapprove
async fn unapprove_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ModerationCommentResponse>>, AppError> {
    let comment = state.comments.revoke_approval(&id).await?;
    Ok(Json(ApiResponse::ok(comment_to_moderation_response(
        comment,
    ))))
}

/// DELETE /api/admin/comments/:id
async fn delete_comment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    state.comments.delete(&id).await?;
    Ok(deleted("Comment"))
}

// =============================================================================
// Contact messages
// =============================================================================

/// GET /api/admin/messages
async fn list_messages(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<ContactMessageResponse>>>, AppError> {
    let messages = state.outreach.list_messages().await?;
    Ok(Json(ApiResponse::list(
        messages
            .into_iter()
            .map(contact_message_to_response)
            .collect(),
    )))
}

/// PUT /api/admin/messages/:id/read
async fn mark_message_read(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ContactMessageResponse>>, AppError> {
    let message = state.outreach.set_message_read(&id, true).await?;
    Ok(Json(ApiResponse::ok(contact_message_to_response(message))))
}

/// PUT /api/admin/messages/:id/unread
async fn mark_message_unread(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ContactMessageResponse>>, AppError> {
    let message = state.outreach.set_message_read(&id, false).await?;
    Ok(Json(ApiResponse::ok(contact_message_to_response(message))))
}

/// DELETE /api/admin/messages/:id
async fn delete_message(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    state.outreach.delete_message(&id).await?;
    Ok(deleted("Message"))
}

// =============================================================================
// Subscribers
// =============================================================================

/// GET /api/admin/subscribers
async fn list_subscribers(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SubscriberResponse>>>, AppError> {
    let subscribers = state.outreach.list_subscribers().await?;
    Ok(Json(ApiResponse::list(
        subscribers.into_iter().map(subscriber_to_response).collect(),
    )))
}

/// PUT /api/admin/subscribers/:id/active
async fn set_subscriber_active(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<ApiResponse<SubscriberResponse>>, AppError> {
    let subscriber = state
        .outreach
        .set_subscriber_active(&id, request.is_active)
        .await?;
    Ok(Json(ApiResponse::ok(subscriber_to_response(subscriber))))
}

/// DELETE /api/admin/subscribers/:id
async fn delete_subscriber(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    state.outreach.delete_subscriber(&id).await?;
    Ok(deleted("Subscriber"))
}

// =============================================================================
// Gallery
// =============================================================================

/// GET /api/admin/gallery
///
/// Inactive images included.
async fn list_gallery(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<GalleryImageResponse>>>, AppError> {
    let images = state.showcase.list_gallery(false).await?;
    Ok(Json(ApiResponse::list(
        images.into_iter().map(gallery_image_to_response).collect(),
    )))
}

/// POST /api/admin/gallery
async fn create_gallery_image(
    State(state): State<AppState>,
    Json(request): Json<GalleryImageRequest>,
) -> Result<Created<GalleryImageResponse>, AppError> {
    let image = state.showcase.create_gallery_image(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(gallery_image_to_response(image))),
    ))
}

/// PUT /api/admin/gallery/:id
async fn update_gallery_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<GalleryImageRequest>,
) -> Result<Json<ApiResponse<GalleryImageResponse>>, AppError> {
    let image = state
        .showcase
        .update_gallery_image(&id, request.into())
        .await?;
    Ok(Json(ApiResponse::ok(gallery_image_to_response(image))))
}

/// DELETE /api/admin/gallery/:id
async fn delete_gallery_image(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    state.showcase.delete_gallery_image(&id).await?;
    Ok(deleted("Gallery image"))
}

// =============================================================================
// Social links
// =============================================================================

/// GET /api/admin/social
async fn list_social(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SocialLinkResponse>>>, AppError> {
    let links = state.showcase.list_social(false).await?;
    Ok(Json(ApiResponse::list(
        links.into_iter().map(social_link_to_response).collect(),
    )))
}

/// POST /api/admin/social
async fn create_social_link(
    State(state): State<AppState>,
    Json(request): Json<SocialLinkRequest>,
) -> Result<Created<SocialLinkResponse>, AppError> {
    let link = state.showcase.create_social_link(request.into()).await?;
    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(social_link_to_response(link))),
    ))
}

/// PUT /api/admin/social/:id
async fn update_social_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SocialLinkRequest>,
) -> Result<Json<ApiResponse<SocialLinkResponse>>, AppError> {
    let link = state
        .showcase
        .update_social_link(&id, request.into())
        .await?;
    Ok(Json(ApiResponse::ok(social_link_to_response(link))))
}

/// PUT /api/admin/social/:id/toggle
async fn toggle_social_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SocialLinkResponse>>, AppError> {
    let link = state.showcase.toggle_social_link(&id).await?;
    Ok(Json(ApiResponse::ok(social_link_to_response(link))))
}

/// DELETE /api/admin/social/:id
async fn delete_social_link(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<MessageResponse>>, AppError> {
    state.showcase.delete_social_link(&id).await?;
    Ok(deleted("Social link"))
}
