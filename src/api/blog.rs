//! Public blog and comment endpoints

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
};

use super::converters::{
    blog_post_to_response, comment_to_public_response, thread_to_response,
};
use super::dto::{ApiResponse, BlogPostResponse, CommentRequest, PublicCommentResponse};
use crate::AppState;
use crate::error::AppError;

/// Create public blog router
///
/// Routes:
/// - GET /api/blog - Published posts, newest first
/// - GET /api/blog/:post - Published post by slug
/// - PUT /api/blog/:post/like - Like a post (by id)
/// - GET /api/blog/:post/comments - Approved comment threads (by post id)
/// - POST /api/blog/:post/comments - Submit a comment (by post id)
/// - POST /api/comments/:comment_id/replies - Reply to a top-level comment
pub fn blog_router() -> Router<AppState> {
    Router::new()
        .route("/api/blog", get(list_posts))
        .route("/api/blog/:post", get(get_post))
        .route("/api/blog/:post/like", put(like_post))
        .route(
            "/api/blog/:post/comments",
            get(list_comments).post(submit_comment),
        )
        .route("/api/comments/:comment_id/replies", post(submit_reply))
}

// =============================================================================
// Posts
// =============================================================================

/// GET /api/blog
async fn list_posts(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<BlogPostResponse>>>, AppError> {
    let posts = state.blog.list_published().await?;
    Ok(Json(ApiResponse::list(
        posts.into_iter().map(blog_post_to_response).collect(),
    )))
}

/// GET /api/blog/:post
async fn get_post(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<ApiResponse<BlogPostResponse>>, AppError> {
    let post = state.blog.get_published_by_slug(&slug).await?;
    Ok(Json(ApiResponse::ok(blog_post_to_response(post))))
}

/// PUT /api/blog/:post/like
async fn like_post(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<BlogPostResponse>>, AppError> {
    let post = state.blog.like(&id).await?;
    Ok(Json(ApiResponse::ok(blog_post_to_response(post))))
}

// =============================================================================
// Comments
// =============================================================================

/// GET /api/blog/:post/comments
///
/// Approved top-level comments, each with its approved replies. `count`
/// is the number of threads.
async fn list_comments(
    State(state): State<AppState>,
    Path(blog_id): Path<String>,
) -> Result<Json<ApiResponse<Vec<PublicCommentResponse>>>, AppError> {
    let threads = state.comments.list_for_public_display(&blog_id).await?;
    Ok(Json(ApiResponse::list(
        threads.into_iter().map(thread_to_response).collect(),
    )))
}

/// POST /api/blog/:post/comments
///
/// The stored comment is pending until a moderator approves it.
async fn submit_comment(
    State(state): State<AppState>,
    Path(blog_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PublicCommentResponse>>), AppError> {
    let token = request.recaptcha_token.clone();
    let comment = state
        .comments
        .submit_comment(&blog_id, request.into(), &token)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(comment_to_public_response(comment))),
    ))
}

/// POST /api/comments/:comment_id/replies
async fn submit_reply(
    State(state): State<AppState>,
    Path(parent_id): Path<String>,
    Json(request): Json<CommentRequest>,
) -> Result<(StatusCode, Json<ApiResponse<PublicCommentResponse>>), AppError> {
    let token = request.recaptcha_token.clone();
    let reply = state
        .comments
        .submit_reply(&parent_id, request.into(), &token)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(comment_to_public_response(reply))),
    ))
}
