//! Public site endpoints: gallery, social links, contact and newsletter

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use super::converters::{
    gallery_image_to_response, social_link_to_response, subscriber_to_response,
};
use super::dto::{
    ApiResponse, ContactRequest, GalleryImageResponse, MessageResponse, SocialLinkResponse,
    SubscriberResponse, SubscriptionRequest,
};
use crate::AppState;
use crate::error::AppError;

/// Create public site router
///
/// Routes:
/// - GET /api/gallery - Active gallery images
/// - GET /api/social - Active social links
/// - POST /api/contact - Contact form
/// - POST /api/subscription - Newsletter signup
pub fn site_router() -> Router<AppState> {
    Router::new()
        .route("/api/gallery", get(list_gallery))
        .route("/api/social", get(list_social))
        .route("/api/contact", post(submit_contact))
        .route("/api/subscription", post(subscribe))
}

/// GET /api/gallery
async fn list_gallery(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<GalleryImageResponse>>>, AppError> {
    let images = state.showcase.list_gallery(true).await?;
    Ok(Json(ApiResponse::list(
        images.into_iter().map(gallery_image_to_response).collect(),
    )))
}

/// GET /api/social
async fn list_social(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<SocialLinkResponse>>>, AppError> {
    let links = state.showcase.list_social(true).await?;
    Ok(Json(ApiResponse::list(
        links.into_iter().map(social_link_to_response).collect(),
    )))
}

/// POST /api/contact
///
/// The stored message is only visible to the moderator, so the response
/// just confirms receipt.
async fn submit_contact(
    State(state): State<AppState>,
    Json(request): Json<ContactRequest>,
) -> Result<(StatusCode, Json<ApiResponse<MessageResponse>>), AppError> {
    let token = request.recaptcha_token.clone();
    state.outreach.submit_contact(request.into(), &token).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(MessageResponse::new(
            "Thank you for your message",
        ))),
    ))
}

/// POST /api/subscription
async fn subscribe(
    State(state): State<AppState>,
    Json(request): Json<SubscriptionRequest>,
) -> Result<(StatusCode, Json<ApiResponse<SubscriberResponse>>), AppError> {
    let token = request.recaptcha_token.clone();
    let subscriber = state.outreach.subscribe(request.into(), &token).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(subscriber_to_response(subscriber))),
    ))
}
