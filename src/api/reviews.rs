use axum::{
    Json,
    extract::{Path, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::get_session_username;
use super::{ApiError, ApiResponse, AppState, MessageResponse, ReviewDto};

#[derive(Deserialize)]
pub struct AddReviewRequest {
    pub rating: i32,
    pub comment: String,
}

/// POST /articles/{id}/reviews
/// Create the review, then attach it to the article's review set.
pub async fn add_review(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(article_id): Path<i32>,
    Json(payload): Json<AddReviewRequest>,
) -> Result<Json<ApiResponse<ReviewDto>>, ApiError> {
    let username = get_session_username(&session).await?;

    let comment = payload.comment.trim().to_string();
    if comment.is_empty() {
        return Err(ApiError::validation("Comment text is required"));
    }
    if !(1..=5).contains(&payload.rating) {
        return Err(ApiError::validation("Rating must be between 1 and 5"));
    }

    state
        .store()
        .get_article(article_id)
        .await?
        .ok_or_else(|| ApiError::article_not_found(article_id))?;

    let review = state
        .store()
        .create_review(payload.rating, &comment, &username)
        .await?;

    state
        .store()
        .attach_review_to_article(article_id, review.id)
        .await?;

    Ok(Json(ApiResponse::success_with_message(
        ReviewDto::from(review),
        "Your comment has been added",
    )))
}

/// DELETE /articles/{id}/reviews/{review_id}
/// Any logged-in user may remove a review; there is no authorship check.
pub async fn delete_review(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path((article_id, review_id)): Path<(i32, i32)>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    get_session_username(&session).await?;

    state.cascades().delete_review(article_id, review_id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "The comment has been deleted".to_string(),
    })))
}
