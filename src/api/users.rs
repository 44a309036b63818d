use axum::{
    Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{SESSION_USER_KEY, get_session_user};
use super::{
    ApiError, ApiResponse, AppState, ArticleSummaryDto, MessageResponse, PROFILE_EXCERPT_CHARS,
    PROFILE_EXCERPT_SUFFIX, UserDto,
};
use crate::db::ProfileUpdate;
use crate::db::repositories::user::hash_password_blocking;

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub username: String,
    pub bio: String,
    /// Current password; doubles as the stored one after the save because
    /// every profile save re-hashes and persists whatever was supplied.
    pub password: String,
}

#[derive(Serialize)]
pub struct ProfileResponse {
    pub user: UserDto,
    pub posts: Vec<ArticleSummaryDto>,
}

/// GET /users/{username}
/// Public profile: the user and their articles, newest first.
pub async fn get_profile(
    State(state): State<Arc<AppState>>,
    Path(username): Path<String>,
) -> Result<Json<ApiResponse<ProfileResponse>>, ApiError> {
    let user = state
        .store()
        .get_user_by_username(&username)
        .await?
        .ok_or_else(|| ApiError::not_found("User", &username))?;

    let posts = state
        .store()
        .find_articles_by_owner(&user.username)
        .await?
        .into_iter()
        .map(|a| ArticleSummaryDto::from_article(a, PROFILE_EXCERPT_CHARS, PROFILE_EXCERPT_SUFFIX))
        .collect();

    Ok(Json(ApiResponse::success(ProfileResponse {
        user: UserDto::from(user),
        posts,
    })))
}

/// PUT /users/me
/// Profile save. Requires the current password even for unrelated field
/// changes; a username change is propagated through articles, reviews and
/// likes before the user record is rewritten.
pub async fn update_profile(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = get_session_user(&state, &session).await?;

    let name = payload.name.trim().to_string();
    let username = payload.username.trim().to_string();
    let bio = payload.bio.trim().to_string();

    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }

    let password_ok = state
        .store()
        .verify_user_password(&user.username, &payload.password)
        .await?;
    if !password_ok {
        return Err(ApiError::Unauthorized(
            "Current password is incorrect".to_string(),
        ));
    }

    if name == user.name && username == user.username && bio == user.bio {
        return Ok(Json(ApiResponse::success_with_message(
            UserDto::from(user),
            "No user data was updated",
        )));
    }

    // Always re-derive the hash on save, even when the password is unchanged.
    let security = state.config().read().await.security.clone();
    let password_hash = hash_password_blocking(&payload.password, Some(&security)).await?;

    let renamed = username != user.username;

    let updated = state
        .cascades()
        .update_profile(
            user.id,
            ProfileUpdate {
                name,
                username: username.clone(),
                bio,
                password_hash,
            },
        )
        .await?;

    // Refresh this session's identity snapshot. Other live sessions of the
    // same account keep the old name until they log in again.
    if renamed {
        session
            .insert(SESSION_USER_KEY, &updated.username)
            .await
            .map_err(|e| ApiError::internal(format!("Failed to update session: {e}")))?;
    }

    Ok(Json(ApiResponse::success_with_message(
        UserDto::from(updated),
        "Your profile has been successfully updated.",
    )))
}

/// DELETE /users/me
/// Account deletion with the full cascade, then session teardown.
pub async fn delete_account(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let user = get_session_user(&state, &session).await?;

    state.cascades().delete_user(user.id).await?;

    let _ = session.flush().await;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Your account has been successfully deleted.".to_string(),
    })))
}
