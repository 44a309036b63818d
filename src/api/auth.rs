use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::{ApiError, ApiResponse, AppState, MessageResponse, UserDto};
use crate::clients::mail::Delivery;
use crate::db::{NewUser, User};
use crate::db::repositories::user::hash_password_blocking;

pub const SESSION_USER_KEY: &str = "user";

const INVALID_LOGIN_MESSAGE: &str = "Please enter valid credentials.";

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default)]
    pub avatar_url: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct ForgotPasswordRequest {
    pub username: String,
    pub new_password: String,
    pub confirm_password: String,
}

#[derive(Deserialize)]
pub struct VerifyResetRequest {
    pub username: String,
    pub code: i32,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware: requires a logged-in session. The session
/// carries the username as a point-in-time snapshot; a rename rewrites it,
/// other sessions of the same account stay stale until their next login.
pub async fn auth_middleware(
    session: Session,
    request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    if let Ok(Some(user)) = session.get::<String>(SESSION_USER_KEY).await {
        tracing::Span::current().record("user_id", &user);
        return Ok(next.run(request).await);
    }

    let response = (StatusCode::UNAUTHORIZED, "Unauthorized");
    Ok(response.into_response())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account, log it in, and send the welcome mail. A mail failure
/// only changes the notice, never the outcome.
pub async fn register(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let username = payload.username.trim().to_string();
    let email = payload.email.trim().to_string();
    let name = format!("{} {}", payload.first_name.trim(), payload.last_name.trim())
        .trim()
        .to_string();

    if username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if email.is_empty() {
        return Err(ApiError::validation("Email is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    // Username collision is reported before the email one, matching the
    // order a registering user sees the messages in.
    if state.store().get_user_by_username(&username).await?.is_some() {
        return Err(ApiError::Conflict(
            "The entered username is already taken.".to_string(),
        ));
    }
    if state.store().get_user_by_email(&email).await?.is_some() {
        return Err(ApiError::Conflict(
            "The entered email address is already in use.".to_string(),
        ));
    }

    let security = state.config().read().await.security.clone();
    let password_hash = hash_password_blocking(&payload.password, Some(&security)).await?;

    let user = state
        .store()
        .create_user(NewUser {
            name: name.clone(),
            email: email.clone(),
            username: username.clone(),
            password_hash,
            bio: payload.bio.trim().to_string(),
            avatar_url: payload.avatar_url.trim().to_string(),
        })
        .await?;

    session
        .insert(SESSION_USER_KEY, &username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    let delivered = state
        .mail()
        .send(
            &email,
            &format!("Welcome {name}"),
            "Greetings from NewsBin! Thank you for joining: browse worldwide news \
             from over 80,000 sources, and post your own articles to share with \
             the world.",
        )
        .await;

    let message = match delivered {
        Delivery::Sent => "Account successfully created, you can now post articles on our site.",
        Delivery::Skipped => "Account successfully created, but unable to send confirmation mail.",
    };

    Ok(Json(ApiResponse::success_with_message(
        UserDto::from(user),
        message,
    )))
}

/// POST /auth/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Unauthorized(INVALID_LOGIN_MESSAGE.to_string()));
    }

    let is_valid = state
        .store()
        .verify_user_password(&payload.username, &payload.password)
        .await
        .map_err(|e| ApiError::internal(format!("Authentication error: {e}")))?;

    if !is_valid {
        return Err(ApiError::Unauthorized(INVALID_LOGIN_MESSAGE.to_string()));
    }

    let user = state
        .store()
        .get_user_by_username(&payload.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized(INVALID_LOGIN_MESSAGE.to_string()))?;

    session
        .insert(SESSION_USER_KEY, &user.username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to create session: {e}")))?;

    let message = format!("Logged in as {}.", user.name);

    Ok(Json(ApiResponse::success_with_message(
        UserDto::from(user),
        message,
    )))
}

/// POST /auth/logout
pub async fn logout(session: Session) -> Json<ApiResponse<MessageResponse>> {
    let _ = session.flush().await;
    Json(ApiResponse::success(MessageResponse {
        message: "Logged out of the system.".to_string(),
    }))
}

/// GET /auth/me
pub async fn get_current_user(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<UserDto>>, ApiError> {
    let user = get_session_user(&state, &session).await?;
    Ok(Json(ApiResponse::success(UserDto::from(user))))
}

/// POST /auth/forgot-password
/// Issue a reset code; a repeated request overwrites the pending one.
pub async fn forgot_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let outcome = state
        .password_resets()
        .request_reset(
            payload.username.trim(),
            payload.new_password.trim(),
            payload.confirm_password.trim(),
        )
        .await?;

    let message = match outcome.delivered {
        Delivery::Sent => "Please enter the code sent to your email address.",
        Delivery::Skipped => "Reset code issued, but the notification mail could not be sent.",
    };

    Ok(Json(ApiResponse::success(MessageResponse {
        message: message.to_string(),
    })))
}

/// POST /auth/verify-reset
/// Exact-match check against the most recently issued code; consumes it.
pub async fn verify_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<VerifyResetRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    state
        .password_resets()
        .verify_reset(payload.username.trim(), payload.code)
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Your password reset was successful.".to_string(),
    })))
}

// ============================================================================
// Helpers
// ============================================================================

/// Get username from session, returns error if not authenticated
pub async fn get_session_username(session: &Session) -> Result<String, ApiError> {
    session
        .get::<String>(SESSION_USER_KEY)
        .await
        .map_err(|e| ApiError::internal(format!("Session error: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
}

/// Resolve the session snapshot back to a stored user. Fails when the
/// account was deleted while the session was still live.
pub async fn get_session_user(state: &AppState, session: &Session) -> Result<User, ApiError> {
    let username = get_session_username(session).await?;

    state
        .store()
        .get_user_by_username(&username)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to get user: {e}")))?
        .ok_or_else(|| ApiError::Unauthorized("User not found".to_string()))
}
