use axum::{
    Json,
    extract::{Path, Query, State},
};
use serde::Deserialize;
use std::sync::Arc;
use tower_sessions::Session;

use super::auth::{SESSION_USER_KEY, get_session_user, get_session_username};
use super::{
    ApiError, ApiResponse, AppState, ArticleDto, ArticleSummaryDto, LIST_EXCERPT_CHARS,
    LIST_EXCERPT_SUFFIX, MessageResponse, ReviewDto,
};
use crate::db::{Article, ArticleUpdate, NewArticle};
use crate::services::LikeState;

#[derive(Deserialize)]
pub struct SearchQuery {
    pub q: String,
}

#[derive(Deserialize)]
pub struct PostArticleRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub image_url: String,
}

/// GET /articles
/// Every article, newest first, body truncated for the listing.
pub async fn list_articles(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ArticleSummaryDto>>>, ApiError> {
    let articles = state.store().list_articles().await?;

    let summaries = articles
        .into_iter()
        .map(|a| ArticleSummaryDto::from_article(a, LIST_EXCERPT_CHARS, LIST_EXCERPT_SUFFIX))
        .collect();

    Ok(Json(ApiResponse::success(summaries)))
}

/// GET /articles/search?q=term
/// Case-insensitive substring match over title, owner and body.
pub async fn search_articles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<ApiResponse<Vec<ArticleSummaryDto>>>, ApiError> {
    let term = query.q.trim();
    if term.is_empty() {
        return Err(ApiError::validation("Search term is required"));
    }

    let articles = state.store().search_articles(term).await?;

    let summaries = articles
        .into_iter()
        .map(|a| ArticleSummaryDto::from_article(a, LIST_EXCERPT_CHARS, LIST_EXCERPT_SUFFIX))
        .collect();

    Ok(Json(ApiResponse::success(summaries)))
}

/// GET /articles/{id}
/// Full article with populated reviews and the owner's display name.
pub async fn get_article(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<ArticleDto>>, ApiError> {
    let article = state
        .store()
        .get_article(id)
        .await?
        .ok_or_else(|| ApiError::article_not_found(id))?;

    let reviews: Vec<ReviewDto> = state
        .store()
        .get_reviews(&article.review_ids)
        .await?
        .into_iter()
        .map(ReviewDto::from)
        .collect();

    // The owner's user record can be missing when a rename or delete raced
    // this read; fall back to the stored username rather than failing.
    let owner_name = state
        .store()
        .get_user_by_username(&article.owner_username)
        .await?
        .map_or_else(|| article.owner_username.clone(), |u| u.name);

    let session_username = session.get::<String>(SESSION_USER_KEY).await.ok().flatten();
    let is_owner = session_username.as_deref() == Some(article.owner_username.as_str());

    Ok(Json(ApiResponse::success(assemble_dto(
        article, reviews, owner_name, is_owner,
    ))))
}

/// POST /articles
pub async fn post_article(
    State(state): State<Arc<AppState>>,
    session: Session,
    Json(payload): Json<PostArticleRequest>,
) -> Result<Json<ApiResponse<ArticleDto>>, ApiError> {
    let user = get_session_user(&state, &session).await?;

    let title = payload.title.trim().to_string();
    let body = payload.body.trim().to_string();
    if title.is_empty() {
        return Err(ApiError::validation("Title is required"));
    }
    if body.is_empty() {
        return Err(ApiError::validation("Article body is required"));
    }

    let upload_date = chrono::Local::now().format("%d/%m/%Y").to_string();

    let article = state
        .store()
        .create_article(NewArticle {
            title,
            content: body,
            image_url: payload.image_url.trim().to_string(),
            upload_date,
            owner_username: user.username,
        })
        .await?;

    let owner_name = user.name;

    Ok(Json(ApiResponse::success_with_message(
        assemble_dto(article, Vec::new(), owner_name, true),
        "The article has been successfully uploaded.",
    )))
}

/// PUT /articles/{id}
/// Owner-only edit of title, body and image.
pub async fn update_article(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
    Json(payload): Json<PostArticleRequest>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let username = get_session_username(&session).await?;

    let article = state
        .store()
        .get_article(id)
        .await?
        .ok_or_else(|| ApiError::article_not_found(id))?;

    if article.owner_username != username {
        return Err(ApiError::Unauthorized(
            "Only the owner can edit this article".to_string(),
        ));
    }

    state
        .store()
        .update_article(
            id,
            ArticleUpdate {
                title: payload.title.trim().to_string(),
                content: payload.body.trim().to_string(),
                image_url: payload.image_url.trim().to_string(),
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "Your article has been successfully updated".to_string(),
    })))
}

/// DELETE /articles/{id}
/// Owner-only; deletes the article's reviews first, then the article.
pub async fn delete_article(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let username = get_session_username(&session).await?;

    let article = state
        .store()
        .get_article(id)
        .await?
        .ok_or_else(|| ApiError::article_not_found(id))?;

    if article.owner_username != username {
        return Err(ApiError::Unauthorized(
            "Only the owner can delete this article".to_string(),
        ));
    }

    state.cascades().delete_article(id).await?;

    Ok(Json(ApiResponse::success(MessageResponse {
        message: "The article has been successfully deleted.".to_string(),
    })))
}

/// POST /articles/{id}/like
/// Toggle the session user in the article's likes sequence.
pub async fn toggle_like(
    State(state): State<Arc<AppState>>,
    session: Session,
    Path(id): Path<i32>,
) -> Result<Json<ApiResponse<MessageResponse>>, ApiError> {
    let username = get_session_username(&session).await?;

    let new_state = state.cascades().toggle_like(id, &username).await?;

    let message = match new_state {
        LikeState::Liked => "Post added to your favourites.",
        LikeState::Unliked => "Post removed from your favourites.",
    };

    Ok(Json(ApiResponse::success(MessageResponse {
        message: message.to_string(),
    })))
}

/// GET /articles/favourites
/// Articles the session user has liked, newest first.
pub async fn list_favourites(
    State(state): State<Arc<AppState>>,
    session: Session,
) -> Result<Json<ApiResponse<Vec<ArticleSummaryDto>>>, ApiError> {
    let username = get_session_username(&session).await?;

    let articles = state.store().find_articles_liked_by(&username).await?;

    let summaries = articles
        .into_iter()
        .map(|a| ArticleSummaryDto::from_article(a, LIST_EXCERPT_CHARS, LIST_EXCERPT_SUFFIX))
        .collect();

    Ok(Json(ApiResponse::success(summaries)))
}

fn assemble_dto(
    article: Article,
    reviews: Vec<ReviewDto>,
    owner_name: String,
    is_owner: bool,
) -> ArticleDto {
    ArticleDto {
        id: article.id,
        title: article.title,
        content: article.content,
        image_url: article.image_url,
        upload_date: article.upload_date,
        owner: article.owner_username,
        owner_name,
        likes: article.likes,
        reviews,
        is_owner,
    }
}
