use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState, NewsArticleDto};
use crate::clients::newsapi::pick_random_with_image;

const DEFAULT_QUERY: &str = "india";
const DEFAULT_COUNTRY: &str = "in";

#[derive(Deserialize)]
pub struct NewsQuery {
    pub q: Option<String>,
}

#[derive(Deserialize)]
pub struct HeadlinesQuery {
    pub country: Option<String>,
    pub category: Option<String>,
}

/// GET /news?q=term
/// Full-text search across every indexed source, proxied upstream.
pub async fn search_news(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NewsQuery>,
) -> Result<Json<ApiResponse<Vec<NewsArticleDto>>>, ApiError> {
    let term = query
        .q
        .as_deref()
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .unwrap_or(DEFAULT_QUERY);

    let articles = state
        .news()
        .everything(term)
        .await
        .map_err(|e| ApiError::newsapi_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        articles.into_iter().map(NewsArticleDto::from).collect(),
    )))
}

/// GET /news/headlines?country=in&category=sports
pub async fn headlines(
    State(state): State<Arc<AppState>>,
    Query(query): Query<HeadlinesQuery>,
) -> Result<Json<ApiResponse<Vec<NewsArticleDto>>>, ApiError> {
    let country = query
        .country
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .unwrap_or(DEFAULT_COUNTRY);

    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let articles = state
        .news()
        .top_headlines(country, category)
        .await
        .map_err(|e| ApiError::newsapi_error(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        articles.into_iter().map(NewsArticleDto::from).collect(),
    )))
}

/// GET /news/inspiration
/// One random illustrated story from the configured query, shown on the
/// writing page as a starting point.
pub async fn inspiration(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Option<NewsArticleDto>>>, ApiError> {
    let query = state.config().read().await.news.inspiration_query.clone();

    let articles = state
        .news()
        .everything(&query)
        .await
        .map_err(|e| ApiError::newsapi_error(e.to_string()))?;

    let picked = pick_random_with_image(&articles)
        .cloned()
        .map(NewsArticleDto::from);

    Ok(Json(ApiResponse::success(picked)))
}
