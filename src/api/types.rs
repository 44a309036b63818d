use serde::Serialize;

use crate::clients::newsapi::NewsArticle;
use crate::db::{Article, Review, User};

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
        }
    }

    /// Success with a one-shot user-visible notice, the JSON stand-in for
    /// the flash messages of a template-rendered app.
    pub fn success_with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
            message: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub username: String,
    pub bio: String,
    pub avatar_url: String,
    pub created_at: String,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            username: user.username,
            bio: user.bio,
            avatar_url: user.avatar_url,
            created_at: user.created_at,
        }
    }
}

/// Excerpt length and cut marker on the all-articles and favourites listings.
pub const LIST_EXCERPT_CHARS: usize = 475;
pub const LIST_EXCERPT_SUFFIX: &str = "........";

/// Excerpt length and cut marker on profile pages.
pub const PROFILE_EXCERPT_CHARS: usize = 175;
pub const PROFILE_EXCERPT_SUFFIX: &str = "...";

#[derive(Debug, Serialize)]
pub struct ArticleSummaryDto {
    pub id: i32,
    pub title: String,
    pub excerpt: String,
    pub image_url: String,
    pub upload_date: String,
    pub owner: String,
    pub like_count: usize,
    pub review_count: usize,
}

impl ArticleSummaryDto {
    #[must_use]
    pub fn from_article(article: Article, excerpt_chars: usize, excerpt_suffix: &str) -> Self {
        Self {
            id: article.id,
            title: article.title,
            excerpt: excerpt(&article.content, excerpt_chars, excerpt_suffix),
            image_url: article.image_url,
            upload_date: article.upload_date,
            owner: article.owner_username,
            like_count: article.likes.len(),
            review_count: article.review_ids.len(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ArticleDto {
    pub id: i32,
    pub title: String,
    pub content: String,
    pub image_url: String,
    pub upload_date: String,
    pub owner: String,
    pub owner_name: String,
    pub likes: Vec<String>,
    pub reviews: Vec<ReviewDto>,
    /// Whether the requesting session user owns this article.
    pub is_owner: bool,
}

#[derive(Debug, Serialize)]
pub struct ReviewDto {
    pub id: i32,
    pub rating: i32,
    pub body: String,
    pub author: String,
}

impl From<Review> for ReviewDto {
    fn from(review: Review) -> Self {
        Self {
            id: review.id,
            rating: review.rating,
            body: review.body,
            author: review.author_username,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct NewsArticleDto {
    pub source: Option<String>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub image_url: Option<String>,
    pub published_at: Option<String>,
    /// `HH:MM:SS` display form of `published_at`.
    pub published_time: Option<String>,
    pub content: Option<String>,
}

impl From<NewsArticle> for NewsArticleDto {
    fn from(article: NewsArticle) -> Self {
        let published_time = article.published_time();
        Self {
            source: article.source.and_then(|s| s.name),
            author: article.author,
            title: article.title,
            description: article.description,
            url: article.url,
            image_url: article.url_to_image,
            published_at: article.published_at,
            published_time,
            content: article.content,
        }
    }
}

/// Truncate body text for listings, appending the caller's cut marker when
/// content was trimmed. The listings use a longer dot run than profiles.
/// Char-based so multi-byte text never splits.
#[must_use]
pub fn excerpt(content: &str, limit: usize, suffix: &str) -> String {
    if content.chars().count() <= limit {
        return content.to_string();
    }
    let mut cut: String = content.chars().take(limit).collect();
    cut.push_str(suffix);
    cut
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excerpt_passes_short_content_through() {
        assert_eq!(excerpt("short", LIST_EXCERPT_CHARS, LIST_EXCERPT_SUFFIX), "short");
    }

    #[test]
    fn excerpt_truncates_long_content() {
        let long = "x".repeat(500);
        let cut = excerpt(&long, LIST_EXCERPT_CHARS, LIST_EXCERPT_SUFFIX);
        assert_eq!(cut.chars().count(), 475 + 8);
        assert!(cut.ends_with("........"));
    }

    #[test]
    fn profile_excerpt_uses_the_short_marker() {
        let long = "x".repeat(200);
        let cut = excerpt(&long, PROFILE_EXCERPT_CHARS, PROFILE_EXCERPT_SUFFIX);
        assert_eq!(cut.chars().count(), 175 + 3);
        assert!(cut.ends_with("x..."));
    }

    #[test]
    fn excerpt_respects_char_boundaries() {
        let long = "é".repeat(200);
        let cut = excerpt(&long, PROFILE_EXCERPT_CHARS, PROFILE_EXCERPT_SUFFIX);
        assert!(cut.starts_with('é'));
        assert_eq!(cut.chars().count(), 175 + 3);
    }
}
