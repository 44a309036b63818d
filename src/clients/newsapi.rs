use anyhow::Result;
use chrono::DateTime;
use rand::Rng;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::config::NewsConfig;

#[derive(Debug, Deserialize)]
struct NewsApiResponse {
    #[serde(default)]
    articles: Vec<NewsArticle>,
    #[serde(default, rename = "totalResults")]
    #[allow(dead_code)]
    total_results: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewsSource {
    pub name: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    pub source: Option<NewsSource>,
    pub author: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub url_to_image: Option<String>,
    pub published_at: Option<String>,
    pub content: Option<String>,
}

impl NewsArticle {
    /// `HH:MM:SS` display form of the published timestamp, parsed as
    /// RFC 3339. Returns None when the upstream timestamp is absent or
    /// malformed instead of slicing at fixed offsets.
    #[must_use]
    pub fn published_time(&self) -> Option<String> {
        let raw = self.published_at.as_deref()?;
        let parsed = DateTime::parse_from_rfc3339(raw).ok()?;
        Some(parsed.format("%H:%M:%S").to_string())
    }
}

#[derive(Clone)]
pub struct NewsApiClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl NewsApiClient {
    pub fn new(config: &NewsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(
                config.request_timeout_seconds.into(),
            ))
            .user_agent("NewsBin/1.0")
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build news HTTP client: {e}"))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    /// Search every indexed source for a query.
    pub async fn everything(&self, query: &str) -> Result<Vec<NewsArticle>> {
        let url = format!(
            "{}/everything?q={}&apiKey={}",
            self.base_url,
            urlencoding::encode(query),
            self.api_key
        );
        self.fetch(&url).await
    }

    /// Top headlines for a country, optionally narrowed to a category.
    pub async fn top_headlines(
        &self,
        country: &str,
        category: Option<&str>,
    ) -> Result<Vec<NewsArticle>> {
        let mut url = format!(
            "{}/top-headlines?country={}&apiKey={}",
            self.base_url,
            urlencoding::encode(country),
            self.api_key
        );
        if let Some(category) = category {
            url.push_str("&category=");
            url.push_str(&urlencoding::encode(category));
        }
        self.fetch(&url).await
    }

    async fn fetch(&self, url: &str) -> Result<Vec<NewsArticle>> {
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("NewsAPI error: {} - {}", status, body));
        }

        let response: NewsApiResponse = response.json().await?;

        Ok(response.articles)
    }
}

/// Pick a random article that has an image, for the writing-page suggestion.
#[must_use]
pub fn pick_random_with_image(articles: &[NewsArticle]) -> Option<&NewsArticle> {
    let with_image: Vec<&NewsArticle> = articles
        .iter()
        .filter(|a| a.url_to_image.is_some())
        .collect();

    if with_image.is_empty() {
        return None;
    }

    let mut rng = rand::rng();
    let index = rng.random_range(0..with_image.len());
    Some(with_image[index])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn published_time_formats_hh_mm_ss() {
        let article = NewsArticle {
            source: None,
            author: None,
            title: None,
            description: None,
            url: None,
            url_to_image: None,
            published_at: Some("2026-02-14T08:05:42Z".to_string()),
            content: None,
        };
        assert_eq!(article.published_time().as_deref(), Some("08:05:42"));
    }

    #[test]
    fn published_time_handles_offsets() {
        let article = NewsArticle {
            source: None,
            author: None,
            title: None,
            description: None,
            url: None,
            url_to_image: None,
            published_at: Some("2026-02-14T23:59:01+05:30".to_string()),
            content: None,
        };
        assert_eq!(article.published_time().as_deref(), Some("23:59:01"));
    }

    #[test]
    fn published_time_rejects_garbage() {
        let article = NewsArticle {
            source: None,
            author: None,
            title: None,
            description: None,
            url: None,
            url_to_image: None,
            published_at: Some("not-a-timestamp".to_string()),
            content: None,
        };
        assert!(article.published_time().is_none());
    }

    #[test]
    fn random_pick_skips_imageless() {
        let imageless = NewsArticle {
            source: None,
            author: None,
            title: Some("no image".to_string()),
            description: None,
            url: None,
            url_to_image: None,
            published_at: None,
            content: None,
        };
        let with_image = NewsArticle {
            url_to_image: Some("https://example.com/a.png".to_string()),
            ..imageless.clone()
        };

        let pool = vec![imageless.clone(), with_image, imageless];
        let picked = pick_random_with_image(&pool).expect("one candidate has an image");
        assert!(picked.url_to_image.is_some());
    }

    #[test]
    fn random_pick_empty_when_no_images() {
        let imageless = NewsArticle {
            source: None,
            author: None,
            title: None,
            description: None,
            url: None,
            url_to_image: None,
            published_at: None,
            content: None,
        };
        assert!(pick_random_with_image(&[imageless]).is_none());
    }
}
