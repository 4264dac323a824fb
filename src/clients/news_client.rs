//! News search API client
//!
//! Finds articles for a topic and scrapes their paragraph text.

use std::time::Duration;

use once_cell::sync::Lazy;
use reqwest::Client;
use scraper::{Html, Selector};
use serde::Deserialize;
use tokio_retry::strategy::jitter;
use tokio_retry::{Retry, strategy::ExponentialBackoff};
use tracing::{debug, warn};

use crate::core::config::AppConfig;
use crate::errors::ServiceError;
use crate::text::{normalize_whitespace, strip_boilerplate};

/// Articles requested per search.
pub const SEARCH_MAX_RESULTS: usize = 6;

/// Scraped articles shorter than this (in characters) are treated as unusable.
pub const MIN_ARTICLE_CHARS: usize = 100;

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

static PARAGRAPH: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("static selector compile"));

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NewsArticle {
    #[serde(default)]
    pub title: String,
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    articles: Option<Vec<NewsArticle>>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewsClient {
    http: Client,
    search_url: String,
    api_key: String,
}

impl NewsClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        search_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ServiceError::NewsError(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            search_url: search_url.into(),
            api_key: api_key.into(),
        })
    }

    /// Returns `None` when no news API key is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, ServiceError> {
        config
            .news_api_key
            .as_ref()
            .map(|key| Self::new(config.news_search_url.clone(), key.clone()))
            .transpose()
    }

    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, ServiceError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, ServiceError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(100).map(jitter).take(2);

        Retry::spawn(strategy, operation).await
    }

    /// Searches English-language news for `topic`.
    ///
    /// # Errors
    ///
    /// Returns `NewsError` if the API rejects the request or answers without articles.
    pub async fn search(&self, topic: &str) -> Result<Vec<NewsArticle>, ServiceError> {
        let max = SEARCH_MAX_RESULTS.to_string();

        self.with_retry(|| async {
            let response = self
                .http
                .get(&self.search_url)
                .query(&[
                    ("q", topic),
                    ("lang", "en"),
                    ("max", max.as_str()),
                    ("apikey", self.api_key.as_str()),
                ])
                .send()
                .await
                .map_err(|e| ServiceError::NewsError(format!("Search request failed: {e}")))?;

            let status = response.status();
            let body: SearchResponse = response
                .json()
                .await
                .map_err(|e| ServiceError::NewsError(format!("Invalid search response: {e}")))?;

            match body.articles {
                Some(articles) if status.is_success() => {
                    debug!(count = articles.len(), "News search returned articles");
                    Ok(articles)
                }
                _ => {
                    let detail = body
                        .message
                        .or_else(|| body.errors.map(|e| e.to_string()))
                        .unwrap_or_else(|| "Unknown error".to_string());
                    Err(ServiceError::NewsError(format!(
                        "Error fetching articles (status {status}): {detail}"
                    )))
                }
            }
        })
        .await
    }

    /// Downloads an article page and returns its usable body text, if any.
    ///
    /// # Errors
    ///
    /// Returns `NewsError` if the page cannot be downloaded.
    pub async fn fetch_article_text(&self, url: &str) -> Result<Option<String>, ServiceError> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| ServiceError::NewsError(format!("Article download failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            warn!(%status, url, "Article download returned non-success status");
            return Ok(None);
        }

        let html = response
            .text()
            .await
            .map_err(|e| ServiceError::NewsError(format!("Article body unreadable: {e}")))?;

        Ok(extract_article_text(&html))
    }
}

/// Joins the text of every `<p>` element, cuts newsletter trailers and drops
/// results shorter than [`MIN_ARTICLE_CHARS`].
///
/// The page goes through a full HTML parser, so unclosed paragraphs are
/// closed the way a browser closes them and markup inside comments or
/// scripts is never mistaken for content.
#[must_use]
pub fn extract_article_text(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let paragraphs: Vec<String> = document
        .select(&PARAGRAPH)
        .map(|p| normalize_whitespace(&p.text().collect::<String>()))
        .filter(|p| !p.is_empty())
        .collect();

    let content = strip_boilerplate(&paragraphs.join(" "));
    if content.chars().count() < MIN_ARTICLE_CHARS {
        return None;
    }
    Some(content)
}
