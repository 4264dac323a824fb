//! Topic digest: neutral summaries of recent news coverage.

use futures::future::join_all;
use tracing::{info, warn};

use super::chat::neutral_summary;
use crate::ai::{Summarizer, SummaryOptions};
use crate::clients::NewsClient;
use crate::core::models::{ArticleSummary, DigestResponse};
use crate::errors::ServiceError;
use crate::nlp::BiasReducer;

/// Articles kept per digest.
pub const MAX_DIGEST_ARTICLES: usize = 3;

pub const ARTICLE_SUMMARY_BOUNDS: SummaryOptions = SummaryOptions::new(100, 80);
pub const OVERALL_SUMMARY_BOUNDS: SummaryOptions = SummaryOptions::new(200, 150);

/// Stands in for a summary whose model call failed.
pub const SUMMARY_FAILED: &str = "Error generating neutral summary";

struct ScrapedArticle {
    title: String,
    url: String,
    content: String,
}

/// Searches news for `topic` and summarizes up to three usable articles.
///
/// Search and download failures are logged and yield fewer articles. A failed
/// summary is logged and replaced by [`SUMMARY_FAILED`].
///
/// # Errors
///
/// Returns `ValidationError` for a blank topic.
pub async fn build_digest(
    news: &NewsClient,
    reducer: &BiasReducer,
    summarizer: &Summarizer,
    topic: &str,
) -> Result<DigestResponse, ServiceError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(ServiceError::ValidationError(
            "'topic' must not be empty.".to_string(),
        ));
    }

    let found = news.search(topic).await.unwrap_or_else(|e| {
        warn!(error = %e, "News search failed");
        Vec::new()
    });

    let mut articles: Vec<ScrapedArticle> = Vec::new();
    for article in found {
        if articles.len() >= MAX_DIGEST_ARTICLES {
            break;
        }
        match news.fetch_article_text(&article.url).await {
            Ok(Some(content)) => articles.push(ScrapedArticle {
                title: article.title,
                url: article.url,
                content,
            }),
            Ok(None) => info!(url = %article.url, "Skipping article without usable text"),
            Err(e) => warn!(url = %article.url, error = %e, "Skipping article"),
        }
    }

    if articles.is_empty() {
        info!("No usable articles for digest");
        return Ok(DigestResponse {
            topic: topic.to_string(),
            articles: Vec::new(),
            overall_summary: None,
        });
    }

    let summaries = join_all(articles.iter().map(|article| async move {
        let summary =
            neutral_summary(reducer, summarizer, &article.content, &ARTICLE_SUMMARY_BOUNDS).await;
        or_placeholder(summary, &article.url)
    }))
    .await;

    let combined = articles
        .iter()
        .map(|a| a.content.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let overall = or_placeholder(
        neutral_summary(reducer, summarizer, &combined, &OVERALL_SUMMARY_BOUNDS).await,
        "overall",
    );

    info!(articles = articles.len(), "Digest built");

    Ok(DigestResponse {
        topic: topic.to_string(),
        articles: articles
            .into_iter()
            .zip(summaries)
            .map(|(article, summary)| ArticleSummary {
                title: article.title,
                url: article.url,
                summary,
            })
            .collect(),
        overall_summary: Some(overall),
    })
}

fn or_placeholder(summary: Result<String, ServiceError>, source: &str) -> String {
    summary.unwrap_or_else(|e| {
        warn!(source, error = %e, "Digest summary failed");
        SUMMARY_FAILED.to_string()
    })
}
