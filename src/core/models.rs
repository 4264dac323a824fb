use serde::{Deserialize, Serialize};

use crate::nlp::bias::ReductionMode;

/// Body of `POST /summarize` and `POST /summarize/stream`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct SummarizeRequest {
    pub text: Option<String>,
    pub max_length: Option<usize>,
    pub min_length: Option<usize>,
    #[serde(default)]
    pub rewrite: bool,
    #[serde(default)]
    pub stream: bool,
}

/// Body of `POST /reduce_bias`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ReduceBiasRequest {
    pub text: Option<String>,
    #[serde(default)]
    pub mode: ReductionMode,
}

/// Body of `POST /chat`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct ChatRequest {
    pub message: Option<String>,
}

/// Body of `POST /digest`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DigestRequest {
    pub topic: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NeutralTextResponse {
    pub neutral_text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ArticleSummary {
    pub title: String,
    pub url: String,
    pub summary: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DigestResponse {
    pub topic: String,
    pub articles: Vec<ArticleSummary>,
    pub overall_summary: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
    pub started_at: chrono::DateTime<chrono::Utc>,
    pub wordnet_loaded: bool,
    pub tokenizer_loaded: bool,
    pub news_enabled: bool,
}
