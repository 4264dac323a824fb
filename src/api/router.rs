//! Route table and shared handler state.

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use chrono::{DateTime, Utc};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use super::handlers;
use crate::ai::{HttpSummaryBackend, InputBudget, Summarizer, SummaryBackend};
use crate::clients::NewsClient;
use crate::core::config::AppConfig;
use crate::errors::ServiceError;
use crate::nlp::{BiasReducer, SentimentScorer, StaticLexicon, SynonymLookup, VaderScorer, WordNet};

/// Collaborators shared by every request. Built once at startup, read-only after.
#[derive(Clone, Debug)]
pub struct AppState {
    pub summarizer: Arc<Summarizer>,
    pub reducer: Arc<BiasReducer>,
    pub news: Option<Arc<NewsClient>>,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    #[must_use]
    pub fn new(summarizer: Summarizer, reducer: BiasReducer) -> Self {
        Self {
            summarizer: Arc::new(summarizer),
            reducer: Arc::new(reducer),
            news: None,
            started_at: Utc::now(),
        }
    }

    #[must_use]
    pub fn with_news(mut self, news: NewsClient) -> Self {
        self.news = Some(Arc::new(news));
        self
    }

    /// Builds the production collaborators described by `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if a configured WordNet directory or tokenizer file
    /// cannot be loaded, or an HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        let lexicon: Arc<dyn SynonymLookup> = match &config.wordnet_dir {
            Some(dir) => Arc::new(WordNet::load(dir)?),
            None => {
                warn!("WORDNET_DIR not set; bias reduction will not substitute any words");
                Arc::new(StaticLexicon::new())
            }
        };
        let scorer: Arc<dyn SentimentScorer> = Arc::new(VaderScorer::new());
        let reducer = BiasReducer::new(scorer, lexicon);

        let budget = match &config.tokenizer_path {
            Some(path) => InputBudget::from_tokenizer_file(path)?,
            None => {
                warn!("SUMMARIZER_TOKENIZER_PATH not set; truncating inputs by word count");
                InputBudget::Words
            }
        };
        let backend: Arc<dyn SummaryBackend> = Arc::new(HttpSummaryBackend::from_config(config)?);
        let summarizer = Summarizer::new(backend, budget);

        let mut state = Self::new(summarizer, reducer);
        match NewsClient::from_config(config)? {
            Some(news) => state = state.with_news(news),
            None => info!("NEWS_API_KEY not set; /digest disabled"),
        }

        Ok(state)
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route("/summarize", post(handlers::summarize))
        .route("/summarize/stream", post(handlers::summarize_stream))
        .route("/reduce_bias", post(handlers::reduce_bias))
        .route("/chat", post(handlers::chat))
        .route("/digest", post(handlers::digest))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
