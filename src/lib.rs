//! sbot - A neutral news summarization service.
//!
//! This crate serves a small HTTP API around two text transformations:
//! 1. Bias reduction: sentences with strong sentiment get their most polarized
//!    words replaced by a dictionary lemma
//! 2. Summarization: abstractive summaries from a hosted seq2seq model,
//!    returned whole or streamed in fixed-size chunks
//!
//! `/chat` chains the two, and `/digest` applies them to news articles found
//! for a topic.
//!
//! # Architecture
//!
//! The system uses:
//! - axum for the HTTP surface
//! - reqwest for the model backend and the news search API
//! - vader_sentiment for polarity scores and a WordNet database for synonyms
//! - tokenizers for exact model input truncation
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use sbot::api::{AppState, create_router};
//! use sbot::core::config::AppConfig;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     sbot::setup_logging();
//!
//!     let config = AppConfig::from_env()?;
//!     let app = create_router(AppState::from_config(&config)?);
//!
//!     let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
//!     axum::serve(listener, app).await?;
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod ai;
pub mod api;
pub mod clients;
pub mod core;
pub mod errors;
pub mod features;
pub mod nlp;
pub mod text;

/// Configure structured JSON logging.
///
/// The level defaults to `info` and can be overridden with `RUST_LOG`.
/// Calling this more than once is harmless; later calls are ignored.
///
/// # Example
///
/// ```
/// sbot::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
