use tracing::info;

use crate::ai::{Summarizer, SummaryOptions};
use crate::errors::ServiceError;
use crate::nlp::{BiasReducer, ReductionMode};

/// Bias-reduces `text` and summarizes the neutralized result.
///
/// # Errors
///
/// Propagates summarizer failures, including validation of `options`.
pub async fn neutral_summary(
    reducer: &BiasReducer,
    summarizer: &Summarizer,
    text: &str,
    options: &SummaryOptions,
) -> Result<String, ServiceError> {
    let neutral = reducer.reduce(text, ReductionMode::Sentence);
    summarizer.summarize(&neutral, options).await
}

/// Answers a chat message with a neutral summary of it.
///
/// # Errors
///
/// Returns `ValidationError` for a blank message and propagates summarizer failures.
pub async fn chat(
    reducer: &BiasReducer,
    summarizer: &Summarizer,
    message: &str,
) -> Result<String, ServiceError> {
    if message.trim().is_empty() {
        return Err(ServiceError::ValidationError(
            "'message' must not be empty.".to_string(),
        ));
    }

    let summary = neutral_summary(reducer, summarizer, message, &SummaryOptions::default()).await?;
    info!(summary_chars = summary.chars().count(), "Chat reply ready");
    Ok(summary)
}
