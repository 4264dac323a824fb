use std::sync::Arc;

use tracing::{debug, info};

use super::budget::InputBudget;
use super::client::{GenerationParams, GenerationRequest, SummaryBackend, TokenStream};
use crate::core::models::SummarizeRequest;
use crate::errors::ServiceError;
use crate::text::normalize_whitespace;

pub const DEFAULT_MAX_LENGTH: usize = 200;
pub const DEFAULT_MIN_LENGTH: usize = 150;

/// Prepended to the input when a neutral rewrite is requested.
pub const REWRITE_INSTRUCTION: &str = "Rewrite the following text in a neutral, unbiased tone: ";

/// Length bounds (in generated tokens) and the rewrite switch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SummaryOptions {
    pub max_length: usize,
    pub min_length: usize,
    pub rewrite: bool,
}

impl Default for SummaryOptions {
    fn default() -> Self {
        Self {
            max_length: DEFAULT_MAX_LENGTH,
            min_length: DEFAULT_MIN_LENGTH,
            rewrite: false,
        }
    }
}

impl SummaryOptions {
    #[must_use]
    pub const fn new(max_length: usize, min_length: usize) -> Self {
        Self {
            max_length,
            min_length,
            rewrite: false,
        }
    }

    /// Fills unset bounds with the defaults.
    ///
    /// Only `max_length` given and below the default minimum pulls the minimum
    /// down with it, so `{"max_length": 60}` alone stays a valid request.
    #[must_use]
    pub fn from_request(request: &SummarizeRequest) -> Self {
        let max_length = request.max_length.unwrap_or(DEFAULT_MAX_LENGTH);
        let min_length = request
            .min_length
            .unwrap_or_else(|| DEFAULT_MIN_LENGTH.min(max_length));

        Self {
            max_length,
            min_length,
            rewrite: request.rewrite,
        }
    }

    /// # Errors
    ///
    /// Returns `ValidationError` for a zero maximum or a minimum above the maximum.
    pub fn validate(&self) -> Result<(), ServiceError> {
        if self.max_length == 0 {
            return Err(ServiceError::ValidationError(
                "'max_length' must be greater than 0.".to_string(),
            ));
        }
        if self.min_length > self.max_length {
            return Err(ServiceError::ValidationError(format!(
                "'min_length' ({}) must not exceed 'max_length' ({}).",
                self.min_length, self.max_length
            )));
        }
        Ok(())
    }
}

/// Abstractive summarizer: prepares inputs and drives a [`SummaryBackend`].
pub struct Summarizer {
    backend: Arc<dyn SummaryBackend>,
    budget: InputBudget,
}

impl std::fmt::Debug for Summarizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Summarizer")
            .field("budget", &self.budget)
            .finish_non_exhaustive()
    }
}

impl Summarizer {
    #[must_use]
    pub fn new(backend: Arc<dyn SummaryBackend>, budget: InputBudget) -> Self {
        Self { backend, budget }
    }

    #[must_use]
    pub const fn tokenizer_loaded(&self) -> bool {
        self.budget.is_exact()
    }

    /// Normalizes, prefixes and truncates `text` into a generation call.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for empty input or bad bounds, and
    /// `TokenizerError` if truncation fails.
    pub fn prepare(
        &self,
        text: &str,
        options: &SummaryOptions,
    ) -> Result<GenerationRequest, ServiceError> {
        options.validate()?;

        let normalized = normalize_whitespace(text);
        if normalized.is_empty() {
            return Err(ServiceError::ValidationError(
                "'text' must not be empty.".to_string(),
            ));
        }

        let input = if options.rewrite {
            format!("{REWRITE_INSTRUCTION}{normalized}")
        } else {
            normalized
        };
        let inputs = self.budget.truncate(&input)?.to_string();
        if inputs.len() < input.len() {
            debug!(
                original_chars = input.chars().count(),
                kept_chars = inputs.chars().count(),
                "Input truncated to model budget"
            );
        }

        Ok(GenerationRequest {
            inputs,
            params: GenerationParams::new(options.max_length, options.min_length),
        })
    }

    /// Returns the generated summary with surrounding whitespace removed.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`Self::prepare`] and any backend failure.
    pub async fn summarize(
        &self,
        text: &str,
        options: &SummaryOptions,
    ) -> Result<String, ServiceError> {
        let request = self.prepare(text, options)?;
        let summary = self.backend.generate(&request).await?;
        let summary = summary.trim().to_string();
        info!(summary_chars = summary.chars().count(), "Summary generated");
        Ok(summary)
    }

    /// Starts an incremental summary; deltas are passed through untrimmed.
    ///
    /// # Errors
    ///
    /// Returns validation errors from [`Self::prepare`] and failures to start
    /// the backend stream.
    pub async fn summarize_stream(
        &self,
        text: &str,
        options: &SummaryOptions,
    ) -> Result<TokenStream, ServiceError> {
        let request = self.prepare(text, options)?;
        self.backend.generate_stream(&request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_defaults() {
        let options = SummaryOptions::from_request(&SummarizeRequest::default());
        assert_eq!(options, SummaryOptions::default());
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_options_only_max_given_pulls_min_down() {
        let request = SummarizeRequest {
            max_length: Some(60),
            ..SummarizeRequest::default()
        };

        let options = SummaryOptions::from_request(&request);
        assert_eq!(options.max_length, 60);
        assert_eq!(options.min_length, 60);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_options_validation() {
        assert!(SummaryOptions::new(0, 0).validate().is_err());
        assert!(SummaryOptions::new(10, 20).validate().is_err());
        assert!(SummaryOptions::new(20, 20).validate().is_ok());
        assert!(SummaryOptions::new(20, 0).validate().is_ok());
    }

    #[test]
    fn test_explicit_inconsistent_bounds_are_rejected() {
        let request = SummarizeRequest {
            max_length: Some(50),
            min_length: Some(80),
            ..SummarizeRequest::default()
        };

        let err = SummaryOptions::from_request(&request).validate().unwrap_err();
        assert!(err.is_validation());
    }
}
