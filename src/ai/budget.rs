//! Input length limit for the summarization model.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::errors::ServiceError;

/// Maximum encoder input length of the summarization model, special tokens included.
pub const MAX_INPUT_TOKENS: usize = 512;

/// Tokens the model adds around every input (`<s>` and `</s>`).
pub const SPECIAL_TOKENS: usize = 2;

static WORD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S+").expect("static regex compile"));

/// Cuts inputs down to what the model accepts.
///
/// With the model's own tokenizer the cut is exact. Without one, the first
/// [`MAX_INPUT_TOKENS`] whitespace-separated words are kept, which is an
/// approximation the backend finishes by truncating on its side.
#[derive(Debug, Default)]
pub enum InputBudget {
    Tokenizer(Box<Tokenizer>),
    #[default]
    Words,
}

impl InputBudget {
    /// Loads a `tokenizer.json` file.
    ///
    /// # Errors
    ///
    /// Returns `TokenizerError` if the file cannot be read or parsed.
    pub fn from_tokenizer_file(path: &Path) -> Result<Self, ServiceError> {
        let tokenizer = Tokenizer::from_file(path).map_err(|e| {
            ServiceError::TokenizerError(format!("{}: {e}", path.display()))
        })?;
        info!(path = %path.display(), "Loaded summarizer tokenizer");
        Ok(Self::Tokenizer(Box::new(tokenizer)))
    }

    #[must_use]
    pub const fn is_exact(&self) -> bool {
        matches!(self, Self::Tokenizer(_))
    }

    /// Returns the longest prefix of `text` that fits the model input.
    ///
    /// # Errors
    ///
    /// Returns `TokenizerError` if encoding fails.
    pub fn truncate<'a>(&self, text: &'a str) -> Result<&'a str, ServiceError> {
        match self {
            Self::Tokenizer(tokenizer) => truncate_tokens(tokenizer, text),
            Self::Words => Ok(truncate_words(text, MAX_INPUT_TOKENS)),
        }
    }
}

fn truncate_tokens<'a>(tokenizer: &Tokenizer, text: &'a str) -> Result<&'a str, ServiceError> {
    let limit = MAX_INPUT_TOKENS - SPECIAL_TOKENS;
    let encoding = tokenizer.encode(text, false)?;
    if encoding.len() <= limit {
        return Ok(text);
    }

    let end = encoding.get_offsets()[limit - 1].1;
    debug!(tokens = encoding.len(), cut_at = end, "Truncating summarizer input");
    text.get(..end).ok_or_else(|| {
        ServiceError::TokenizerError(format!("Token offset {end} is not a character boundary"))
    })
}

fn truncate_words(text: &str, max_words: usize) -> &str {
    match WORD_RE.find_iter(text).nth(max_words.saturating_sub(1)) {
        Some(last) if max_words > 0 => &text[..last.end()],
        Some(_) => "",
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_budget_counts_words() {
        assert!(matches!(InputBudget::default(), InputBudget::Words));
    }

    #[test]
    fn test_short_text_is_untouched() {
        let budget = InputBudget::Words;
        assert_eq!(budget.truncate("a few words").unwrap(), "a few words");
        assert!(!budget.is_exact());
    }

    #[test]
    fn test_word_budget_keeps_first_words() {
        let text = (0..600).map(|i| format!("w{i}")).collect::<Vec<_>>().join(" ");

        let truncated = InputBudget::Words.truncate(&text).unwrap();

        assert_eq!(truncated.split_whitespace().count(), MAX_INPUT_TOKENS);
        assert!(truncated.ends_with("w511"));
    }

    #[test]
    fn test_truncate_words_exact_limit() {
        assert_eq!(truncate_words("one two three", 3), "one two three");
        assert_eq!(truncate_words("one two three", 2), "one two");
        assert_eq!(truncate_words("one two", 0), "");
    }

    #[test]
    fn test_missing_tokenizer_file_is_an_error() {
        let err = InputBudget::from_tokenizer_file(Path::new("/nonexistent/tokenizer.json"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::TokenizerError(_)));
    }
}
