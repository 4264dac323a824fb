//! Lexicon substitution that tones down strongly polarized words.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::lexicon::SynonymLookup;
use super::sentiment::SentimentScorer;
use crate::text::{split_sentences, word_tokenize};

/// Sentences scoring at or below this magnitude are passed through untouched.
pub const SENTENCE_THRESHOLD: f64 = 0.3;

/// Words scoring above this magnitude are candidates for replacement.
pub const WORD_THRESHOLD: f64 = 0.5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReductionMode {
    /// Only polarized sentences are re-tokenized; others keep their original text.
    #[default]
    Sentence,
    /// The whole text is tokenized and rejoined, losing original spacing.
    Word,
}

#[derive(Clone)]
pub struct BiasReducer {
    scorer: Arc<dyn SentimentScorer>,
    lexicon: Arc<dyn SynonymLookup>,
}

impl std::fmt::Debug for BiasReducer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BiasReducer")
            .field("lexicon_loaded", &self.lexicon.is_loaded())
            .finish_non_exhaustive()
    }
}

impl BiasReducer {
    #[must_use]
    pub fn new(scorer: Arc<dyn SentimentScorer>, lexicon: Arc<dyn SynonymLookup>) -> Self {
        Self { scorer, lexicon }
    }

    #[must_use]
    pub fn lexicon_loaded(&self) -> bool {
        self.lexicon.is_loaded()
    }

    /// Produces the neutralized version of `text`.
    #[must_use]
    pub fn reduce(&self, text: &str, mode: ReductionMode) -> String {
        match mode {
            ReductionMode::Sentence => split_sentences(text)
                .into_iter()
                .map(|sentence| {
                    if self.scorer.compound(sentence).abs() > SENTENCE_THRESHOLD {
                        self.neutralize_sentence(sentence)
                    } else {
                        sentence.to_string()
                    }
                })
                .collect::<Vec<_>>()
                .join(" "),
            ReductionMode::Word => self.neutralize_tokens(&word_tokenize(text)).join(" "),
        }
    }

    /// Tokenizes a sentence and rejoins it with every token neutralized.
    #[must_use]
    pub fn neutralize_sentence(&self, sentence: &str) -> String {
        self.neutralize_tokens(&word_tokenize(sentence)).join(" ")
    }

    /// Maps each token to its replacement; the output has as many tokens as the input.
    #[must_use]
    pub fn neutralize_tokens(&self, tokens: &[String]) -> Vec<String> {
        tokens.iter().map(|t| self.neutralize_word(t)).collect()
    }

    /// Replaces a strongly polarized word with the first lemma of its first
    /// sense, lowercased, when that lemma is a single alphabetic word.
    #[must_use]
    pub fn neutralize_word(&self, word: &str) -> String {
        if self.scorer.compound(word).abs() <= WORD_THRESHOLD {
            return word.to_string();
        }

        let Some(candidate) = self.lexicon.synonyms(word).into_iter().next() else {
            return word.to_string();
        };

        let lemma = candidate.replace('_', " ");
        if is_alphabetic_word(&lemma) {
            let replacement = lemma.to_lowercase();
            debug!(from = %word, to = %replacement, "Neutralized word");
            replacement
        } else {
            word.to_string()
        }
    }
}

fn is_alphabetic_word(s: &str) -> bool {
    !s.is_empty() && s.chars().all(char::is_alphabetic)
}
