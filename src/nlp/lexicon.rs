use std::collections::HashMap;

/// Synonym source consulted by the bias reducer.
pub trait SynonymLookup: Send + Sync {
    /// Returns candidate synonyms for `word`, best sense first.
    ///
    /// Candidates are raw lemma names: multi-word lemmas keep their
    /// underscores (`ice_cream`).
    fn synonyms(&self, word: &str) -> Vec<String>;

    /// Whether the lookup is backed by real data.
    fn is_loaded(&self) -> bool {
        true
    }
}

/// In-memory synonym table keyed by lowercased word.
///
/// An empty table is what the service falls back to when no WordNet database
/// is configured: every lookup misses and no word gets replaced.
#[derive(Debug, Clone, Default)]
pub struct StaticLexicon {
    entries: HashMap<String, Vec<String>>,
}

impl StaticLexicon {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_entry<I, S>(mut self, word: &str, synonyms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(word, synonyms);
        self
    }

    pub fn insert<I, S>(&mut self, word: &str, synonyms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.entries.insert(
            word.to_lowercase(),
            synonyms.into_iter().map(Into::into).collect(),
        );
    }
}

impl SynonymLookup for StaticLexicon {
    fn synonyms(&self, word: &str) -> Vec<String> {
        self.entries
            .get(&word.to_lowercase())
            .cloned()
            .unwrap_or_default()
    }

    fn is_loaded(&self) -> bool {
        !self.entries.is_empty()
    }
}
