use vader_sentiment::SentimentIntensityAnalyzer;

/// Polarity scorer returning a compound score in `[-1, 1]`.
pub trait SentimentScorer: Send + Sync {
    fn compound(&self, text: &str) -> f64;
}

/// VADER lexicon scorer. The lexicon ships inside the `vader_sentiment` crate.
pub struct VaderScorer {
    analyzer: SentimentIntensityAnalyzer<'static>,
}

impl VaderScorer {
    #[must_use]
    pub fn new() -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
        }
    }
}

impl Default for VaderScorer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for VaderScorer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaderScorer").finish_non_exhaustive()
    }
}

impl SentimentScorer for VaderScorer {
    fn compound(&self, text: &str) -> f64 {
        self.analyzer
            .polarity_scores(text)
            .get("compound")
            .copied()
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_word_scores_zero() {
        let scorer = VaderScorer::new();
        assert!(scorer.compound("table").abs() < f64::EPSILON);
        assert!(scorer.compound("").abs() < f64::EPSILON);
    }

    #[test]
    fn test_polarity_direction() {
        let scorer = VaderScorer::new();
        assert!(scorer.compound("This is a wonderful day") > 0.3);
        assert!(scorer.compound("This is a horrible disaster") < -0.3);
    }

    #[test]
    fn test_compound_is_bounded() {
        let scorer = VaderScorer::new();
        let score = scorer.compound("great great great great amazing wonderful!!!");
        assert!((-1.0..=1.0).contains(&score));
    }
}
