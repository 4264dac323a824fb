//! Lexicon-backed collaborators and the bias reducer built on top of them.

pub mod bias;
pub mod lexicon;
pub mod sentiment;
pub mod wordnet;

pub use bias::{BiasReducer, ReductionMode};
pub use lexicon::{StaticLexicon, SynonymLookup};
pub use sentiment::{SentimentScorer, VaderScorer};
pub use wordnet::WordNet;
