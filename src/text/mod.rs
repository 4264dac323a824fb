//! Pure text helpers: whitespace normalization, sentence and word splitting.

pub mod normalize;
pub mod tokenize;

pub use normalize::{normalize_whitespace, strip_boilerplate};
pub use tokenize::{split_sentences, word_tokenize};
