//! Summarization model access

pub mod budget;
pub mod client;
pub mod sse;
pub mod summarizer;

// Re-export main types for convenience
pub use budget::InputBudget;
pub use client::{GenerationParams, GenerationRequest, HttpSummaryBackend, SummaryBackend, TokenStream};
pub use summarizer::{SummaryOptions, Summarizer};
