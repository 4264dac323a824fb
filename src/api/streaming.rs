//! Chunked plain-text delivery for streamed summaries.
//!
//! Model deltas arrive in arbitrary sizes. They are re-cut into fixed
//! [`STREAM_CHUNK_CHARS`]-character pieces of the trimmed summary, so a client
//! concatenating the body gets exactly what `/summarize` would have returned.

use std::collections::VecDeque;

use axum::body::Body;
use futures::StreamExt;
use tracing::{error, info};

use crate::ai::TokenStream;

pub const STREAM_CHUNK_CHARS: usize = 50;

#[must_use]
fn slice_end_for_max_chars(s: &str, max_chars: usize) -> usize {
    if max_chars == 0 {
        return 0;
    }

    for (count, (idx, _)) in s.char_indices().enumerate() {
        if count == max_chars {
            return idx;
        }
    }
    s.len()
}

/// Re-chunks a delta stream while trimming the overall text.
///
/// Leading whitespace is dropped until the first visible character. Trailing
/// whitespace is held back until more text follows it, and discarded by
/// [`ChunkBuffer::finish`].
#[derive(Debug)]
pub struct ChunkBuffer {
    pending: String,
    started: bool,
    max_chars: usize,
}

impl Default for ChunkBuffer {
    fn default() -> Self {
        Self::new(STREAM_CHUNK_CHARS)
    }
}

impl ChunkBuffer {
    #[must_use]
    pub fn new(max_chars: usize) -> Self {
        Self {
            pending: String::new(),
            started: false,
            max_chars: max_chars.max(1),
        }
    }

    /// Adds a delta and returns every chunk that is now complete.
    pub fn push(&mut self, delta: &str) -> Vec<String> {
        let delta = if self.started {
            delta
        } else {
            let trimmed = delta.trim_start();
            if trimmed.is_empty() {
                return Vec::new();
            }
            self.started = true;
            trimmed
        };
        self.pending.push_str(delta);

        let mut chunks = Vec::new();
        while self.pending.trim_end().chars().count() >= self.max_chars {
            let end = slice_end_for_max_chars(&self.pending, self.max_chars);
            chunks.push(self.pending.drain(..end).collect());
        }
        chunks
    }

    /// Returns the final partial chunk, if any visible text is left.
    pub fn finish(&mut self) -> Option<String> {
        let rest = self.pending.trim_end().to_string();
        self.pending.clear();
        (!rest.is_empty()).then_some(rest)
    }
}

struct ChunkedState {
    tokens: TokenStream,
    buffer: ChunkBuffer,
    ready: VecDeque<String>,
    done: bool,
    sent_chars: usize,
}

/// Wraps a token stream into a chunked `text/plain` response body.
///
/// A backend failure after the first byte cannot change the status code any
/// more; it is logged and aborts the body.
pub fn chunked_body(tokens: TokenStream) -> Body {
    let state = ChunkedState {
        tokens,
        buffer: ChunkBuffer::default(),
        ready: VecDeque::new(),
        done: false,
        sent_chars: 0,
    };

    let stream = futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.ready.pop_front() {
                state.sent_chars += chunk.chars().count();
                return Some((Ok(chunk), state));
            }
            if state.done {
                info!(sent_chars = state.sent_chars, "Streamed summary finished");
                return None;
            }

            match state.tokens.next().await {
                Some(Ok(delta)) => {
                    let chunks = state.buffer.push(&delta);
                    state.ready.extend(chunks);
                }
                Some(Err(e)) => {
                    error!(error = %e, sent_chars = state.sent_chars, "Summary stream failed mid-body");
                    state.done = true;
                    return Some((Err(e), state));
                }
                None => {
                    state.done = true;
                    state.ready.extend(state.buffer.finish());
                }
            }
        }
    });

    Body::from_stream(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed_all(buffer: &mut ChunkBuffer, deltas: &[&str]) -> Vec<String> {
        let mut out = Vec::new();
        for delta in deltas {
            out.extend(buffer.push(delta));
        }
        out.extend(buffer.finish());
        out
    }

    #[test]
    fn chunker_emits_fixed_size_pieces() {
        let mut buffer = ChunkBuffer::new(4);

        let chunks = feed_all(&mut buffer, &["abc", "defgh", "ij"]);

        assert_eq!(chunks, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn chunker_trims_surrounding_whitespace() {
        let mut buffer = ChunkBuffer::new(4);

        let chunks = feed_all(&mut buffer, &["  ", " ab", "cd  ", "  "]);

        assert_eq!(chunks, vec!["abcd"]);
    }

    #[test]
    fn chunker_keeps_inner_whitespace() {
        let mut buffer = ChunkBuffer::new(4);

        let chunks = feed_all(&mut buffer, &["ab ", " ", "cd"]);

        assert_eq!(chunks.concat(), "ab  cd");
        assert_eq!(chunks[0], "ab  ");
    }

    #[test]
    fn chunker_matches_trimmed_summary_split() {
        let summary = "  The council approved the budget. Construction begins next spring, officials said.  ";
        let deltas: Vec<&str> = summary.split_inclusive(' ').collect();

        let mut buffer = ChunkBuffer::default();
        let chunks = feed_all(&mut buffer, &deltas);

        let trimmed = summary.trim();
        let expected: Vec<String> = trimmed
            .chars()
            .collect::<Vec<_>>()
            .chunks(STREAM_CHUNK_CHARS)
            .map(|c| c.iter().collect())
            .collect();
        assert_eq!(chunks, expected);
    }

    #[test]
    fn chunker_counts_characters_not_bytes() {
        let mut buffer = ChunkBuffer::new(2);

        let chunks = feed_all(&mut buffer, &["世界你"]);

        assert_eq!(chunks, vec!["世界", "你"]);
    }

    #[test]
    fn chunker_with_only_whitespace_emits_nothing() {
        let mut buffer = ChunkBuffer::new(4);

        assert!(feed_all(&mut buffer, &["   ", "\n"]).is_empty());
    }
}
