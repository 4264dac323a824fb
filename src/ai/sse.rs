//! Server-Sent Events (SSE) parser for streamed summary generation.
//!
//! This module provides a robust SSE parser that handles:
//! - Frames split across TCP chunks
//! - Multiple frames in one read
//! - Unknown payloads (safely ignored)
//!
//! It emits strongly-typed events for the token streaming format used by
//! hosted inference servers: one `{"token": {...}}` frame per generated
//! token, with `generated_text` set on the final frame.

use serde_json::Value;

/// Events emitted by a streaming generation endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// Text of one generated (non-special) token.
    TextDelta(String),
    /// Generation finished successfully.
    Completed,
    /// The server reported an error mid-stream.
    Error(String),
}

/// Result of parsing an SSE frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseResult {
    /// A complete event was parsed.
    Event(StreamEvent),
    /// The frame was valid JSON but carried nothing we act on.
    UnknownEvent(String),
    /// End of stream signal (`[DONE]`).
    Done,
}

/// Stateful SSE parser that buffers incomplete frames across chunk boundaries.
#[derive(Debug, Default)]
pub struct SseParser {
    /// Buffer for accumulating incomplete frames.
    buffer: String,
}

impl SseParser {
    /// Creates a new SSE parser.
    #[must_use]
    pub fn new() -> Self {
        Self {
            buffer: String::new(),
        }
    }

    /// Feeds a chunk of data to the parser and returns all complete events.
    ///
    /// This method handles:
    /// - Partial frames (buffered for next chunk)
    /// - Multiple frames in one chunk
    /// - Empty lines between events
    pub fn feed(&mut self, chunk: &str) -> Vec<ParseResult> {
        self.buffer.push_str(chunk);
        let mut results = Vec::new();

        // SSE events are separated by double newlines
        while let Some(event_end) = self.find_event_boundary() {
            let event_text = self.buffer[..event_end].to_string();
            self.buffer = self.buffer[event_end..]
                .trim_start_matches(&['\r', '\n'][..])
                .to_string();

            results.extend(Self::parse_event(&event_text));
        }

        results
    }

    /// Finds the end of a complete SSE event (double newline boundary).
    fn find_event_boundary(&self) -> Option<usize> {
        let lf = self.buffer.find("\n\n").map(|pos| pos + 2);
        let crlf = self.buffer.find("\r\n\r\n").map(|pos| pos + 4);
        match (lf, crlf) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Parses a single SSE event block.
    fn parse_event(event_text: &str) -> Vec<ParseResult> {
        let mut data_lines: Vec<&str> = Vec::new();

        for line in event_text.lines() {
            let line = line.trim();

            // Skip empty lines and comments
            if line.is_empty() || line.starts_with(':') {
                continue;
            }

            if let Some(data) = line.strip_prefix("data:") {
                let data = data.trim();
                if !data.is_empty() {
                    data_lines.push(data);
                }
            }
            // `event:`, `id:` and `retry:` lines carry nothing we need.
        }

        if data_lines.is_empty() {
            return Vec::new();
        }

        let data = data_lines.join("\n");

        if data == "[DONE]" {
            return vec![ParseResult::Done];
        }

        Self::parse_json_event(&data)
    }

    /// Parses the JSON payload from an SSE data field.
    ///
    /// A final token frame yields both its text delta and `Completed`.
    fn parse_json_event(data: &str) -> Vec<ParseResult> {
        let Ok(json) = serde_json::from_str::<Value>(data) else {
            return Vec::new();
        };

        if let Some(error) = json.get("error") {
            return vec![ParseResult::Event(StreamEvent::Error(
                extract_error_message(error),
            ))];
        }

        let mut results = Vec::new();

        if let Some(token) = json.get("token") {
            let special = token
                .get("special")
                .and_then(Value::as_bool)
                .unwrap_or(false);
            if !special {
                let text = token.get("text").and_then(Value::as_str).unwrap_or("");
                results.push(ParseResult::Event(StreamEvent::TextDelta(text.to_string())));
            }
        }

        let finished = json
            .get("generated_text")
            .is_some_and(|v| !v.is_null());
        if finished {
            results.push(ParseResult::Event(StreamEvent::Completed));
        }

        if results.is_empty() && json.get("token").is_none() {
            let kind = json
                .get("type")
                .and_then(Value::as_str)
                .unwrap_or("untyped")
                .to_string();
            results.push(ParseResult::UnknownEvent(kind));
        }

        results
    }

    /// Returns the unparsed tail of the input.
    #[must_use]
    pub fn remaining_buffer(&self) -> &str {
        &self.buffer
    }
}

/// Extracts an error message from an `error` field that may be a string or object.
fn extract_error_message(error: &Value) -> String {
    if let Some(msg) = error.as_str() {
        return msg.to_string();
    }
    if let Some(msg) = error.get("message").and_then(Value::as_str) {
        return msg.to_string();
    }

    "Unknown error".to_string()
}
