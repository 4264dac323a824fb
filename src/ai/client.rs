//! Summarization model backend.
//!
//! The pretrained seq2seq model runs behind an HTTP inference endpoint; this
//! module owns the wire format for both the one-shot and the streamed call.

use std::collections::VecDeque;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use reqwest::Client;
use reqwest::header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, info, warn};

use super::sse::{ParseResult, SseParser, StreamEvent};
use crate::core::config::AppConfig;
use crate::errors::ServiceError;
use crate::text::normalize_whitespace;

pub const NUM_BEAMS: usize = 4;
pub const LENGTH_PENALTY: f64 = 2.0;
pub const NO_REPEAT_NGRAM_SIZE: usize = 3;

/// Beam search settings sent with every generation call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationParams {
    pub max_length: usize,
    pub min_length: usize,
    pub num_beams: usize,
    pub length_penalty: f64,
    pub no_repeat_ngram_size: usize,
    pub early_stopping: bool,
}

impl GenerationParams {
    #[must_use]
    pub fn new(max_length: usize, min_length: usize) -> Self {
        Self {
            max_length,
            min_length,
            num_beams: NUM_BEAMS,
            length_penalty: LENGTH_PENALTY,
            no_repeat_ngram_size: NO_REPEAT_NGRAM_SIZE,
            early_stopping: true,
        }
    }
}

/// A fully prepared generation call: normalized, prefixed and truncated input.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub inputs: String,
    pub params: GenerationParams,
}

/// Stream of generated text deltas, in order.
pub type TokenStream = Pin<Box<dyn Stream<Item = Result<String, ServiceError>> + Send>>;

#[async_trait]
pub trait SummaryBackend: Send + Sync {
    /// Runs generation to completion and returns the decoded summary.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ServiceError>;

    /// Starts generation and yields text as the model produces it.
    async fn generate_stream(&self, request: &GenerationRequest)
    -> Result<TokenStream, ServiceError>;
}

/// HTTP client for a hosted summarization model.
#[derive(Debug, Clone)]
pub struct HttpSummaryBackend {
    client: Client,
    url: String,
    api_token: Option<String>,
}

impl HttpSummaryBackend {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        url: impl Into<String>,
        api_token: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            ServiceError::HttpError(format!("Failed to build summarizer HTTP client: {e}"))
        })?;

        Ok(Self {
            client,
            url: url.into(),
            api_token,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, ServiceError> {
        Self::new(
            config.summarizer_url.clone(),
            config.summarizer_api_token.clone(),
            Duration::from_secs(config.summarizer_timeout_secs),
        )
    }

    fn headers(&self, streaming: bool) -> Result<HeaderMap, ServiceError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        if streaming {
            headers.insert(ACCEPT, HeaderValue::from_static("text/event-stream"));
        }

        if let Some(token) = &self.api_token {
            let auth_value = format!("Bearer {token}")
                .parse()
                .map_err(|e| ServiceError::HttpError(format!("Invalid Authorization header: {e}")))?;
            headers.insert(AUTHORIZATION, auth_value);
        }

        Ok(headers)
    }

    async fn post(
        &self,
        request: &GenerationRequest,
        streaming: bool,
    ) -> Result<reqwest::Response, ServiceError> {
        let body = build_request_body(request, streaming);

        let response = self
            .client
            .post(&self.url)
            .headers(self.headers(streaming)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::HttpError(format!("Summarizer request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_else(|e| {
                format!("Failed to read error response body (status {status}): {e}")
            });
            return Err(ServiceError::BackendError(format!(
                "status {status}: {}",
                extract_backend_error(&error_text)
            )));
        }

        Ok(response)
    }
}

#[async_trait]
impl SummaryBackend for HttpSummaryBackend {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, ServiceError> {
        #[cfg(feature = "debug-logs")]
        debug!(params = ?request.params, "Summarizer generation parameters");

        info!(
            input_chars = request.inputs.chars().count(),
            max_length = request.params.max_length,
            min_length = request.params.min_length,
            "Requesting summary"
        );

        let response = self.post(request, false).await?;
        let payload: Value = response.json().await.map_err(|e| {
            ServiceError::BackendError(format!("Invalid summarizer response body: {e}"))
        })?;

        parse_summary_payload(&payload)
    }

    async fn generate_stream(
        &self,
        request: &GenerationRequest,
    ) -> Result<TokenStream, ServiceError> {
        info!(
            input_chars = request.inputs.chars().count(),
            max_length = request.params.max_length,
            min_length = request.params.min_length,
            "Requesting streamed summary"
        );

        let response = self.post(request, true).await?;
        Ok(ActiveStreamingResponse::new(Box::pin(response.bytes_stream())).into_text_stream())
    }
}

/// Builds the inference request payload.
#[must_use]
pub fn build_request_body(request: &GenerationRequest, streaming: bool) -> Value {
    let mut body = json!({
        "inputs": request.inputs,
        "parameters": request.params,
        "options": { "wait_for_model": true }
    });
    if streaming {
        body["stream"] = Value::Bool(true);
    }
    body
}

/// Pulls the summary out of `[{"summary_text": ...}]` (or `generated_text`).
///
/// # Errors
///
/// Returns `BackendError` if the payload reports an error or has no summary.
pub fn parse_summary_payload(payload: &Value) -> Result<String, ServiceError> {
    if let Some(error) = payload.get("error") {
        let message = error
            .as_str()
            .map(ToString::to_string)
            .unwrap_or_else(|| error.to_string());
        return Err(ServiceError::BackendError(message));
    }

    let first = payload
        .as_array()
        .and_then(|items| items.first())
        .unwrap_or(payload);

    first
        .get("summary_text")
        .or_else(|| first.get("generated_text"))
        .and_then(Value::as_str)
        .map(ToString::to_string)
        .ok_or_else(|| {
            ServiceError::BackendError("Summarizer response contained no summary".to_string())
        })
}

/// Proxies in front of the model answer with HTML pages; those are rendered
/// down to their text.
fn extract_backend_error(body: &str) -> String {
    if let Some(message) = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("error").and_then(Value::as_str).map(ToString::to_string))
    {
        return message;
    }

    if body.trim_start().starts_with('<') {
        if let Ok(text) = html2text::from_read(body.as_bytes(), 10_000) {
            return normalize_whitespace(&text);
        }
    }
    body.to_string()
}

/// Type alias for the boxed byte stream.
type ByteStream = Pin<Box<dyn Stream<Item = Result<bytes::Bytes, reqwest::Error>> + Send>>;

/// An in-flight streamed generation.
pub struct ActiveStreamingResponse {
    byte_stream: ByteStream,
    parser: SseParser,
    pending_results: VecDeque<ParseResult>,
    utf8_buffer: Vec<u8>,
    saw_completed_event: bool,
    saw_any_text: bool,
    completed: bool,
}

impl std::fmt::Debug for ActiveStreamingResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActiveStreamingResponse")
            .field("completed", &self.completed)
            .field("saw_completed_event", &self.saw_completed_event)
            .field("saw_any_text", &self.saw_any_text)
            .field("pending_results_len", &self.pending_results.len())
            .field("utf8_buffer_len", &self.utf8_buffer.len())
            .field("parser_buffer_len", &self.parser.remaining_buffer().len())
            .finish_non_exhaustive()
    }
}

impl ActiveStreamingResponse {
    fn new(byte_stream: ByteStream) -> Self {
        Self {
            byte_stream,
            parser: SseParser::new(),
            pending_results: VecDeque::new(),
            utf8_buffer: Vec::new(),
            saw_completed_event: false,
            saw_any_text: false,
            completed: false,
        }
    }

    fn drain_pending_results(&mut self) -> Option<StreamEvent> {
        while let Some(result) = self.pending_results.pop_front() {
            match result {
                ParseResult::Event(StreamEvent::Completed) => {
                    self.saw_completed_event = true;
                    self.completed = true;
                    return Some(StreamEvent::Completed);
                }
                ParseResult::Event(StreamEvent::Error(msg)) => {
                    self.completed = true;
                    return Some(StreamEvent::Error(msg));
                }
                ParseResult::Event(StreamEvent::TextDelta(delta)) => {
                    if !delta.is_empty() {
                        self.saw_any_text = true;
                    }
                    return Some(StreamEvent::TextDelta(delta));
                }
                ParseResult::Done => {
                    self.completed = true;
                    return self.finish_without_completion("[DONE]");
                }
                ParseResult::UnknownEvent(kind) => {
                    debug!(kind = %kind, "Ignoring summarizer SSE payload");
                }
            }
        }

        None
    }

    /// Some servers end the stream without a final `generated_text` frame.
    /// Text already received is treated as a complete summary.
    fn finish_without_completion(&mut self, reason: &str) -> Option<StreamEvent> {
        if self.saw_completed_event {
            return None;
        }
        if self.saw_any_text {
            warn!(reason, "Summarizer stream ended without final frame; treating as completed");
            self.saw_completed_event = true;
            return Some(StreamEvent::Completed);
        }
        warn!(reason, "Summarizer stream ended before producing any text");
        Some(StreamEvent::Error(
            "Summarizer stream ended before producing any text".to_string(),
        ))
    }

    /// Returns the next stream event, or `None` once the stream is complete.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failures or invalid UTF-8.
    pub async fn next_event(&mut self) -> Result<Option<StreamEvent>, ServiceError> {
        if self.completed && self.pending_results.is_empty() {
            return Ok(None);
        }

        loop {
            // Several frames can arrive in one HTTP chunk; never drop parsed results.
            if let Some(event) = self.drain_pending_results() {
                return Ok(Some(event));
            }
            if self.completed {
                return Ok(None);
            }

            match self.byte_stream.next().await {
                Some(Ok(bytes)) => {
                    // Codepoints may be split across chunks; only feed the valid prefix.
                    self.utf8_buffer.extend_from_slice(&bytes);

                    match std::str::from_utf8(&self.utf8_buffer) {
                        Ok(valid_str) => {
                            self.pending_results.extend(self.parser.feed(valid_str));
                            self.utf8_buffer.clear();
                        }
                        Err(e) => {
                            if e.error_len().is_some() {
                                self.completed = true;
                                return Err(ServiceError::BackendError(
                                    "Invalid UTF-8 in summarizer stream".to_string(),
                                ));
                            }
                            let valid_up_to = e.valid_up_to();
                            if valid_up_to > 0 {
                                let prefix = String::from_utf8_lossy(&self.utf8_buffer[..valid_up_to])
                                    .into_owned();
                                self.pending_results.extend(self.parser.feed(&prefix));
                                self.utf8_buffer.drain(..valid_up_to);
                            }
                        }
                    }
                }
                Some(Err(e)) => {
                    self.completed = true;
                    return Err(ServiceError::HttpError(format!(
                        "Error reading summarizer stream: {e}"
                    )));
                }
                None => {
                    self.completed = true;
                    return Ok(self.finish_without_completion("eof"));
                }
            }
        }
    }

    /// Adapts the response into a stream of non-empty text deltas.
    #[must_use]
    pub fn into_text_stream(self) -> TokenStream {
        Box::pin(futures::stream::unfold(self, |mut resp| async move {
            loop {
                match resp.next_event().await {
                    Ok(Some(StreamEvent::TextDelta(delta))) => {
                        if delta.is_empty() {
                            continue;
                        }
                        return Some((Ok(delta), resp));
                    }
                    Ok(Some(StreamEvent::Completed) | None) => return None,
                    Ok(Some(StreamEvent::Error(msg))) => {
                        return Some((
                            Err(ServiceError::BackendError(format!(
                                "Summarizer streaming error: {msg}"
                            ))),
                            resp,
                        ));
                    }
                    Err(e) => return Some((Err(e), resp)),
                }
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response_from(chunks: Vec<&'static str>) -> ActiveStreamingResponse {
        let stream = futures::stream::iter(
            chunks
                .into_iter()
                .map(|c| Ok(bytes::Bytes::from_static(c.as_bytes())))
                .collect::<Vec<_>>(),
        );
        ActiveStreamingResponse::new(Box::pin(stream))
    }

    async fn collect_text(resp: ActiveStreamingResponse) -> Result<String, ServiceError> {
        let mut tokens = resp.into_text_stream();
        let mut collected = String::new();
        while let Some(delta) = tokens.next().await {
            collected.push_str(&delta?);
        }
        Ok(collected)
    }

    #[test]
    fn test_generation_params_defaults() {
        let params = GenerationParams::new(200, 150);
        assert_eq!(params.num_beams, 4);
        assert!((params.length_penalty - 2.0).abs() < f64::EPSILON);
        assert_eq!(params.no_repeat_ngram_size, 3);
        assert!(params.early_stopping);
    }

    #[test]
    fn test_request_body_shape() {
        let request = GenerationRequest {
            inputs: "Some text".to_string(),
            params: GenerationParams::new(60, 10),
        };

        let body = build_request_body(&request, false);
        assert_eq!(body["inputs"], "Some text");
        assert_eq!(body["parameters"]["max_length"], 60);
        assert_eq!(body["parameters"]["min_length"], 10);
        assert_eq!(body["parameters"]["num_beams"], 4);
        assert_eq!(body["options"]["wait_for_model"], true);
        assert!(body.get("stream").is_none());

        let streaming = build_request_body(&request, true);
        assert_eq!(streaming["stream"], true);
    }

    #[test]
    fn test_parse_summary_payload_variants() {
        let hf = json!([{ "summary_text": "Short." }]);
        assert_eq!(parse_summary_payload(&hf).unwrap(), "Short.");

        let generated = json!({ "generated_text": "Also short." });
        assert_eq!(parse_summary_payload(&generated).unwrap(), "Also short.");

        let err = parse_summary_payload(&json!({ "error": "Model is loading" })).unwrap_err();
        assert!(err.to_string().contains("Model is loading"));

        assert!(parse_summary_payload(&json!([])).is_err());
    }

    #[test]
    fn test_extract_backend_error() {
        assert_eq!(extract_backend_error("{\"error\":\"boom\"}"), "boom");
        assert_eq!(extract_backend_error("plain text"), "plain text");

        let gateway = "<html><head><title>502</title></head>\
                       <body><h1>Bad Gateway</h1><p>upstream unavailable</p></body></html>";
        let message = extract_backend_error(gateway);
        assert!(message.contains("Bad Gateway"), "{message}");
        assert!(message.contains("upstream unavailable"), "{message}");
        assert!(!message.contains('<'), "{message}");
    }

    #[tokio::test]
    async fn test_next_event_does_not_drop_multiple_events_in_single_chunk() {
        let mut resp = response_from(vec![
            "data: {\"token\":{\"text\":\"Hello\"}}\n\ndata: {\"token\":{\"text\":\" World\"},\"generated_text\":\"Hello World\"}\n\n",
        ]);

        assert_eq!(
            resp.next_event().await.unwrap(),
            Some(StreamEvent::TextDelta("Hello".to_string()))
        );
        assert_eq!(
            resp.next_event().await.unwrap(),
            Some(StreamEvent::TextDelta(" World".to_string()))
        );
        assert_eq!(resp.next_event().await.unwrap(), Some(StreamEvent::Completed));
        assert_eq!(resp.next_event().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_next_event_handles_utf8_split_across_byte_chunks() {
        let event = "data: {\"token\":{\"text\":\"Hello 世界\"}}\n\n".as_bytes();
        let split_at = event
            .iter()
            .position(|b| *b == 0xE4)
            .expect("expected UTF-8 multi-byte sequence in test input");

        let chunk1 = bytes::Bytes::copy_from_slice(&event[..=split_at]);
        let chunk2 = bytes::Bytes::copy_from_slice(&event[split_at + 1..]);
        let stream = futures::stream::iter(vec![Ok(chunk1), Ok(chunk2)]);
        let mut resp = ActiveStreamingResponse::new(Box::pin(stream));

        assert_eq!(
            resp.next_event().await.unwrap(),
            Some(StreamEvent::TextDelta("Hello 世界".to_string()))
        );
    }

    #[tokio::test]
    async fn test_collect_text_happy_path() {
        let resp = response_from(vec![
            "data: {\"token\":{\"text\":\"Hello\"}}\n\n",
            "data: {\"token\":{\"text\":\" World\"}}\n\n",
            "data: [DONE]\n\n",
        ]);

        assert_eq!(collect_text(resp).await.unwrap(), "Hello World");
    }

    #[tokio::test]
    async fn test_collect_text_errors_on_error_event() {
        let resp = response_from(vec!["data: {\"error\":\"boom\"}\n\n"]);

        let err = collect_text(resp).await.unwrap_err();
        assert!(err.to_string().contains("boom"));
    }

    #[tokio::test]
    async fn test_eof_after_text_counts_as_completed() {
        let resp = response_from(vec!["data: {\"token\":{\"text\":\"partial\"}}\n\n"]);

        assert_eq!(collect_text(resp).await.unwrap(), "partial");
    }

    #[tokio::test]
    async fn test_eof_without_text_is_an_error() {
        let resp = response_from(vec![": keep-alive\n\n"]);

        assert!(collect_text(resp).await.is_err());
    }

    #[tokio::test]
    async fn test_text_stream_yields_deltas_then_ends() {
        let resp = response_from(vec![
            "data: {\"token\":{\"text\":\"\"}}\n\n",
            "data: {\"token\":{\"text\":\"A\"}}\n\n",
            "data: {\"token\":{\"text\":\"B\"},\"generated_text\":\"AB\"}\n\n",
        ]);

        let deltas: Vec<String> = resp
            .into_text_stream()
            .map(|r| r.unwrap())
            .collect()
            .await;
        assert_eq!(deltas, vec!["A", "B"]);
    }

    #[tokio::test]
    async fn test_next_event_errors_on_network_error() {
        // Build a reqwest::Error without doing any network I/O.
        let req_err = reqwest::Client::new().get("not a url").build().unwrap_err();
        let stream = futures::stream::iter(vec![Err(req_err)]);
        let mut resp = ActiveStreamingResponse::new(Box::pin(stream));

        let err = resp.next_event().await.unwrap_err();
        assert!(matches!(err, ServiceError::HttpError(_)));
        assert_eq!(resp.next_event().await.unwrap(), None);
    }
}
