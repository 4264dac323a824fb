//! Endpoint handlers. Each one parses its body, validates the required field
//! and delegates to the collaborators in [`AppState`].

use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use futures::{StreamExt, stream};
use tracing::info;

use super::helpers::{parse_body, require_field};
use super::router::AppState;
use super::streaming::chunked_body;
use crate::ai::{SummaryOptions, TokenStream};
use crate::core::models::{
    ChatRequest, DigestRequest, DigestResponse, HealthResponse, NeutralTextResponse,
    ReduceBiasRequest, SummarizeRequest, SummaryResponse,
};
use crate::errors::ServiceError;
use crate::features;

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: "sbot".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        started_at: state.started_at,
        wordnet_loaded: state.reducer.lexicon_loaded(),
        tokenizer_loaded: state.summarizer.tokenizer_loaded(),
        news_enabled: state.news.is_some(),
    })
}

#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn summarize(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let body = parse_body(payload)?;
    let stream = body.stream;
    let options = SummaryOptions::from_request(&body);
    let text = require_field(body.text, "text")?;
    info!(text_chars = text.chars().count(), stream, rewrite = options.rewrite, "Summarize request");

    if stream {
        return stream_summary(&state, &text, &options).await;
    }

    let summary = state.summarizer.summarize(&text, &options).await?;
    Ok(Json(SummaryResponse { summary }).into_response())
}

#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn summarize_stream(
    State(state): State<AppState>,
    payload: Result<Json<SummarizeRequest>, JsonRejection>,
) -> Result<Response, ServiceError> {
    let body = parse_body(payload)?;
    let options = SummaryOptions::from_request(&body);
    let text = require_field(body.text, "text")?;
    info!(text_chars = text.chars().count(), rewrite = options.rewrite, "Streamed summarize request");

    stream_summary(&state, &text, &options).await
}

async fn stream_summary(
    state: &AppState,
    text: &str,
    options: &SummaryOptions,
) -> Result<Response, ServiceError> {
    let mut tokens = state.summarizer.summarize_stream(text, options).await?;

    // Headers go out with the first byte, so a backend that fails before
    // producing any text still gets a JSON error with a proper status.
    let first = match tokens.next().await {
        Some(Ok(delta)) => delta,
        Some(Err(e)) => return Err(e),
        None => {
            return Err(ServiceError::BackendError(
                "Summarizer stream ended before producing any text".to_string(),
            ));
        }
    };
    let tokens: TokenStream = Box::pin(stream::once(async { Ok(first) }).chain(tokens));

    Ok((
        [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
        chunked_body(tokens),
    )
        .into_response())
}

#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn reduce_bias(
    State(state): State<AppState>,
    payload: Result<Json<ReduceBiasRequest>, JsonRejection>,
) -> Result<Json<NeutralTextResponse>, ServiceError> {
    let body = parse_body(payload)?;
    let text = require_field(body.text, "text")?;
    info!(text_chars = text.chars().count(), mode = ?body.mode, "Reduce bias request");

    let neutral_text = state.reducer.reduce(&text, body.mode);
    Ok(Json(NeutralTextResponse { neutral_text }))
}

#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<ChatRequest>, JsonRejection>,
) -> Result<Json<SummaryResponse>, ServiceError> {
    let body = parse_body(payload)?;
    let message = require_field(body.message, "message")?;
    info!(message_chars = message.chars().count(), "Chat request");

    let summary = features::chat(&state.reducer, &state.summarizer, &message).await?;
    Ok(Json(SummaryResponse { summary }))
}

#[tracing::instrument(skip_all, fields(request_id = %uuid::Uuid::new_v4()))]
pub async fn digest(
    State(state): State<AppState>,
    payload: Result<Json<DigestRequest>, JsonRejection>,
) -> Result<Json<DigestResponse>, ServiceError> {
    let body = parse_body(payload)?;
    let topic = require_field(body.topic, "topic")?;

    let Some(news) = state.news.as_deref() else {
        return Err(ServiceError::ServiceUnavailable(
            "News digest is not configured.".to_string(),
        ));
    };
    info!(topic_chars = topic.chars().count(), "Digest request");

    let digest =
        features::build_digest(news, &state.reducer, &state.summarizer, &topic).await?;
    Ok(Json(digest))
}
