//! `POST /v1/chat/completions` (spec §4.7).
//!
//! Grounded on `original_source/backend/routes/chat.py`'s `chat_completions`
//! and `stream_vllm_response`: truncate unconditionally, then split on
//! `stream` into a direct proxy (streaming) or a scheduler round-trip with a
//! 180s ceiling (non-streaming).

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use futures::{StreamExt, TryStreamExt};

use crate::error::{EngineError, GatewayError};
use crate::state::AppState;
use crate::tokenizer::MAX_INPUT_LENGTH;
use crate::truncate::truncate;
use crate::types::chat::ChatRequest;

const CHAT_ENDPOINT: &str = "/v1/chat/completions";
const INTERACTIVE_TIMEOUT: Duration = Duration::from_secs(180);

pub async fn chat_completions(
    State(state): State<Arc<AppState>>,
    Json(mut req): Json<ChatRequest>,
) -> Result<Response, GatewayError> {
    req.messages = truncate(&state.tokenizer, req.messages, MAX_INPUT_LENGTH);

    if req.stream {
        stream_chat(state, req).await
    } else {
        proxy_chat(state, req).await
    }
}

async fn proxy_chat(state: Arc<AppState>, req: ChatRequest) -> Result<Response, GatewayError> {
    let body = serde_json::to_value(&req).map_err(|e| GatewayError::Internal(e.to_string()))?;

    let result = tokio::time::timeout(
        INTERACTIVE_TIMEOUT,
        state.scheduler.submit_interactive(body, CHAT_ENDPOINT.to_string()),
    )
    .await
    .map_err(|_| GatewayError::UpstreamTimeout)?;

    let status = StatusCode::from_u16(result.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    Ok((status, Json(result.body)).into_response())
}

async fn stream_chat(state: Arc<AppState>, req: ChatRequest) -> Result<Response, GatewayError> {
    let body = serde_json::to_value(&req).map_err(|e| GatewayError::Internal(e.to_string()))?;

    let (status, stream) = state
        .engine
        .post_stream(CHAT_ENDPOINT, &body)
        .await
        .map_err(GatewayError::from)?;

    if status != 200 {
        let bytes = drain(stream).await.map_err(GatewayError::from)?;
        let detail = String::from_utf8_lossy(&bytes).into_owned();
        return Err(GatewayError::UpstreamStatus {
            status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
            detail,
        });
    }

    let body = Body::from_stream(stream.map_err(std::io::Error::other));
    let mut response = Response::new(body);
    response.headers_mut().insert(
        axum::http::header::CONTENT_TYPE,
        HeaderValue::from_static("text/event-stream"),
    );
    Ok(response)
}

async fn drain(
    mut stream: impl futures::Stream<Item = Result<Bytes, EngineError>> + Unpin,
) -> Result<Vec<u8>, EngineError> {
    let mut buf = Vec::new();
    while let Some(chunk) = stream.next().await {
        buf.extend_from_slice(&chunk?);
    }
    Ok(buf)
}
