//! Error types for the gateway's HTTP surface and its engine client.
//!
//! Split the way `async-openai` splits `OpenAIError` (client-facing) from
//! `StreamError` (transport-facing): [`EngineError`] covers everything that
//! can go wrong talking to the upstream engine, [`GatewayError`] covers
//! everything the HTTP surface itself can reject a request for. The
//! scheduler never lets an `EngineError` escape — it folds every variant
//! into a slot result (spec §4.5 step 4) — so `EngineError` only surfaces
//! directly on the streaming chat path, which bypasses the scheduler.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Error object shape the engine itself returns on failure, mirroring
/// `async-openai::error::ApiError`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(default)]
    pub r#type: Option<String>,
    #[serde(default)]
    pub param: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
}

/// Errors from the engine client (spec §4.4 / §7 taxonomy: UpstreamConnect,
/// UpstreamTimeout, UpstreamStatus, plus response decoding failures which
/// the scheduler treats identically to a connection failure).
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("could not connect to engine: {0}")]
    Connect(#[source] reqwest::Error),

    #[error("engine request timed out")]
    Timeout,

    #[error("failed to decode engine response: {0}")]
    Decode(#[source] reqwest::Error),

    #[error("engine returned status {status}")]
    Status { status: u16, body: Value },
}

impl EngineError {
    pub fn from_reqwest(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            EngineError::Timeout
        } else {
            EngineError::Connect(err)
        }
    }

    /// Renders this error the way the scheduler folds any upstream failure
    /// into a slot result: `{status: 500, body: {"error": <message>}}`
    /// (spec §4.5 step 4, §7 Internal).
    pub fn to_slot_result(&self) -> (u16, Value) {
        (500, serde_json::json!({ "error": self.to_string() }))
    }
}

/// Errors the HTTP surface itself can return, mapped 1:1 onto the taxonomy
/// in spec §7.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Unauthorized")]
    Auth,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error("Could not connect to vLLM service.")]
    UpstreamConnect,

    #[error("Request to vLLM timed out.")]
    UpstreamTimeout,

    #[error("vLLM Error: {detail}")]
    UpstreamStatus { status: StatusCode, detail: String },

    #[error("{0}")]
    Internal(String),
}

impl From<EngineError> for GatewayError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Connect(_) => GatewayError::UpstreamConnect,
            EngineError::Timeout => GatewayError::UpstreamTimeout,
            EngineError::Decode(e) => GatewayError::Internal(e.to_string()),
            EngineError::Status { status, body } => GatewayError::UpstreamStatus {
                status: StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                detail: body.to_string(),
            },
        }
    }
}

impl GatewayError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            GatewayError::Auth => StatusCode::UNAUTHORIZED,
            GatewayError::BadRequest(_) => StatusCode::BAD_REQUEST,
            GatewayError::NotFound(_) => StatusCode::NOT_FOUND,
            GatewayError::UpstreamConnect => StatusCode::SERVICE_UNAVAILABLE,
            GatewayError::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            GatewayError::UpstreamStatus { status, .. } => *status,
            GatewayError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Renders the FastAPI-matching envelope from spec §6: `{"error": ...}` for
/// 401, `{"detail": ...}` for every other 4xx/5xx.
impl IntoResponse for GatewayError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // Unhandled/unexpected failures log at error; everything the client
        // could reasonably cause (bad auth, bad input, upstream hiccups) logs
        // at warn.
        match &self {
            GatewayError::Internal(_) => tracing::error!(%status, error = %self, "request failed"),
            _ => tracing::warn!(%status, error = %self, "request rejected"),
        }

        let body = match &self {
            GatewayError::Auth => serde_json::json!({ "error": self.to_string() }),
            _ => serde_json::json!({ "detail": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
