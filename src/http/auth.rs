//! Static bearer-token auth middleware (spec §4.8).
//!
//! Grounded on `original_source/compose/backend/utils/authorization.py`'s
//! `auth_middleware`: a single exact-match comparison, gating everything
//! behind it, pass-through when no token is configured.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;

use crate::error::GatewayError;
use crate::state::AppState;

pub async fn require_bearer_token(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, GatewayError> {
    if !state.config.auth_enabled() {
        return Ok(next.run(request).await);
    }

    let expected = format!("Bearer {}", state.config.api_token);
    let provided = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match provided {
        Some(header) if header == expected => Ok(next.run(request).await),
        _ => Err(GatewayError::Auth),
    }
}
