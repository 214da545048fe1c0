pub mod auth;
pub mod batches;
pub mod chat;
pub mod files;

use std::sync::Arc;

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Builds the full HTTP surface (spec §4.7), with every route guarded by the
/// bearer-token middleware (spec §4.8).
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/v1/chat/completions", post(chat::chat_completions))
        .route("/v1/files", post(files::upload_file))
        .route("/v1/batches", post(batches::create_batch))
        .route("/v1/batches/:batch_id", get(batches::get_batch))
        .route("/v1/batches/:batch_id/cancel", post(batches::cancel_batch))
        .layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
