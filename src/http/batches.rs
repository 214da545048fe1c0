//! `/v1/batches` routes (spec §4.6 Create/Get/Cancel), grounded on
//! `original_source/backend/routes/batch.py`'s `create_batch`/`retrieve_batch`/
//! `cancel_batch` and on the axum handler shape in
//! `examples/other_examples/.../dwctl/src/api/handlers/batches.rs`
//! (`State` extractor, `Result<(StatusCode, Json<T>)>` return type).

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use uuid::Uuid;

use crate::batch_job;
use crate::error::GatewayError;
use crate::state::AppState;
use crate::types::batch::{Batch, BatchCreate, BatchStatus};

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}

pub async fn create_batch(
    State(state): State<Arc<AppState>>,
    Json(create): Json<BatchCreate>,
) -> Result<(StatusCode, Json<Batch>), GatewayError> {
    let batch_id = format!("batch_{}", Uuid::new_v4());
    let batch = Batch::new(
        batch_id.clone(),
        create.endpoint,
        create.input_file_id,
        create.completion_window,
        now(),
        create.metadata,
    );
    state.batches.insert(batch.clone());

    tokio::spawn(batch_job::run(state.clone(), batch_id));

    Ok((StatusCode::CREATED, Json(batch)))
}

pub async fn get_batch(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<String>,
) -> Result<Json<Batch>, GatewayError> {
    state
        .batches
        .get(&batch_id)
        .map(Json)
        .ok_or_else(|| GatewayError::NotFound("Batch not found".to_string()))
}

pub async fn cancel_batch(
    State(state): State<Arc<AppState>>,
    Path(batch_id): Path<String>,
) -> Result<Json<Batch>, GatewayError> {
    if state.batches.get(&batch_id).is_none() {
        return Err(GatewayError::NotFound("Batch not found".to_string()));
    }

    let cancelled_at = now();
    let outcome = state.batches.update(&batch_id, |batch| {
        if batch.is_terminal_or_cancelling() {
            return Err(batch.status);
        }
        batch.status = BatchStatus::Cancelling;
        batch.cancelling_at = Some(cancelled_at);
        Ok(batch.clone())
    });

    match outcome {
        Some(Ok(batch)) => Ok(Json(batch)),
        Some(Err(status)) => Err(GatewayError::BadRequest(format!(
            "Batch is already in a terminal state: {status:?}"
        ))),
        None => Err(GatewayError::NotFound("Batch not found".to_string())),
    }
}
