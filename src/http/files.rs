//! `POST /v1/files` (spec §4.7), grounded on
//! `original_source/backend/routes/batch.py`'s `upload_file`.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::Json;

use crate::error::GatewayError;
use crate::state::AppState;
use crate::types::file::{FileObject, FilePurpose};

pub async fn upload_file(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<FileObject>, GatewayError> {
    let mut bytes: Option<Vec<u8>> = None;
    let mut filename = "upload".to_string();
    let mut purpose: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| GatewayError::BadRequest(e.to_string()))?
    {
        match field.name() {
            Some("file") => {
                filename = field.file_name().unwrap_or("upload").to_string();
                bytes = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| GatewayError::BadRequest(e.to_string()))?
                        .to_vec(),
                );
            }
            Some("purpose") => {
                purpose = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| GatewayError::BadRequest(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let purpose = purpose.ok_or_else(|| GatewayError::BadRequest("Purpose must be 'batch'".to_string()))?;
    if purpose != "batch" {
        return Err(GatewayError::BadRequest("Purpose must be 'batch'".to_string()));
    }
    let bytes = bytes.ok_or_else(|| GatewayError::BadRequest("missing file field".to_string()))?;

    let file = state
        .blob_store
        .put(&bytes, filename, FilePurpose::Batch)
        .await
        .map_err(|e| GatewayError::Internal(e.to_string()))?;

    Ok(Json(file))
}
