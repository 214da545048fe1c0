//! Asynchronous batch-job execution (spec §4.6 "Execute (background)").
//!
//! A line-by-line translation of
//! `original_source/backend/routes/batch.py`'s `process_batch_in_background`
//! into the manager/registry/scheduler split this gateway uses instead of a
//! module-level `batches_db` dict. Buffers output/error lines in memory and
//! writes each artifact once at the end rather than appending line-by-line
//! to an open file handle — same on-disk result, no behavior this spec cares
//! about depends on incremental flushing.

use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use futures::future::join_all;
use serde_json::Value;
use uuid::Uuid;

use crate::types::batch::{BatchErrors, BatchStatus};
use crate::types::chat::CompletionUsage;
use crate::types::file::FilePurpose;
use crate::state::AppState;

fn now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}

struct MaterializedRequest {
    custom_id: String,
    request_body: Value,
}

/// One input line either became a request, or failed to parse — the
/// failure is recorded immediately; spec §4.6 step 2-3.
enum LineOutcome {
    Request(MaterializedRequest),
    ParseError(String),
}

fn extract_message<'a>(messages: &'a [Value], role: &str) -> Option<&'a Value> {
    messages
        .iter()
        .find(|m| m.get("role").and_then(Value::as_str) == Some(role))
}

fn materialize_line(line: &str, line_number: usize) -> LineOutcome {
    let parsed: Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            return LineOutcome::ParseError(format!("Error processing line {line_number}: {e}"))
        }
    };

    let messages = match parsed.get("messages").and_then(Value::as_array) {
        Some(m) => m,
        None => {
            return LineOutcome::ParseError(format!(
                "Error processing line {line_number}: Missing system or user message in the input data."
            ))
        }
    };

    let system = extract_message(messages, "system");
    let user = extract_message(messages, "user");
    let (system, user) = match (system, user) {
        (Some(s), Some(u)) => (s, u),
        _ => {
            return LineOutcome::ParseError(format!(
                "Error processing line {line_number}: Missing system or user message in the input data."
            ))
        }
    };

    let template = system.get("content").and_then(Value::as_str).unwrap_or("");
    let data = user.get("content").and_then(Value::as_str).unwrap_or("");
    let final_content = template.replace("<user_profile>", data).replace("<system_info>", "");

    let request_body = serde_json::json!({
        "model": "qwen3-4b",
        "messages": [{"role": "system", "content": final_content}],
        "max_tokens": 256,
        "priority": 10,
    });

    LineOutcome::Request(MaterializedRequest {
        custom_id: format!("request-{line_number}"),
        request_body,
    })
}

/// Runs one batch job to completion (or cancellation). Spawned as a
/// detached task right after `POST /v1/batches` responds (spec §4.6
/// Create: "The job is then launched asynchronously").
pub async fn run(state: Arc<AppState>, batch_id: String) {
    let Some(mut batch) = state.batches.get(&batch_id) else {
        return;
    };

    let started = now();
    state.batches.update(&batch_id, |b| {
        b.status = BatchStatus::InProgress;
        b.in_progress_at = Some(started);
        b.expires_at = Some(started + 24 * 3600);
    });
    batch = state.batches.get(&batch_id).expect("just inserted");
    tracing::info!(%batch_id, "batch job started");

    let input_bytes = match state.blob_store.read(&batch.input_file_id).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::info!(%batch_id, error = %e, "batch job failed: could not read input file");
            state.batches.update(&batch_id, |b| {
                b.status = BatchStatus::Failed;
                b.failed_at = Some(now());
                b.errors = Some(BatchErrors {
                    code: "500".to_string(),
                    message: format!("Failed to read or parse input file: {e}"),
                });
            });
            return;
        }
    };
    let input_text = match String::from_utf8(input_bytes) {
        Ok(s) => s,
        Err(e) => {
            tracing::info!(%batch_id, error = %e, "batch job failed: input file is not valid utf-8");
            state.batches.update(&batch_id, |b| {
                b.status = BatchStatus::Failed;
                b.failed_at = Some(now());
                b.errors = Some(BatchErrors {
                    code: "500".to_string(),
                    message: format!("Failed to read or parse input file: {e}"),
                });
            });
            return;
        }
    };

    let mut requests = Vec::new();
    let mut error_lines = Vec::new();
    let mut parse_failures: u64 = 0;

    for (i, line) in input_text.lines().enumerate() {
        match materialize_line(line, i + 1) {
            LineOutcome::Request(req) => requests.push(req),
            LineOutcome::ParseError(detail) => {
                parse_failures += 1;
                error_lines.push(serde_json::json!({ "error": detail }).to_string());
            }
        }
    }

    state.batches.update(&batch_id, |b| {
        b.request_counts.total = requests.len() as u64;
        b.request_counts.failed = parse_failures;
    });

    let endpoint = batch.endpoint.clone();
    let dispatches = requests.iter().map(|req| {
        let scheduler = state.scheduler.clone();
        let request_body = req.request_body.clone();
        let endpoint = endpoint.clone();
        let custom_id = req.custom_id.clone();
        async move { scheduler.submit_batch(request_body, endpoint, custom_id).await }
    });
    let results = join_all(dispatches).await;

    let mut output_lines = Vec::new();
    let mut completed: u64 = 0;
    let mut failed: u64 = 0;
    let mut usage = CompletionUsage::default();
    let mut cancelled = false;

    for (req, result) in requests.iter().zip(results.into_iter()) {
        let snapshot = state.batches.get(&batch_id).expect("batch still registered");
        if snapshot.status == BatchStatus::Cancelling {
            cancelled = true;
            break;
        }

        if result.status == 200 {
            output_lines.push(
                serde_json::json!({
                    "custom_id": req.custom_id,
                    "response": {"status_code": result.status, "body": result.body},
                })
                .to_string(),
            );
            completed += 1;
            usage.add_assign(CompletionUsage::from_body(&result.body));
        } else {
            error_lines.push(
                serde_json::json!({
                    "custom_id": req.custom_id,
                    "response": {"status_code": result.status, "body": result.body},
                })
                .to_string(),
            );
            failed += 1;
        }
    }

    state.batches.update(&batch_id, |b| {
        b.request_counts.completed += completed;
        b.request_counts.failed += failed;
        b.usage.add_assign(usage);
    });

    let output_file_id = persist_artifact(
        &state,
        &output_lines,
        format!("{batch_id}_output.jsonl"),
        FilePurpose::BatchOutput,
    )
    .await;
    let error_file_id = persist_artifact(
        &state,
        &error_lines,
        format!("{batch_id}_errors.jsonl"),
        FilePurpose::BatchOutput,
    )
    .await;

    let finished = now();
    if cancelled {
        tracing::info!(%batch_id, completed, failed, "batch job cancelled");
    } else {
        tracing::info!(%batch_id, completed, failed, "batch job completed");
    }
    state.batches.update(&batch_id, |b| {
        b.output_file_id = output_file_id;
        b.error_file_id = error_file_id;
        if cancelled {
            b.status = BatchStatus::Cancelled;
            b.cancelled_at = Some(finished);
        } else {
            b.status = BatchStatus::Completed;
            b.completed_at = Some(finished);
        }
    });
}

/// Writes a JSONL artifact iff it has content, publishing a `FileObject` for
/// it; empty artifacts are never created and their IDs stay `None` (spec §3
/// I4).
async fn persist_artifact(
    state: &Arc<AppState>,
    lines: &[String],
    filename: String,
    purpose: FilePurpose,
) -> Option<String> {
    if lines.is_empty() {
        return None;
    }

    let id = format!("file-{}", Uuid::new_v4());
    let mut content = lines.join("\n");
    content.push('\n');
    tokio::fs::write(state.blob_store.path(&id), content.as_bytes())
        .await
        .ok()?;
    state
        .blob_store
        .register_existing(id.clone(), filename, purpose)
        .await
        .ok()?;
    Some(id)
}
