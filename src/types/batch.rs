//! Batch job wire types (spec §3 Batch, BatchCreate, BatchRequestCounts),
//! mirrored on `async-openai::types::batches::batch` but limited to the one
//! endpoint this gateway proxies for (`/v1/chat/completions`).

use super::chat::CompletionUsage;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,
    InProgress,
    Cancelling,
    Cancelled,
    Completed,
    Failed,
    Expired,
}

/// The body of a `POST /v1/batches` request.
#[derive(Debug, Clone, Deserialize)]
pub struct BatchCreate {
    pub input_file_id: String,
    pub endpoint: String,
    pub completion_window: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct BatchRequestCounts {
    pub total: u64,
    pub completed: u64,
    pub failed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchErrors {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: String,
    pub object: String,
    pub endpoint: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BatchErrors>,
    pub input_file_id: String,
    pub completion_window: String,
    pub status: BatchStatus,
    pub output_file_id: Option<String>,
    pub error_file_id: Option<String>,
    pub created_at: i64,
    pub in_progress_at: Option<i64>,
    pub expires_at: Option<i64>,
    pub completed_at: Option<i64>,
    pub failed_at: Option<i64>,
    pub cancelling_at: Option<i64>,
    pub cancelled_at: Option<i64>,
    pub request_counts: BatchRequestCounts,
    pub usage: CompletionUsage,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
}

impl Batch {
    pub fn new(
        id: String,
        endpoint: String,
        input_file_id: String,
        completion_window: String,
        created_at: i64,
        metadata: Option<serde_json::Map<String, serde_json::Value>>,
    ) -> Self {
        Self {
            id,
            object: "batch".to_string(),
            endpoint,
            errors: None,
            input_file_id,
            completion_window,
            status: BatchStatus::Pending,
            output_file_id: None,
            error_file_id: None,
            created_at,
            in_progress_at: None,
            expires_at: None,
            completed_at: None,
            failed_at: None,
            cancelling_at: None,
            cancelled_at: None,
            request_counts: BatchRequestCounts::default(),
            usage: CompletionUsage::default(),
            metadata,
        }
    }

    /// Terminal states can no longer transition (spec §4.6 cancel: cancelling
    /// a batch already in `{cancelling, cancelled, completed, failed,
    /// expired}` is rejected with 400).
    pub fn is_terminal_or_cancelling(&self) -> bool {
        matches!(
            self.status,
            BatchStatus::Cancelling
                | BatchStatus::Cancelled
                | BatchStatus::Completed
                | BatchStatus::Failed
                | BatchStatus::Expired
        )
    }
}
