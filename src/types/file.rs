//! File object wire type (spec §3 FileObject), mirrored on
//! `async-openai::types::files::OpenAIFile` but trimmed to the purposes this
//! gateway actually serves: batch input uploads and batch output/error
//! downloads.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilePurpose {
    Batch,
    BatchOutput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileObject {
    pub id: String,
    pub object: String,
    pub bytes: u64,
    pub created_at: i64,
    pub filename: String,
    pub purpose: FilePurpose,
}

impl FileObject {
    pub fn new(id: String, bytes: u64, created_at: i64, filename: String, purpose: FilePurpose) -> Self {
        Self {
            id,
            object: "file".to_string(),
            bytes,
            created_at,
            filename,
            purpose,
        }
    }
}
