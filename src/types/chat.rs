//! Chat-completion wire types (spec §3).
//!
//! `async-openai`'s `types::chat` module models the full upstream schema —
//! tool calls, function definitions, response formats, and more. Spec §3
//! only *names* a subset of fields as recognized; everything else must
//! still reach the engine untouched. Rather than replicating the entire
//! OpenAI chat schema, known fields are typed and the rest rides along in
//! `extra` via `#[serde(flatten)]` — this is the "Dynamic JSON objects"
//! design note in spec §9 made concrete.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

fn default_false() -> bool {
    false
}

/// The OpenAI chat-completion request payload (spec §3 ChatRequest).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_false")]
    pub stream: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stream_options: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub presence_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency_penalty: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logit_bias: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,

    /// Every field the typed struct above doesn't recognize, preserved
    /// verbatim on the way to the engine (spec §3: "Unknown fields are
    /// preserved verbatim").
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Usage statistics for a completion, modeled on `async-openai`'s
/// `CompletionUsage` — used both for the interactive proxy response and for
/// a batch job's running sum (spec §3 I5).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionUsage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
}

impl CompletionUsage {
    /// Extracts usage from an arbitrary engine response body, treating a
    /// missing or malformed `usage` object as all zeros (spec §4.6 step 6:
    /// "treating missing fields as 0, non-dict usage as 0").
    pub fn from_body(body: &Value) -> Self {
        let usage = body.get("usage");
        match usage.and_then(Value::as_object) {
            Some(obj) => Self {
                prompt_tokens: obj.get("prompt_tokens").and_then(Value::as_u64).unwrap_or(0),
                completion_tokens: obj
                    .get("completion_tokens")
                    .and_then(Value::as_u64)
                    .unwrap_or(0),
            },
            None => Self::default(),
        }
    }

    pub fn add_assign(&mut self, other: CompletionUsage) {
        self.prompt_tokens += other.prompt_tokens;
        self.completion_tokens += other.completion_tokens;
    }
}
