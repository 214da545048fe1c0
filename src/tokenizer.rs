//! Tokenizer adapter: wraps a subword tokenizer for a fixed model family
//! behind a pure `encode`/`decode` surface.
//!
//! Grounded on the token-counting pattern in `api_xai::count_tokens`
//! (`examples/iron-cage-api_llm`), which reaches for `tiktoken-rs` to count
//! tokens the same way the upstream API would rather than estimating. The
//! gateway's engine model (`qwen3-4b`, spec §4.6 step 3) is OpenAI-compatible
//! at the wire level, so `cl100k_base` is the closest off-the-shelf BPE
//! available without vendoring a model-specific tokenizer file; swapping in
//! a real Qwen tokenizer is a drop-in replacement behind this same trait.

use tiktoken_rs::CoreBPE;

/// Maximum number of input tokens the gateway will forward to the engine
/// before truncating (spec §4.1).
pub const MAX_INPUT_LENGTH: usize = 4096;

/// Thin wrapper around a loaded BPE tokenizer. Cheap to clone (the
/// underlying `CoreBPE` is reference-counted internally by `tiktoken-rs`)
/// and safe to call concurrently — it holds no mutable state.
#[derive(Clone)]
pub struct Tokenizer {
    bpe: std::sync::Arc<CoreBPE>,
}

impl Tokenizer {
    /// Loads the tokenizer for the fixed model family. Called once at
    /// startup (spec §4.1: "Loads a subword tokenizer for a fixed model
    /// family at startup").
    pub fn load() -> Self {
        let bpe = tiktoken_rs::cl100k_base().expect("bundled cl100k_base ranks are always valid");
        Self {
            bpe: std::sync::Arc::new(bpe),
        }
    }

    pub fn encode(&self, text: &str) -> Vec<u32> {
        self.bpe.encode_with_special_tokens(text)
    }

    pub fn decode(&self, tokens: &[u32]) -> String {
        self.bpe
            .decode(tokens.to_vec())
            .unwrap_or_else(|_| String::new())
    }
}
