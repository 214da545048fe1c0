//! Shared application state, handed to every HTTP handler and background
//! task as an `Arc<AppState>` the way axum examples wire up a `State`
//! extractor.

use std::sync::Arc;

use crate::blob_store::BlobStore;
use crate::config::Config;
use crate::engine_client::EngineClient;
use crate::registry::BatchRegistry;
use crate::scheduler::Scheduler;
use crate::tokenizer::Tokenizer;

pub struct AppState {
    pub config: Config,
    /// Used only by the streaming chat path, which bypasses the scheduler
    /// entirely (spec §4.7: "An interactive streaming request bypasses the
    /// queue and is proxied directly"). The scheduler holds its own client
    /// internally for the queued paths.
    pub engine: EngineClient,
    pub scheduler: Scheduler,
    pub blob_store: BlobStore,
    pub batches: BatchRegistry,
    pub tokenizer: Tokenizer,
}

pub type SharedState = Arc<AppState>;
