//! Process bootstrap (spec §4.8 / §2 item 8).
//!
//! Mirrors `original_source/backend/main.py`'s `startup_event`: load
//! configuration, load the tokenizer, create the blob store directory, spin
//! up the scheduler's worker pools, then serve HTTP.

use std::sync::Arc;

use vllm_gateway::blob_store::BlobStore;
use vllm_gateway::config::Config;
use vllm_gateway::engine_client::EngineClient;
use vllm_gateway::http;
use vllm_gateway::registry::BatchRegistry;
use vllm_gateway::scheduler::{QueueConfig, Scheduler};
use vllm_gateway::state::AppState;
use vllm_gateway::tokenizer::Tokenizer;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env();
    let bind_addr = config.bind_addr;

    let engine = EngineClient::new(config.vllm_url.clone(), config.engine_timeout);
    let scheduler = Scheduler::new(engine.clone(), QueueConfig::INTERACTIVE, QueueConfig::BATCH);
    let blob_store = BlobStore::new(&config.blob_store_dir).expect("blob store directory is writable");
    let tokenizer = Tokenizer::load();

    let state = Arc::new(AppState {
        config,
        engine,
        scheduler,
        blob_store,
        batches: BatchRegistry::new(),
        tokenizer,
    });

    tracing::info!(%bind_addr, "starting gateway");

    let listener = tokio::net::TcpListener::bind(bind_addr)
        .await
        .expect("failed to bind HTTP listener");
    axum::serve(listener, http::router(state))
        .await
        .expect("server exited unexpectedly");
}
