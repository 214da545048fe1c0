//! Two-class priority dispatch scheduler (spec §4.5 — "the hard part").
//!
//! Grounded on the `Batcher`/`run_batch_worker` pattern in
//! `examples/other_examples/.../Rust-LLM-Inference-Gateway/src/batcher.rs`:
//! an mpsc queue feeding a micro-batch collection loop, with a oneshot per
//! request standing in for its completion cell. That example runs a single
//! worker per backend; this scheduler needs an independently-sized worker
//! pool per queue class, so the receiver is shared behind a `tokio::sync::Mutex`
//! and every worker in the pool takes turns draining it — the queue stays a
//! single logical MPMC channel, just built from an MPSC primitive already in
//! the dependency stack instead of pulling in a dedicated MPMC crate.
//!
//! A `Slot`'s completion cell is a `tokio::sync::oneshot` channel. Rust's
//! ownership already gives I1 (set exactly once) for free: `oneshot::Sender::send`
//! consumes `self`, so a worker cannot write the same cell twice even by
//! mistake — there is no "idempotent-guard" to implement, only one to not
//! accidentally defeat by cloning the sender.

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use serde_json::Value;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot, Mutex};

use crate::engine_client::EngineClient;

/// One pending engine call plus its single-write completion cell (spec §3 Slot).
pub struct Slot {
    pub request_body: Value,
    pub endpoint: String,
    pub custom_id: Option<String>,
    completion: oneshot::Sender<SlotResult>,
}

/// What a Slot's completion cell is set to: `{status, body}`, with transport
/// failures folded into `{status: 500, body: {"error": ...}}` (spec §3, §4.5
/// step 4).
#[derive(Debug, Clone)]
pub struct SlotResult {
    pub status: u16,
    pub body: Value,
}

#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
    pub workers: usize,
    pub max_batch: usize,
    pub wait_time: Duration,
}

impl QueueConfig {
    /// spec §4.5 table: interactive queue.
    pub const INTERACTIVE: QueueConfig = QueueConfig {
        workers: 4,
        max_batch: 1,
        wait_time: Duration::from_millis(10),
    };

    /// spec §4.5 table: batch queue.
    pub const BATCH: QueueConfig = QueueConfig {
        workers: 2,
        max_batch: 128,
        wait_time: Duration::from_millis(100),
    };
}

/// The polling granularity used while a collect window is open but the
/// queue is momentarily empty (spec §4.5 step 1: "the worker yields briefly
/// (≈10 ms) and re-checks").
const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Clone)]
pub struct Scheduler {
    interactive_tx: mpsc::Sender<Slot>,
    batch_tx: mpsc::Sender<Slot>,
}

impl Scheduler {
    /// Spawns the configured worker pool for each queue class (spec §4.8
    /// process bootstrap) and returns handles for submitting work.
    pub fn new(engine: EngineClient, interactive: QueueConfig, batch: QueueConfig) -> Self {
        let interactive_tx = spawn_pool(engine.clone(), interactive);
        let batch_tx = spawn_pool(engine, batch);
        Self {
            interactive_tx,
            batch_tx,
        }
    }

    /// Enqueues a slot on the interactive queue and awaits its result.
    pub async fn submit_interactive(&self, request_body: Value, endpoint: String) -> SlotResult {
        submit(&self.interactive_tx, request_body, endpoint, None).await
    }

    /// Enqueues a slot on the batch queue (tagged with `custom_id` so the
    /// batch manager can re-associate results) and awaits its result.
    pub async fn submit_batch(
        &self,
        request_body: Value,
        endpoint: String,
        custom_id: String,
    ) -> SlotResult {
        submit(&self.batch_tx, request_body, endpoint, Some(custom_id)).await
    }
}

async fn submit(
    tx: &mpsc::Sender<Slot>,
    request_body: Value,
    endpoint: String,
    custom_id: Option<String>,
) -> SlotResult {
    let (completion, rx) = oneshot::channel();
    let slot = Slot {
        request_body,
        endpoint,
        custom_id,
        completion,
    };

    if tx.send(slot).await.is_err() {
        return SlotResult {
            status: 500,
            body: serde_json::json!({ "error": "scheduler queue closed" }),
        };
    }

    rx.await.unwrap_or_else(|_| SlotResult {
        status: 500,
        body: serde_json::json!({ "error": "scheduler worker dropped the slot" }),
    })
}

fn spawn_pool(engine: EngineClient, cfg: QueueConfig) -> mpsc::Sender<Slot> {
    let (tx, rx) = mpsc::channel(1024);
    let rx = Arc::new(Mutex::new(rx));
    for worker_id in 0..cfg.workers {
        tokio::spawn(run_worker(worker_id, engine.clone(), rx.clone(), cfg));
    }
    tx
}

/// One worker's forever loop: collect a micro-batch within `wait_time`,
/// skip the window if nothing arrived, dispatch the batch concurrently,
/// deliver each result (spec §4.5 steps 1-4).
async fn run_worker(worker_id: usize, engine: EngineClient, queue: Arc<Mutex<mpsc::Receiver<Slot>>>, cfg: QueueConfig) {
    loop {
        let batch = collect_batch(&queue, cfg).await;
        if batch.is_empty() {
            tokio::time::sleep(POLL_INTERVAL).await;
            continue;
        }

        tracing::debug!(worker_id, batch_size = batch.len(), max_batch = cfg.max_batch, "dispatching micro-batch");
        let dispatches = batch.into_iter().map(|slot| dispatch_one(&engine, slot));
        let outcomes = join_all(dispatches).await;
        let failed = outcomes.iter().filter(|status| *status >= 500).count();
        tracing::debug!(worker_id, dispatched = outcomes.len(), failed, "micro-batch dispatch complete");
    }
}

async fn collect_batch(queue: &Arc<Mutex<mpsc::Receiver<Slot>>>, cfg: QueueConfig) -> Vec<Slot> {
    let deadline = Instant::now() + cfg.wait_time;
    let mut batch = Vec::with_capacity(cfg.max_batch);

    while batch.len() < cfg.max_batch {
        let now = Instant::now();
        if now >= deadline {
            break;
        }

        let mut guard = queue.lock().await;
        match guard.try_recv() {
            Ok(slot) => {
                drop(guard);
                batch.push(slot);
            }
            Err(TryRecvError::Empty) => {
                drop(guard);
                tokio::time::sleep(POLL_INTERVAL.min(deadline - now)).await;
            }
            Err(TryRecvError::Disconnected) => break,
        }
    }

    batch
}

async fn dispatch_one(engine: &EngineClient, slot: Slot) -> u16 {
    let result = engine.post_json(&slot.endpoint, &slot.request_body).await;
    let slot_result = match result {
        Ok(response) => SlotResult {
            status: response.status,
            body: response.body,
        },
        Err(err) => {
            tracing::warn!(endpoint = %slot.endpoint, error = %err, "engine call failed, folding into slot result");
            let (status, body) = err.to_slot_result();
            SlotResult { status, body }
        }
    };
    let status = slot_result.status;
    // A dropped receiver (caller timed out and stopped waiting) is not an error.
    let _ = slot.completion.send(slot_result);
    status
}
