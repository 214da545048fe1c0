//! Process-wide `Batch` registry (spec §5: "An implementation must serialize
//! writes ... to prevent torn reads of a `Batch` struct; HTTP handlers return
//! a point-in-time snapshot").
//!
//! Grounded on the teacher's habit of keeping shared mutable state behind a
//! single lock at the narrowest possible scope (e.g. `http_client.rs`'s
//! `Arc<dyn HttpClient>`); here the lock guards a `HashMap` rather than a
//! trait object, per spec §9's "global mutable maps become a guarded
//! in-memory registry" redesign note.

use std::collections::HashMap;
use std::sync::Mutex;

use crate::types::batch::Batch;

#[derive(Default)]
pub struct BatchRegistry {
    batches: Mutex<HashMap<String, Batch>>,
}

impl BatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, batch: Batch) {
        self.batches
            .lock()
            .expect("batch registry lock poisoned")
            .insert(batch.id.clone(), batch);
    }

    /// Returns a value-copy snapshot so callers never observe interior
    /// mutability (spec §9).
    pub fn get(&self, id: &str) -> Option<Batch> {
        self.batches
            .lock()
            .expect("batch registry lock poisoned")
            .get(id)
            .cloned()
    }

    /// Applies `f` to the stored batch under the lock, returning its result.
    /// This is the only way callers mutate a batch, so every write is
    /// serialized against every other read/write (spec §5).
    pub fn update<R>(&self, id: &str, f: impl FnOnce(&mut Batch) -> R) -> Option<R> {
        let mut guard = self.batches.lock().expect("batch registry lock poisoned");
        guard.get_mut(id).map(f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_mutates_in_place_and_get_snapshots() {
        let registry = BatchRegistry::new();
        let batch = Batch::new(
            "batch_1".to_string(),
            "/v1/chat/completions".to_string(),
            "file-in".to_string(),
            "24h".to_string(),
            0,
            None,
        );
        registry.insert(batch);

        registry.update("batch_1", |b| {
            b.request_counts.total = 3;
        });

        let snapshot = registry.get("batch_1").unwrap();
        assert_eq!(snapshot.request_counts.total, 3);
    }

    #[test]
    fn get_on_unknown_id_is_none() {
        let registry = BatchRegistry::new();
        assert!(registry.get("missing").is_none());
    }
}
