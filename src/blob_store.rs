//! Filesystem-backed content store keyed by opaque file IDs (spec §4.3).
//!
//! Directory bootstrap is lifted straight from `async-openai::util::create_all_dir`;
//! everything else — the `FileObject` records and the map of IDs to paths —
//! is new, since the teacher only ever uploads files, never owns storage for
//! them.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use uuid::Uuid;

use crate::types::file::{FileObject, FilePurpose};

#[derive(Debug, thiserror::Error)]
pub enum BlobStoreError {
    #[error("failed to create blob store directory: {0}")]
    CreateDir(#[source] std::io::Error),

    #[error("failed to write file: {0}")]
    Write(#[source] std::io::Error),

    #[error("unknown file id: {0}")]
    NotFound(String),
}

fn create_all_dir<P: AsRef<Path>>(dir: P) -> Result<(), BlobStoreError> {
    if !dir.as_ref().try_exists().map_err(BlobStoreError::CreateDir)? {
        std::fs::create_dir_all(dir.as_ref()).map_err(BlobStoreError::CreateDir)?;
    }
    Ok(())
}

fn now_epoch_secs() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("system clock before epoch")
        .as_secs() as i64
}

/// Plain filesystem blob store. One directory holds every uploaded and
/// generated artifact, named by file ID (spec §6: `batch_files/<file-id>`).
pub struct BlobStore {
    dir: PathBuf,
    records: Mutex<HashMap<String, FileObject>>,
}

impl BlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self, BlobStoreError> {
        let dir = dir.into();
        create_all_dir(&dir)?;
        Ok(Self {
            dir,
            records: Mutex::new(HashMap::new()),
        })
    }

    pub fn path(&self, id: &str) -> PathBuf {
        self.dir.join(id)
    }

    /// Writes `bytes` to a new file under the store, then publishes its
    /// `FileObject` record. The write completes (append-closed) before the
    /// record becomes visible (spec §4.3).
    pub async fn put(
        &self,
        bytes: &[u8],
        filename: String,
        purpose: FilePurpose,
    ) -> Result<FileObject, BlobStoreError> {
        let id = format!("file-{}", Uuid::new_v4());
        let path = self.path(&id);
        tokio::fs::write(&path, bytes)
            .await
            .map_err(BlobStoreError::Write)?;

        let file = FileObject::new(id.clone(), bytes.len() as u64, now_epoch_secs(), filename, purpose);
        self.records.lock().expect("blob store lock poisoned").insert(id, file.clone());
        Ok(file)
    }

    /// Registers a file record for an artifact already written to disk
    /// (used by the batch manager for generated output/error files), whose
    /// byte size is read back from the filesystem.
    pub async fn register_existing(
        &self,
        id: String,
        filename: String,
        purpose: FilePurpose,
    ) -> Result<FileObject, BlobStoreError> {
        let meta = tokio::fs::metadata(self.path(&id))
            .await
            .map_err(BlobStoreError::Write)?;
        let file = FileObject::new(id.clone(), meta.len(), now_epoch_secs(), filename, purpose);
        self.records.lock().expect("blob store lock poisoned").insert(id, file.clone());
        Ok(file)
    }

    pub async fn read(&self, id: &str) -> Result<Vec<u8>, BlobStoreError> {
        tokio::fs::read(self.path(id))
            .await
            .map_err(|_| BlobStoreError::NotFound(id.to_string()))
    }

    pub fn get(&self, id: &str) -> Option<FileObject> {
        self.records.lock().expect("blob store lock poisoned").get(id).cloned()
    }

    pub async fn delete(&self, id: &str) -> Result<(), BlobStoreError> {
        let _ = tokio::fs::remove_file(self.path(id)).await;
        self.records.lock().expect("blob store lock poisoned").remove(id);
        Ok(())
    }
}
