//! Filesystem persistence.
//!
//! All records live under one data directory as JSONL files, one file
//! per collection. The files are the source of truth; the in-memory
//! store is rebuilt from them at startup.

use std::path::PathBuf;
use thiserror::Error;

mod jsonl;
mod store;

pub use jsonl::{Collection, JsonlReader, JsonlWriter};
pub use store::{SprintUpdate, Store, StoreError};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn collection_path(&self, collection: Collection) -> PathBuf {
        self.data_dir.join(collection.filename())
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
