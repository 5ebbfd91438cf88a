//! Storage layer for persisting the configuration document.

mod json_file;

pub use json_file::JsonFileStorage;

use async_trait::async_trait;
use klang_types::Document;
use std::path::PathBuf;

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Configuration file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, StorageError>;

/// Trait for configuration storage backends.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Load the configuration document from storage.
    async fn load(&self) -> Result<Document>;

    /// Persist the configuration document.
    async fn save(&self, document: &Document) -> Result<()>;
}
