//! JSON file-based storage implementation.

use super::{Result, Storage, StorageError};
use async_trait::async_trait;
use klang_types::Document;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Storage backend that persists the configuration to a JSON file.
///
/// Files are written with four-space indentation so they stay readable
/// next to configurations edited by hand.
pub struct JsonFileStorage {
    path: PathBuf,
}

impl JsonFileStorage {
    /// Create a new JSON file storage.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Render the document as pretty JSON with four-space indentation.
    fn render(document: &Document) -> Result<Vec<u8>> {
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut buf = Vec::new();
        let mut serializer = serde_json::Serializer::with_formatter(&mut buf, formatter);
        document.serialize(&mut serializer)?;
        Ok(buf)
    }
}

#[async_trait]
impl Storage for JsonFileStorage {
    async fn load(&self) -> Result<Document> {
        debug!("Loading configuration from {:?}", self.path);

        if !self.path.exists() {
            return Err(StorageError::NotFound(self.path.clone()));
        }

        let contents = fs::read_to_string(&self.path).await?;
        let document: Document = serde_json::from_str(&contents)?;

        info!("Loaded configuration from {:?}", self.path);

        Ok(document)
    }

    async fn save(&self, document: &Document) -> Result<()> {
        debug!("Writing configuration to {:?}", self.path);

        let json = Self::render(document)?;

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            if !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write to temporary file first, then rename (atomic operation)
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, json).await?;
        fs::rename(&temp_path, &self.path).await?;

        info!("Wrote configuration to {:?}", self.path);

        Ok(())
    }
}
