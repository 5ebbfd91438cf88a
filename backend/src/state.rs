//! Application state management.

use crate::saver::{SaveScheduler, SaveStatus};
use crate::storage::{JsonFileStorage, Storage};
use klang_types::{AdvancedRouting, BasicRouting, Document, RoutingMode, RoutingModeKind};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info};

/// Default debounce window between an edit and the write it triggers.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    /// The live configuration document
    document: Arc<RwLock<Document>>,
    /// Snapshot taken at load time, restored by undo
    original: RwLock<Document>,
    /// Last basic routing payload, reinstalled when switching back to basic
    cached_basic: RwLock<BasicRouting>,
    /// Last advanced routing payload, reinstalled when switching back to advanced
    cached_advanced: RwLock<AdvancedRouting>,
    /// Storage backend
    storage: Arc<dyn Storage>,
    /// Debounced save scheduler
    saver: SaveScheduler,
}

impl AppState {
    /// Create new application state with the given storage backend.
    pub fn new(storage: impl Storage + 'static, debounce: Duration) -> Self {
        let document = Arc::new(RwLock::new(Document::default()));
        let storage: Arc<dyn Storage> = Arc::new(storage);
        let saver = SaveScheduler::spawn(document.clone(), storage.clone(), debounce);

        Self {
            inner: Arc::new(AppStateInner {
                document,
                original: RwLock::new(Document::default()),
                cached_basic: RwLock::new(BasicRouting::default()),
                cached_advanced: RwLock::new(AdvancedRouting::default()),
                storage,
                saver,
            }),
        }
    }

    /// Create new application state with JSON file storage.
    pub fn with_json_storage(path: impl AsRef<std::path::Path>, debounce: Duration) -> Self {
        Self::new(JsonFileStorage::new(path), debounce)
    }

    /// Load the configuration from storage into memory.
    pub async fn load_from_storage(&self) -> anyhow::Result<()> {
        info!("Loading configuration from storage...");
        let document = match self.inner.storage.load().await {
            Ok(document) => document,
            Err(e) => {
                error!("Failed to load configuration from storage: {}", e);
                return Err(e.into());
            }
        };

        self.reset_caches(&document).await;
        {
            let mut original = self.inner.original.write().await;
            *original = document.clone();
        }
        {
            let mut current = self.inner.document.write().await;
            *current = document.clone();
        }

        info!(
            "Loaded configuration \"{}\" ({} outputs, {} named filters)",
            document.description,
            document.outputs.len(),
            document.filters.len()
        );
        Ok(())
    }

    /// Get the current configuration document.
    pub async fn get_document(&self) -> Document {
        self.inner.document.read().await.clone()
    }

    /// Replace the document with a client-supplied one and schedule a save.
    pub async fn replace_document(&self, document: Document) {
        self.remember_routing(&document).await;
        {
            let mut current = self.inner.document.write().await;
            *current = document;
        }
        self.inner.saver.schedule_save().await;
    }

    /// Restore the document to the state it had when it was loaded.
    pub async fn undo(&self) -> Document {
        let snapshot = self.inner.original.read().await.clone();
        self.reset_caches(&snapshot).await;
        {
            let mut document = self.inner.document.write().await;
            *document = snapshot.clone();
        }
        info!("Restored configuration to its loaded state");
        self.inner.saver.schedule_save().await;
        snapshot
    }

    /// Switch the routing mode, reinstalling the payload last seen in the
    /// target mode. Switching to the mode already active changes nothing.
    pub async fn set_routing_mode(&self, kind: RoutingModeKind) -> Document {
        let mut document = self.inner.document.write().await;

        if document.routing_mode() == Some(kind) {
            return document.clone();
        }

        // Remember the payload being switched away from
        match &document.routing {
            Some(RoutingMode::Basic(basic)) => {
                *self.inner.cached_basic.write().await = basic.clone();
            }
            Some(RoutingMode::Advanced(advanced)) => {
                *self.inner.cached_advanced.write().await = advanced.clone();
            }
            None => {}
        }

        document.routing = Some(match kind {
            RoutingModeKind::Basic => {
                RoutingMode::Basic(self.inner.cached_basic.read().await.clone())
            }
            RoutingModeKind::Advanced => {
                RoutingMode::Advanced(self.inner.cached_advanced.read().await.clone())
            }
        });

        info!("Switched routing mode to {:?}", kind);
        let updated = document.clone();
        drop(document);

        self.inner.saver.schedule_save().await;
        updated
    }

    /// Whether the document differs from the loaded snapshot.
    pub async fn has_changes(&self) -> bool {
        let document = self.inner.document.read().await;
        let original = self.inner.original.read().await;
        *document != *original
    }

    /// Current persistence status.
    pub async fn save_status(&self) -> SaveStatus {
        self.inner.saver.status().await
    }

    /// Write any pending save to disk and wait for it.
    pub async fn flush(&self) {
        self.inner.saver.flush().await;
    }

    /// Update the cache for whichever mode the document carries.
    async fn remember_routing(&self, document: &Document) {
        match &document.routing {
            Some(RoutingMode::Basic(basic)) => {
                *self.inner.cached_basic.write().await = basic.clone();
            }
            Some(RoutingMode::Advanced(advanced)) => {
                *self.inner.cached_advanced.write().await = advanced.clone();
            }
            None => {}
        }
    }

    /// Reset both caches to the document's state (fresh load or undo).
    async fn reset_caches(&self, document: &Document) {
        {
            let mut basic = self.inner.cached_basic.write().await;
            *basic = BasicRouting::default();
        }
        {
            let mut advanced = self.inner.cached_advanced.write().await;
            *advanced = AdvancedRouting::default();
        }
        self.remember_routing(document).await;
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::with_json_storage("klang.json", DEFAULT_DEBOUNCE)
    }
}
