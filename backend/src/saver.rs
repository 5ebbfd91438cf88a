//! Debounced persistence of the configuration document.
//!
//! Mutations schedule a save instead of writing immediately. Schedules that
//! land within the debounce window coalesce into a single write once the
//! burst goes quiet; a flush forces any pending write to happen right away.

use crate::storage::Storage;
use chrono::{DateTime, Utc};
use klang_types::Document;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, oneshot, RwLock};
use tokio::time::sleep;
use tracing::{debug, error};

/// Persistence state reported by the save-status endpoint.
#[derive(Debug, Clone, Default)]
pub struct SaveStatus {
    /// A debounced save is armed and has not fired yet.
    pub pending: bool,
    /// When the document was last written successfully.
    pub last_saved_at: Option<DateTime<Utc>>,
    /// Why the most recent write failed. Cleared by the next success.
    pub last_error: Option<String>,
}

enum SaveRequest {
    Debounced,
    Flush(oneshot::Sender<()>),
}

/// Coalesces save requests and writes the document in the background.
pub struct SaveScheduler {
    tx: mpsc::UnboundedSender<SaveRequest>,
    status: Arc<RwLock<SaveStatus>>,
}

impl SaveScheduler {
    /// Start the background save task.
    pub fn spawn(
        document: Arc<RwLock<Document>>,
        storage: Arc<dyn Storage>,
        debounce: Duration,
    ) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let status = Arc::new(RwLock::new(SaveStatus::default()));

        let task_status = status.clone();
        tokio::spawn(async move {
            Self::run(rx, document, storage, task_status, debounce).await;
        });

        Self { tx, status }
    }

    /// Arm (or re-arm) the debounce timer for a pending save.
    pub async fn schedule_save(&self) {
        {
            let mut status = self.status.write().await;
            status.pending = true;
        }
        if self.tx.send(SaveRequest::Debounced).is_err() {
            error!("Save task is gone, cannot schedule save");
        }
    }

    /// Write any pending save to disk and wait for it to complete.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.tx.send(SaveRequest::Flush(ack_tx)).is_err() {
            return;
        }
        let _ = ack_rx.await;
    }

    /// Snapshot of the current persistence state.
    pub async fn status(&self) -> SaveStatus {
        self.status.read().await.clone()
    }

    /// Run the save loop.
    async fn run(
        mut rx: mpsc::UnboundedReceiver<SaveRequest>,
        document: Arc<RwLock<Document>>,
        storage: Arc<dyn Storage>,
        status: Arc<RwLock<SaveStatus>>,
        debounce: Duration,
    ) {
        while let Some(request) = rx.recv().await {
            match request {
                SaveRequest::Flush(ack) => {
                    // Nothing armed, so there is nothing to write
                    let _ = ack.send(());
                }
                SaveRequest::Debounced => {
                    let mut flush_ack = None;
                    let mut closed = false;

                    loop {
                        tokio::select! {
                            _ = sleep(debounce) => break,
                            next = rx.recv() => match next {
                                Some(SaveRequest::Debounced) => {
                                    // Burst continues, re-arm the timer
                                }
                                Some(SaveRequest::Flush(ack)) => {
                                    flush_ack = Some(ack);
                                    break;
                                }
                                None => {
                                    closed = true;
                                    break;
                                }
                            },
                        }
                    }

                    Self::save_now(&document, &storage, &status).await;

                    if let Some(ack) = flush_ack {
                        let _ = ack.send(());
                    }
                    if closed {
                        break;
                    }
                }
            }
        }

        debug!("Save task shutting down");
    }

    /// Write the current document and record the outcome.
    async fn save_now(
        document: &Arc<RwLock<Document>>,
        storage: &Arc<dyn Storage>,
        status: &Arc<RwLock<SaveStatus>>,
    ) {
        let snapshot = document.read().await.clone();

        match storage.save(&snapshot).await {
            Ok(()) => {
                let mut status = status.write().await;
                status.pending = false;
                status.last_saved_at = Some(Utc::now());
                status.last_error = None;
                debug!("Configuration saved");
            }
            Err(e) => {
                error!("Failed to save configuration: {}", e);
                let mut status = status.write().await;
                status.pending = false;
                status.last_error = Some(e.to_string());
            }
        }
    }
}
