//! File-queue synchronizer
//!
//! Owns the local copy of the queue. Every mutation runs under one async
//! mutex that is held across mutate, push and open, so a user edit and an
//! automatic advance can never interleave their pushes. The local queue
//! changes synchronously; the server copy follows with the push
//! (last writer wins).
//!
//! Nothing is pushed until the server queue has been adopted by
//! [`QueueSynchronizer::bootstrap`]; pushing a default empty queue would wipe
//! the persisted one.
//!
//! A failed push or open leaves a pending-sync marker.
//! [`QueueSynchronizer::reconcile`] retries it.

use std::sync::Arc;

use mkremote_core::{
    ApiError, AppEvent, EventBus, FileListing, FileQueue, QueueEvent, ServerFile,
};
use serde::Serialize;
use tokio::sync::Mutex;

use crate::client::MachineClient;

/// What a failed push still owes the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PendingSync {
    /// Push the local queue
    Push,
    /// Push the local queue, then open its head
    PushThenOpen,
    /// The server has the queue but its head was never opened
    Open,
}

/// Result of advancing past a finished file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Advance {
    /// File removed from the head
    pub finished: Option<String>,
    /// File opened afterwards, `None` when the queue ran empty
    pub opened: Option<String>,
}

/// Copy of the synchronizer's state
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueView {
    /// Local queue
    pub local: FileQueue,
    /// Last queue the server acknowledged
    pub server: FileQueue,
    /// Files stored on the bridge, from the last listing
    pub files: Vec<ServerFile>,
    /// Outstanding sync work
    pub pending: Option<PendingSync>,
    /// The server queue has been adopted
    pub bootstrapped: bool,
}

impl QueueView {
    /// Local and server copies agree and nothing is pending
    pub fn in_sync(&self) -> bool {
        self.bootstrapped && self.pending.is_none() && self.local == self.server
    }
}

#[derive(Debug, Default)]
struct QueueInner {
    local: FileQueue,
    server: FileQueue,
    files: Vec<ServerFile>,
    pending: Option<PendingSync>,
    bootstrapped: bool,
}

impl QueueInner {
    fn ensure_bootstrapped(&self) -> Result<(), ApiError> {
        if self.bootstrapped {
            Ok(())
        } else {
            Err(ApiError::QueueNotLoaded)
        }
    }
}

/// Keeps the local queue and the bridge's persisted queue consistent
#[derive(Debug)]
pub struct QueueSynchronizer {
    client: Arc<MachineClient>,
    bus: Arc<EventBus>,
    inner: Mutex<QueueInner>,
}

impl QueueSynchronizer {
    /// Create a synchronizer with an empty queue
    pub fn new(client: Arc<MachineClient>, bus: Arc<EventBus>) -> Self {
        Self {
            client,
            bus,
            inner: Mutex::new(QueueInner::default()),
        }
    }

    /// Fetch the persisted queue and listing, adopt them, and open the head
    ///
    /// Once the listing is adopted the queue counts as loaded even if the
    /// open fails; the open is then owed to [`Self::reconcile`].
    pub async fn bootstrap(&self) -> Result<FileListing, ApiError> {
        let mut inner = self.inner.lock().await;
        let listing = self.client.fetch_files().await?;

        inner.local = listing.queue.clone();
        inner.server = listing.queue.clone();
        inner.files = listing.files.clone();
        inner.bootstrapped = true;
        inner.pending = Some(PendingSync::Open);
        tracing::info!(
            "Queue bootstrapped: {} queued, {} files on bridge",
            inner.local.len(),
            inner.files.len()
        );

        self.open_head(&inner).await?;
        inner.pending = None;
        Ok(listing)
    }

    /// Whether [`Self::bootstrap`] has adopted the server queue
    pub async fn is_bootstrapped(&self) -> bool {
        self.inner.lock().await.bootstrapped
    }

    /// Append a file and push
    pub async fn enqueue(&self, file: impl Into<String>) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().await;
        inner.ensure_bootstrapped()?;
        inner.local.push(file)?;
        self.push(&mut inner, false).await
    }

    /// Remove the entry at `index` and push
    pub async fn dequeue(&self, index: usize) -> Result<String, ApiError> {
        let mut inner = self.inner.lock().await;
        inner.ensure_bootstrapped()?;
        let removed = inner.local.remove(index)?;
        self.push(&mut inner, false).await?;
        Ok(removed)
    }

    /// Replace the order and push
    pub async fn reorder(&self, new_order: Vec<String>) -> Result<(), ApiError> {
        let mut inner = self.inner.lock().await;
        inner.ensure_bootstrapped()?;
        inner.local.reorder(new_order)?;
        self.push(&mut inner, false).await
    }

    /// Drop the finished head, push, then open the new head
    ///
    /// If the push fails the local queue stays advanced, the open is skipped,
    /// and both are owed to [`Self::reconcile`]. Does nothing before the
    /// queue is loaded.
    pub async fn advance_on_completion(&self) -> Result<Advance, ApiError> {
        let mut inner = self.inner.lock().await;
        if !inner.bootstrapped {
            tracing::warn!("Program completed before the queue was loaded, not advancing");
            return Ok(Advance {
                finished: None,
                opened: None,
            });
        }
        let finished = inner.local.pop_head();
        tracing::info!(
            "Program completed, advancing queue past {:?}",
            finished.as_deref().unwrap_or("<none>")
        );

        self.push(&mut inner, true).await?;
        Ok(Advance {
            finished,
            opened: inner.local.head().map(str::to_string),
        })
    }

    /// Re-open the head if the controller lost its loaded file
    ///
    /// Returns whether an open was issued. Does nothing while a sync is
    /// pending; [`Self::reconcile`] owns that case.
    pub async fn heal_if_cleared(&self, current_file: Option<&str>) -> Result<bool, ApiError> {
        let inner = self.inner.lock().await;
        if current_file.is_some() || inner.local.is_empty() || inner.pending.is_some() {
            return Ok(false);
        }
        tracing::info!(
            "Controller has no file loaded, re-opening {:?}",
            inner.local.head()
        );
        self.open_head(&inner).await?;
        Ok(true)
    }

    /// Retry a failed push or open
    ///
    /// Returns whether there was anything to retry.
    pub async fn reconcile(&self) -> Result<bool, ApiError> {
        let mut inner = self.inner.lock().await;
        let Some(pending) = inner.pending else {
            return Ok(false);
        };
        tracing::debug!("Retrying queue sync ({:?})", pending);
        match pending {
            PendingSync::Open => {
                self.open_head(&inner).await?;
                inner.pending = None;
            }
            PendingSync::Push | PendingSync::PushThenOpen => {
                self.push(&mut inner, false).await?;
            }
        }
        Ok(true)
    }

    /// Refresh the file listing without touching the local queue
    pub async fn refresh_listing(&self) -> Result<Vec<ServerFile>, ApiError> {
        let listing = self.client.fetch_files().await?;
        let mut inner = self.inner.lock().await;
        inner.files = listing.files;
        Ok(inner.files.clone())
    }

    /// Copy of the current state
    pub async fn view(&self) -> QueueView {
        let inner = self.inner.lock().await;
        QueueView {
            local: inner.local.clone(),
            server: inner.server.clone(),
            files: inner.files.clone(),
            pending: inner.pending,
            bootstrapped: inner.bootstrapped,
        }
    }

    async fn push(&self, inner: &mut QueueInner, open_after: bool) -> Result<(), ApiError> {
        let open_after = open_after
            || matches!(
                inner.pending,
                Some(PendingSync::PushThenOpen | PendingSync::Open)
            );
        let files = inner.local.as_slice().to_vec();

        match self.client.update_file_queue(&inner.local).await {
            Ok(_) => {
                inner.server = inner.local.clone();
                inner.pending = open_after.then_some(PendingSync::Open);
                tracing::info!("Queue pushed ({} files)", files.len());
                self.bus
                    .publish(AppEvent::Queue(QueueEvent::Synced { files }))
                    .ok();
                if open_after {
                    self.open_head(inner).await?;
                    inner.pending = None;
                }
                Ok(())
            }
            Err(err) => {
                inner.pending = Some(if open_after {
                    PendingSync::PushThenOpen
                } else {
                    PendingSync::Push
                });
                tracing::warn!("Queue push failed, will retry: {}", err);
                self.bus
                    .publish(AppEvent::Queue(QueueEvent::SyncDeferred {
                        files,
                        reason: err.to_string(),
                    }))
                    .ok();
                Err(err)
            }
        }
    }

    async fn open_head(&self, inner: &QueueInner) -> Result<(), ApiError> {
        let head = inner.local.head();
        self.client.open_file(head).await?;
        tracing::info!("Opened {}", head.unwrap_or("<none>"));
        self.bus
            .publish(AppEvent::Queue(QueueEvent::FileOpened {
                file: head.map(str::to_string),
            }))
            .ok();
        Ok(())
    }
}
