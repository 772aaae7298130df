//! Client-side coordination of uploads, conversions and downloads.
//!
//! `ClientOrchestrator` owns the tracked files and decides what a view
//! should show. It never renders anything itself: every change is
//! published as a `ClientEvent` and the current `ViewState` can be read
//! at any time, so a browser bridge, a TUI or the upload CLI can all sit
//! on top of it.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use futures::future::join_all;
use serde::Serialize;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, info, warn};

use pixconv_core::{output_file_name, TargetFormat, ARCHIVE_FILE_NAME};

use crate::error::{ClientError, TransportError};
use crate::tracker::{ClientFile, ConvertedFile, FileKey, FileStatus, FileTracker, TrackedFile};
use crate::transport::ConversionTransport;

/// Buffer size for the event channel
const EVENT_BUFFER_SIZE: usize = 256;

/// What a view should show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ViewState {
    /// At least one file is tracked.
    pub controls_visible: bool,
    /// Files are tracked and no batch is running.
    pub convert_enabled: bool,
    /// At least one file converted successfully.
    pub footer_visible: bool,
    /// At least two files converted successfully.
    pub download_all_visible: bool,
}

impl ViewState {
    fn derive(tracker: &FileTracker, converting: bool) -> Self {
        let has_files = !tracker.is_empty();
        let successes = tracker.count_with_status(FileStatus::Success);
        Self {
            controls_visible: has_files,
            convert_enabled: has_files && !converting,
            footer_visible: successes >= 1,
            download_all_visible: successes >= 2,
        }
    }
}

/// Changes published by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientEvent {
    FileAdded { key: FileKey },
    StatusChanged { key: FileKey, status: FileStatus },
    Cleared,
    ViewChanged(ViewState),
}

/// The archive returned by `download_all`.
#[derive(Debug, Clone)]
pub struct ZipDownload {
    /// Always `converted-images.zip`.
    pub file_name: String,
    pub bytes: Bytes,
}

/// Outcome counts of one `convert_all` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ConvertSummary {
    pub succeeded: usize,
    pub failed: usize,
    /// Results that arrived after `clear_all` and were dropped.
    pub orphaned: usize,
}

enum Applied {
    Success,
    Failure,
    Orphaned,
}

/// Resets the in-progress flag however `convert_all` exits.
struct BatchGuard<'a>(&'a AtomicBool);

impl Drop for BatchGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct ClientOrchestrator {
    transport: Arc<dyn ConversionTransport>,
    tracker: RwLock<FileTracker>,
    /// Bumped by `clear_all`; results tagged with an older value are orphaned.
    generation: AtomicU64,
    converting: AtomicBool,
    events: broadcast::Sender<ClientEvent>,
}

impl ClientOrchestrator {
    pub fn new(transport: Arc<dyn ConversionTransport>) -> Self {
        let (events, _) = broadcast::channel(EVENT_BUFFER_SIZE);
        Self {
            transport,
            tracker: RwLock::new(FileTracker::new()),
            generation: AtomicU64::new(0),
            converting: AtomicBool::new(false),
            events,
        }
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }

    fn emit(&self, event: ClientEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    async fn emit_view(&self) {
        let view = self.view_state().await;
        self.emit(ClientEvent::ViewChanged(view));
    }

    pub async fn view_state(&self) -> ViewState {
        let tracker = self.tracker.read().await;
        ViewState::derive(&tracker, self.is_converting())
    }

    pub fn is_converting(&self) -> bool {
        self.converting.load(Ordering::Acquire)
    }

    /// Snapshot of the tracked files, in the order they were added.
    pub async fn files(&self) -> Vec<TrackedFile> {
        self.tracker.read().await.iter().cloned().collect()
    }

    pub async fn file(&self, key: &FileKey) -> Option<TrackedFile> {
        self.tracker.read().await.get(key).cloned()
    }

    /// Starts tracking every JPEG in `files` that is not tracked yet.
    ///
    /// Other MIME types are skipped. Returns the keys that were added.
    pub async fn add_files(&self, files: impl IntoIterator<Item = ClientFile>) -> Vec<FileKey> {
        let mut added = Vec::new();
        {
            let mut tracker = self.tracker.write().await;
            for file in files {
                if !file.is_jpeg() {
                    debug!(file = %file.name, mime = %file.mime_type, "Skipping non-JPEG file");
                    continue;
                }
                match tracker.insert(file) {
                    Some(key) => added.push(key),
                    None => debug!("File already tracked"),
                }
            }
        }

        for key in &added {
            self.emit(ClientEvent::FileAdded { key: key.clone() });
        }
        self.emit_view().await;
        added
    }

    /// Converts every pending file to `format`, one request per file, all
    /// in flight at once. Waits until every request has settled.
    ///
    /// Files stranded in `Converting` by a cancelled earlier call are sent
    /// again.
    pub async fn convert_all(&self, format: TargetFormat) -> Result<ConvertSummary, ClientError> {
        if self.converting.swap(true, Ordering::AcqRel) {
            return Err(ClientError::BatchInProgress);
        }
        let guard = BatchGuard(&self.converting);

        let (generation, pending) = {
            let mut tracker = self.tracker.write().await;
            // Read under the lock so a `clear_all` that lands first is seen
            let generation = self.generation.load(Ordering::Acquire);
            // Only one batch runs at a time, so a `Converting` entry here was
            // left behind by a batch whose future was dropped
            let keys: Vec<FileKey> = tracker
                .iter()
                .filter(|f| matches!(f.status, FileStatus::Pending | FileStatus::Converting))
                .map(|f| f.key())
                .collect();
            let pending: Vec<(FileKey, ClientFile)> = keys
                .into_iter()
                .filter_map(|key| {
                    let entry = tracker.get_mut(&key)?;
                    entry.status = FileStatus::Converting;
                    Some((key, entry.file.clone()))
                })
                .collect();
            (generation, pending)
        };

        info!(files = pending.len(), format = %format, "Converting batch");
        for (key, _) in &pending {
            self.emit(ClientEvent::StatusChanged {
                key: key.clone(),
                status: FileStatus::Converting,
            });
        }
        self.emit_view().await;

        let outcomes = join_all(pending.into_iter().map(|(key, file)| async move {
            let result = self.transport.convert_single(&file, format).await;
            self.apply_result(generation, key, &file, format, result).await
        }))
        .await;

        let mut summary = ConvertSummary::default();
        for outcome in outcomes {
            match outcome {
                Applied::Success => summary.succeeded += 1,
                Applied::Failure => summary.failed += 1,
                Applied::Orphaned => summary.orphaned += 1,
            }
        }

        drop(guard);
        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            orphaned = summary.orphaned,
            "Batch settled"
        );
        self.emit_view().await;
        Ok(summary)
    }

    async fn apply_result(
        &self,
        generation: u64,
        key: FileKey,
        file: &ClientFile,
        format: TargetFormat,
        result: Result<Bytes, TransportError>,
    ) -> Applied {
        let mut tracker = self.tracker.write().await;
        // Checked under the lock so `clear_all` cannot slip in between
        if self.generation.load(Ordering::Acquire) != generation {
            debug!(file = %file.name, "Dropping result for cleared file");
            return Applied::Orphaned;
        }
        let Some(entry) = tracker.get_mut(&key) else {
            return Applied::Orphaned;
        };

        let applied = match result {
            Ok(bytes) => {
                entry.status = FileStatus::Success;
                entry.converted = Some(ConvertedFile {
                    file_name: output_file_name(&file.name, format),
                    bytes,
                });
                entry.error = None;
                Applied::Success
            }
            Err(e) => {
                warn!(file = %file.name, error = %e, "Conversion failed");
                entry.status = FileStatus::Error;
                entry.converted = None;
                entry.error = Some(e.to_string());
                Applied::Failure
            }
        };
        let status = entry.status;
        drop(tracker);

        self.emit(ClientEvent::StatusChanged { key, status });
        applied
    }

    /// Re-uploads the originals of every successfully converted file and
    /// returns the server's ZIP of them.
    pub async fn download_all(&self, format: TargetFormat) -> Result<ZipDownload, ClientError> {
        let originals: Vec<ClientFile> = self
            .tracker
            .read()
            .await
            .iter()
            .filter(|f| f.status == FileStatus::Success)
            .map(|f| f.file.clone())
            .collect();

        if originals.is_empty() {
            return Err(ClientError::NothingToDownload);
        }

        info!(files = originals.len(), format = %format, "Requesting archive");
        let bytes = self.transport.convert_and_zip(&originals, format).await?;

        Ok(ZipDownload {
            file_name: ARCHIVE_FILE_NAME.to_string(),
            bytes,
        })
    }

    /// Forgets every tracked file. Requests already in flight keep running,
    /// but their results are dropped when they arrive.
    pub async fn clear_all(&self) {
        {
            let mut tracker = self.tracker.write().await;
            tracker.clear();
            self.generation.fetch_add(1, Ordering::AcqRel);
        }
        self.emit(ClientEvent::Cleared);
        self.emit_view().await;
    }
}
