//! Error types for the archive module.

use thiserror::Error;

/// Errors that can occur while assembling a streamed archive.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// The ZIP writer rejected an operation.
    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// Writing archive bytes failed, usually because the receiver is gone.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The archive was already finished or poisoned by an earlier failure.
    #[error("Archive is closed")]
    Closed,

    /// The blocking writer task panicked or was cancelled.
    #[error("Archive task failed: {0}")]
    TaskFailed(String),
}
