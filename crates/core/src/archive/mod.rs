//! Streamed ZIP bundles of converted images.
//!
//! `ZipStream` writes a ZIP archive into a bounded channel so an HTTP
//! response can start sending bytes before the last entry is converted.
//! `convert_into_archive` drives a batch through a `Converter` one item at a
//! time, skipping items that fail to convert.

mod batch;
mod config;
mod error;
mod zip_stream;

pub use batch::{convert_into_archive, BatchItem, BatchSummary, SkippedItem};
pub use config::ArchiveConfig;
pub use error::ArchiveError;
pub use zip_stream::{ArchiveChunk, ZipStream};

/// File name offered for the downloaded bundle.
pub const ARCHIVE_FILE_NAME: &str = "converted-images.zip";

/// MIME type of the downloaded bundle.
pub const ARCHIVE_CONTENT_TYPE: &str = "application/zip";

/// `Content-Disposition` value for the downloaded bundle.
pub fn content_disposition() -> String {
    format!("attachment; filename={}", ARCHIVE_FILE_NAME)
}
