//! Sequential convert-and-append loop behind the batch endpoint.

use bytes::Bytes;
use serde::Serialize;
use tracing::{info, warn};

use super::error::ArchiveError;
use super::zip_stream::ZipStream;
use crate::converter::{output_file_name, Converter, TargetFormat};
use crate::metrics::{ARCHIVE_ENTRIES_TOTAL, ARCHIVES_TOTAL};

/// One uploaded file waiting to be converted into the archive.
#[derive(Debug, Clone)]
pub struct BatchItem {
    /// Name the file was uploaded under.
    pub file_name: String,
    /// Raw uploaded bytes.
    pub bytes: Bytes,
}

impl BatchItem {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes: bytes.into(),
        }
    }
}

/// An item left out of the archive.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedItem {
    pub file_name: String,
    pub reason: String,
}

/// Outcome of a finished batch.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    /// Entry names written to the archive, in order.
    pub entries: Vec<String>,
    /// Items whose conversion failed.
    pub skipped: Vec<SkippedItem>,
}

/// Converts `items` one at a time and appends every success to `archive`.
///
/// A failed conversion is logged and skipped; it never stops the batch.
/// Only archive failures end the loop early, and those have already been
/// pushed into the archive's byte stream by the time this returns.
pub async fn convert_into_archive(
    converter: &dyn Converter,
    items: Vec<BatchItem>,
    format: TargetFormat,
    mut archive: ZipStream,
) -> Result<BatchSummary, ArchiveError> {
    let mut summary = BatchSummary::default();

    for item in items {
        let target_name = output_file_name(&item.file_name, format);

        let converted = match converter.convert(&item.bytes, format).await {
            Ok(converted) => converted,
            Err(e) => {
                warn!(file = %item.file_name, error = %e, "Failed to convert, skipping");
                ARCHIVE_ENTRIES_TOTAL.with_label_values(&["skipped"]).inc();
                summary.skipped.push(SkippedItem {
                    file_name: item.file_name,
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match archive.append(&target_name, converted.bytes).await {
            Ok(entry) => {
                ARCHIVE_ENTRIES_TOTAL.with_label_values(&["appended"]).inc();
                summary.entries.push(entry);
            }
            Err(e) => {
                ARCHIVES_TOTAL.with_label_values(&["aborted"]).inc();
                return Err(e);
            }
        }
    }

    match archive.finish().await {
        Ok(_) => {
            ARCHIVES_TOTAL.with_label_values(&["finished"]).inc();
            info!(
                converted = summary.entries.len(),
                skipped = summary.skipped.len(),
                format = %format,
                "Archive finished"
            );
            Ok(summary)
        }
        Err(e) => {
            ARCHIVES_TOTAL.with_label_values(&["aborted"]).inc();
            Err(e)
        }
    }
}
