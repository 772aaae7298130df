//! Error types for the converter module.

use thiserror::Error;

use super::types::TargetFormat;

/// Errors that can occur during conversion.
#[derive(Debug, Error)]
pub enum ConverterError {
    /// Requested output format is not one of png, webp, gif or tiff.
    #[error("Unsupported format: {format}")]
    UnsupportedFormat { format: String },

    /// Input bytes could not be decoded as an image.
    #[error("Failed to decode image: {0}")]
    Decode(String),

    /// The decoded image could not be written in the target format.
    #[error("Failed to encode {format}: {reason}")]
    Encode {
        format: TargetFormat,
        reason: String,
    },

    /// The blocking codec task panicked or was cancelled.
    #[error("Conversion task failed: {0}")]
    TaskFailed(String),
}

impl ConverterError {
    /// Creates a new encode error.
    pub fn encode(format: TargetFormat, reason: impl Into<String>) -> Self {
        Self::Encode {
            format,
            reason: reason.into(),
        }
    }

    /// Whether the caller asked for something invalid, as opposed to the
    /// image content being unconvertible.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedFormat { .. } => "unsupported_format",
            Self::Decode(_) => "decode",
            Self::Encode { .. } => "encode",
            Self::TaskFailed(_) => "task_failed",
        }
    }
}
