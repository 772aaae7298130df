//! Types for the converter module.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::error::ConverterError;

/// Raster format a JPEG can be converted into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Portable Network Graphics (lossless)
    Png,
    /// WebP (lossy, fixed quality)
    Webp,
    /// Graphics Interchange Format
    Gif,
    /// Tagged Image File Format
    Tiff,
}

impl TargetFormat {
    /// Every supported target, in the order they are offered to users.
    pub const ALL: [TargetFormat; 4] = [Self::Png, Self::Webp, Self::Gif, Self::Tiff];

    /// Wire name of the format, as sent in the `format` form field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
        }
    }

    /// File extension used for converted outputs.
    pub fn extension(&self) -> &'static str {
        self.as_str()
    }

    /// MIME type sent as the response `Content-Type`.
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
            Self::Tiff => "image/tiff",
        }
    }

    /// The matching `image` crate format, used to decode outputs.
    pub fn image_format(&self) -> image::ImageFormat {
        match self {
            Self::Png => image::ImageFormat::Png,
            Self::Webp => image::ImageFormat::WebP,
            Self::Gif => image::ImageFormat::Gif,
            Self::Tiff => image::ImageFormat::Tiff,
        }
    }
}

impl fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TargetFormat {
    type Err = ConverterError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "png" => Ok(Self::Png),
            "webp" => Ok(Self::Webp),
            "gif" => Ok(Self::Gif),
            "tiff" => Ok(Self::Tiff),
            other => Err(ConverterError::UnsupportedFormat {
                format: other.to_string(),
            }),
        }
    }
}

/// A successfully re-encoded image.
#[derive(Debug, Clone)]
pub struct ConvertedImage {
    /// Encoded output bytes.
    pub bytes: Bytes,
    /// Format the bytes are encoded in.
    pub format: TargetFormat,
    /// Pixel width of the decoded source.
    pub width: u32,
    /// Pixel height of the decoded source.
    pub height: u32,
}

impl ConvertedImage {
    /// MIME type of the encoded bytes.
    pub fn content_type(&self) -> &'static str {
        self.format.content_type()
    }
}

/// Fallback basename for uploads without a usable name.
const DEFAULT_BASENAME: &str = "image";

/// Derive `<basename>.<ext>` for a converted upload.
///
/// The basename is the original name with any directory components and the
/// final extension removed, so `holiday/photo.final.jpg` becomes
/// `photo.final.png` for PNG output.
pub fn output_file_name(original: &str, format: TargetFormat) -> String {
    // Browsers on Windows may send backslash-separated paths.
    let last_segment = original.rsplit(['/', '\\']).next().unwrap_or(original);
    let stem = Path::new(last_segment)
        .file_stem()
        .and_then(|s| s.to_str())
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_BASENAME);

    format!("{}.{}", stem, format.extension())
}
