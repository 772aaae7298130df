//! Converter module for re-encoding raster images.
//!
//! This module provides the `Converter` trait and the `RasterConverter`
//! implementation, which decodes uploads with the `image` crate and writes
//! them back out as PNG, WebP, GIF or TIFF.
//!
//! # Encode policy
//!
//! - PNG and GIF: default lossless encoder settings
//! - WebP: lossy at a fixed quality (`ConverterConfig::webp_quality`, 80 by default)
//! - TIFF: the `image` crate's TIFF encoder, which has no quality setting
//!
//! Sources are never resized or color-converted beyond narrowing to 8-bit
//! RGB(A) where an encoder requires it.
//!
//! # Example
//!
//! ```ignore
//! use pixconv_core::converter::{Converter, RasterConverter, TargetFormat};
//!
//! let converter = RasterConverter::with_defaults();
//! let png = converter.convert(&jpeg_bytes, TargetFormat::Png).await?;
//! assert_eq!(png.content_type(), "image/png");
//!
//! // Wire names are validated before any decoding happens.
//! let err = converter.convert_named(&jpeg_bytes, "bmp").await.unwrap_err();
//! ```

mod config;
mod error;
mod raster;
mod traits;
mod types;

pub use config::ConverterConfig;
pub use error::ConverterError;
pub use raster::{probe_dimensions, transcode, RasterConverter};
pub use traits::Converter;
pub use types::{output_file_name, ConvertedImage, TargetFormat};
