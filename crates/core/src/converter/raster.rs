//! Raster converter backed by the `image` and `webp` crates.

use std::borrow::Cow;
use std::io::Cursor;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use image::{DynamicImage, GenericImageView, ImageReader};
use tiff::encoder::compression::{Deflate, DeflateLevel};
use tiff::encoder::{colortype, TiffEncoder};
use tracing::debug;

use super::config::ConverterConfig;
use super::error::ConverterError;
use super::traits::Converter;
use super::types::{ConvertedImage, TargetFormat};
use crate::metrics::{CONVERSIONS_TOTAL, CONVERSION_DURATION};

/// Converter that decodes any format the `image` crate understands and
/// re-encodes it in memory.
#[derive(Debug, Clone)]
pub struct RasterConverter {
    config: ConverterConfig,
}

impl RasterConverter {
    /// Creates a new converter with the given configuration.
    pub fn new(config: ConverterConfig) -> Self {
        Self { config }
    }

    /// Creates a new converter with default configuration.
    pub fn with_defaults() -> Self {
        Self::new(ConverterConfig::default())
    }

    /// Returns the configuration.
    pub fn config(&self) -> &ConverterConfig {
        &self.config
    }
}

#[async_trait]
impl Converter for RasterConverter {
    fn name(&self) -> &str {
        "raster"
    }

    async fn convert(
        &self,
        input: &[u8],
        format: TargetFormat,
    ) -> Result<ConvertedImage, ConverterError> {
        let input = input.to_vec();
        let config = self.config.clone();
        let start = Instant::now();

        let result = tokio::task::spawn_blocking(move || transcode(&input, format, &config))
            .await
            .map_err(|e| ConverterError::TaskFailed(e.to_string()))
            .and_then(|r| r);

        let elapsed = start.elapsed();
        CONVERSION_DURATION
            .with_label_values(&[format.as_str()])
            .observe(elapsed.as_secs_f64());

        match &result {
            Ok(image) => {
                CONVERSIONS_TOTAL
                    .with_label_values(&[format.as_str(), "success"])
                    .inc();
                debug!(
                    format = %format,
                    width = image.width,
                    height = image.height,
                    output_bytes = image.bytes.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Converted image"
                );
            }
            Err(e) => {
                CONVERSIONS_TOTAL
                    .with_label_values(&[format.as_str(), e.kind()])
                    .inc();
            }
        }

        result
    }
}

/// Decodes `input` and encodes it as `format`, synchronously.
pub fn transcode(
    input: &[u8],
    format: TargetFormat,
    config: &ConverterConfig,
) -> Result<ConvertedImage, ConverterError> {
    let image = decode(input, config.limits())?;
    let (width, height) = image.dimensions();
    let bytes = encode(&image, format, config)?;

    Ok(ConvertedImage {
        bytes: Bytes::from(bytes),
        format,
        width,
        height,
    })
}

fn decode(input: &[u8], limits: image::Limits) -> Result<DynamicImage, ConverterError> {
    let mut reader = ImageReader::new(Cursor::new(input))
        .with_guessed_format()
        .map_err(|e| ConverterError::Decode(e.to_string()))?;
    reader.limits(limits);
    reader
        .decode()
        .map_err(|e| ConverterError::Decode(e.to_string()))
}

fn encode(
    image: &DynamicImage,
    format: TargetFormat,
    config: &ConverterConfig,
) -> Result<Vec<u8>, ConverterError> {
    match format {
        TargetFormat::Png => write_with(image, format),
        // The GIF encoder only takes 8-bit RGBA frames.
        TargetFormat::Gif => write_with(&DynamicImage::ImageRgba8(image.to_rgba8()), format),
        TargetFormat::Tiff => encode_tiff(image),
        TargetFormat::Webp => encode_webp(image, config.webp_quality),
    }
}

fn write_with(image: &DynamicImage, format: TargetFormat) -> Result<Vec<u8>, ConverterError> {
    let mut buf = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buf), format.image_format())
        .map_err(|e| ConverterError::encode(format, e.to_string()))?;
    Ok(buf)
}

/// Deflate at the best level. The `image` TIFF encoder only writes
/// uncompressed strips.
fn encode_tiff(image: &DynamicImage) -> Result<Vec<u8>, ConverterError> {
    let (width, height) = image.dimensions();
    let narrowed = eight_bit(image);
    let mut buf = Cursor::new(Vec::new());
    {
        let mut encoder = TiffEncoder::new(&mut buf).map_err(tiff_error)?;
        let compression = || Deflate::with_level(DeflateLevel::Best);
        let written = match narrowed.as_ref() {
            DynamicImage::ImageRgba8(rgba) => encoder
                .write_image_with_compression::<colortype::RGBA8, _>(
                    width,
                    height,
                    compression(),
                    rgba.as_raw(),
                ),
            DynamicImage::ImageRgb8(rgb) => encoder
                .write_image_with_compression::<colortype::RGB8, _>(
                    width,
                    height,
                    compression(),
                    rgb.as_raw(),
                ),
            other => {
                let rgb = other.to_rgb8();
                encoder.write_image_with_compression::<colortype::RGB8, _>(
                    width,
                    height,
                    compression(),
                    rgb.as_raw(),
                )
            }
        };
        written.map_err(tiff_error)?;
    }
    Ok(buf.into_inner())
}

fn tiff_error(e: tiff::TiffError) -> ConverterError {
    ConverterError::encode(TargetFormat::Tiff, e.to_string())
}

fn encode_webp(image: &DynamicImage, quality: f32) -> Result<Vec<u8>, ConverterError> {
    let (width, height) = image.dimensions();
    let narrowed = eight_bit(image);
    let encoded = match narrowed.as_ref() {
        DynamicImage::ImageRgba8(rgba) => {
            webp::Encoder::from_rgba(rgba.as_raw(), width, height).encode_simple(false, quality)
        }
        DynamicImage::ImageRgb8(rgb) => {
            webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
        }
        other => {
            let rgb = other.to_rgb8();
            webp::Encoder::from_rgb(rgb.as_raw(), width, height).encode_simple(false, quality)
        }
    }
    .map_err(|e| ConverterError::encode(TargetFormat::Webp, format!("{:?}", e)))?;

    Ok(encoded.to_vec())
}

/// Narrows the image to 8-bit RGB or RGBA, borrowing when it already is.
fn eight_bit(image: &DynamicImage) -> Cow<'_, DynamicImage> {
    match image {
        DynamicImage::ImageRgb8(_) | DynamicImage::ImageRgba8(_) => Cow::Borrowed(image),
        other if other.color().has_alpha() => Cow::Owned(DynamicImage::ImageRgba8(other.to_rgba8())),
        other => Cow::Owned(DynamicImage::ImageRgb8(other.to_rgb8())),
    }
}

/// Reads back the pixel dimensions of encoded bytes in a known format.
pub fn probe_dimensions(
    bytes: &[u8],
    format: TargetFormat,
) -> Result<(u32, u32), ConverterError> {
    let image = image::load_from_memory_with_format(bytes, format.image_format())
        .map_err(|e| ConverterError::Decode(e.to_string()))?;
    Ok(image.dimensions())
}
