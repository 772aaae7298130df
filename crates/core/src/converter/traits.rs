//! Trait definitions for the converter module.

use async_trait::async_trait;

use super::error::ConverterError;
use super::types::{ConvertedImage, TargetFormat};

/// A converter that re-encodes raster images.
#[async_trait]
pub trait Converter: Send + Sync {
    /// Returns the name of this converter implementation.
    fn name(&self) -> &str;

    /// Decodes `input` and re-encodes it as `format`.
    async fn convert(
        &self,
        input: &[u8],
        format: TargetFormat,
    ) -> Result<ConvertedImage, ConverterError>;

    /// Like [`Converter::convert`], but takes the wire name of the format.
    ///
    /// Unknown names fail with [`ConverterError::UnsupportedFormat`] before
    /// the input is looked at.
    async fn convert_named(
        &self,
        input: &[u8],
        format: &str,
    ) -> Result<ConvertedImage, ConverterError> {
        let format: TargetFormat = format.parse()?;
        self.convert(input, format).await
    }

    /// Returns the supported output formats.
    fn supported_output_formats(&self) -> &[TargetFormat] {
        &TargetFormat::ALL
    }
}
