//! Configuration for the converter module.

use serde::{Deserialize, Serialize};

/// Configuration for the raster converter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Quality for lossy WebP output (0-100).
    #[serde(default = "default_webp_quality")]
    pub webp_quality: f32,

    /// Largest accepted source width in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_image_width: u32,

    /// Largest accepted source height in pixels.
    #[serde(default = "default_max_dimension")]
    pub max_image_height: u32,

    /// Upper bound on decoder allocations in bytes.
    #[serde(default = "default_max_alloc")]
    pub max_alloc_bytes: u64,
}

fn default_webp_quality() -> f32 {
    80.0
}

fn default_max_dimension() -> u32 {
    16_384
}

fn default_max_alloc() -> u64 {
    512 * 1024 * 1024 // 512 MiB
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            webp_quality: default_webp_quality(),
            max_image_width: default_max_dimension(),
            max_image_height: default_max_dimension(),
            max_alloc_bytes: default_max_alloc(),
        }
    }
}

impl ConverterConfig {
    /// Sets the WebP quality.
    pub fn with_webp_quality(mut self, quality: f32) -> Self {
        self.webp_quality = quality;
        self
    }

    /// Sets the maximum accepted source dimensions.
    pub fn with_max_dimensions(mut self, width: u32, height: u32) -> Self {
        self.max_image_width = width;
        self.max_image_height = height;
        self
    }

    /// Decoder limits derived from this config.
    pub fn limits(&self) -> image::Limits {
        let mut limits = image::Limits::default();
        limits.max_image_width = Some(self.max_image_width);
        limits.max_image_height = Some(self.max_image_height);
        limits.max_alloc = Some(self.max_alloc_bytes);
        limits
    }
}
