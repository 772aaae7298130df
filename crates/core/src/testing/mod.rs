//! Testing utilities and mock implementations.
//!
//! This module provides a controllable `Converter` and small image fixtures,
//! so endpoint and batch behavior can be tested without real uploads.
//!
//! # Example
//!
//! ```rust,ignore
//! use pixconv_core::testing::{fixtures, MockConverter};
//!
//! let converter = MockConverter::new();
//! converter.fail_inputs_containing(&fixtures::corrupt_bytes()).await;
//!
//! let photo = fixtures::jpeg_bytes(100, 100);
//! // Use in AppState...
//! ```

mod mock_converter;

pub use mock_converter::{MockConverter, RecordedConversion};

/// Test fixtures and helper functions.
pub mod fixtures {
    use std::io::Cursor;

    use image::{DynamicImage, ImageFormat, Rgb, RgbImage};

    /// Encode a `width` x `height` gradient as a baseline JPEG.
    pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbImage::from_fn(width, height, |x, y| {
            Rgb([
                (x * 255 / width.max(1)) as u8,
                (y * 255 / height.max(1)) as u8,
                ((x + y) % 256) as u8,
            ])
        });

        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut Cursor::new(&mut buf), ImageFormat::Jpeg)
            .expect("Failed to encode JPEG fixture");
        buf
    }

    /// Bytes that start like a JPEG but cannot be decoded.
    pub fn corrupt_bytes() -> Vec<u8> {
        let mut bytes = vec![0xFF, 0xD8, 0xFF, 0xE0];
        bytes.extend_from_slice(b"this is not really a jpeg");
        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;

    #[test]
    fn test_jpeg_fixture_decodes() {
        let bytes = jpeg_bytes(100, 100);
        let image = image::load_from_memory(&bytes).unwrap();
        assert_eq!((image.width(), image.height()), (100, 100));
    }

    #[test]
    fn test_corrupt_fixture_fails() {
        assert!(image::load_from_memory(&corrupt_bytes()).is_err());
    }
}
