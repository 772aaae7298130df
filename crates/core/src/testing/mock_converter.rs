//! Mock converter for testing.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

use crate::converter::{ConvertedImage, Converter, ConverterError, TargetFormat};

/// A recorded conversion for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedConversion {
    /// Bytes that were submitted.
    pub input: Bytes,
    /// Requested output format.
    pub format: TargetFormat,
    /// Whether the conversion succeeded.
    pub success: bool,
}

/// Mock implementation of the Converter trait.
///
/// Provides controllable behavior for testing:
/// - Track conversions for assertions
/// - Simulate failures, either once or for inputs carrying a marker
/// - Simulate slow conversions and observe how many overlap
///
/// Successful outputs are `"<format>:"` followed by the input bytes.
///
/// # Example
///
/// ```rust,ignore
/// use pixconv_core::testing::MockConverter;
///
/// let converter = MockConverter::new();
/// converter.fail_inputs_containing(b"corrupt").await;
///
/// let result = converter.convert(b"corrupt data", TargetFormat::Png).await;
/// assert!(result.is_err());
/// assert_eq!(converter.conversion_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockConverter {
    /// Recorded conversions.
    conversions: Arc<RwLock<Vec<RecordedConversion>>>,
    /// If set, the next conversion will fail with this error.
    next_error: Arc<RwLock<Option<ConverterError>>>,
    /// Inputs containing any of these byte strings fail to decode.
    failing_markers: Arc<RwLock<Vec<Vec<u8>>>>,
    /// Simulated conversion duration in milliseconds.
    conversion_duration_ms: Arc<RwLock<u64>>,
    /// Dimensions reported for every successful conversion.
    dimensions: (u32, u32),
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConverter {
    /// Create a new mock converter.
    pub fn new() -> Self {
        Self {
            conversions: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            failing_markers: Arc::new(RwLock::new(Vec::new())),
            conversion_duration_ms: Arc::new(RwLock::new(0)),
            dimensions: (1, 1),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Get all recorded conversions.
    pub async fn recorded_conversions(&self) -> Vec<RecordedConversion> {
        self.conversions.read().await.clone()
    }

    /// Get the number of conversions attempted.
    pub async fn conversion_count(&self) -> usize {
        self.conversions.read().await.len()
    }

    /// Clear recorded conversions.
    pub async fn clear_recorded(&self) {
        self.conversions.write().await.clear();
    }

    /// Make the next conversion fail with the given error.
    pub async fn set_next_error(&self, error: ConverterError) {
        *self.next_error.write().await = Some(error);
    }

    /// Make every input containing `marker` fail with a decode error.
    pub async fn fail_inputs_containing(&self, marker: &[u8]) {
        self.failing_markers.write().await.push(marker.to_vec());
    }

    /// Set the simulated conversion duration.
    pub async fn set_conversion_duration(&self, ms: u64) {
        *self.conversion_duration_ms.write().await = ms;
    }

    /// Highest number of conversions that were running at the same time.
    pub async fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    async fn outcome(&self, input: &[u8]) -> Result<(), ConverterError> {
        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        let markers = self.failing_markers.read().await;
        let corrupt = markers
            .iter()
            .any(|m| !m.is_empty() && input.windows(m.len()).any(|w| w == m.as_slice()));
        if corrupt {
            return Err(ConverterError::Decode("mock: corrupt input".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl Converter for MockConverter {
    fn name(&self) -> &str {
        "mock"
    }

    async fn convert(
        &self,
        input: &[u8],
        format: TargetFormat,
    ) -> Result<ConvertedImage, ConverterError> {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let delay = *self.conversion_duration_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        let outcome = self.outcome(input).await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        self.conversions.write().await.push(RecordedConversion {
            input: Bytes::copy_from_slice(input),
            format,
            success: outcome.is_ok(),
        });
        outcome?;

        let mut bytes = format!("{}:", format).into_bytes();
        bytes.extend_from_slice(input);
        Ok(ConvertedImage {
            bytes: Bytes::from(bytes),
            format,
            width: self.dimensions.0,
            height: self.dimensions.1,
        })
    }
}
