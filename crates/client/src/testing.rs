//! Mock transport for testing the orchestrator without a server.

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, RwLock};

use pixconv_core::TargetFormat;

use crate::error::TransportError;
use crate::tracker::ClientFile;
use crate::transport::ConversionTransport;

/// A recorded request for test assertions.
#[derive(Debug, Clone)]
pub enum RecordedRequest {
    Single {
        file_name: String,
        format: TargetFormat,
    },
    Zip {
        /// Names and original bytes, in request order.
        files: Vec<(String, Bytes)>,
        format: TargetFormat,
    },
}

/// Releases requests held by `MockTransport::hold_requests`.
#[derive(Debug)]
pub struct RequestGate {
    tx: watch::Sender<bool>,
}

impl RequestGate {
    pub fn release(&self) {
        self.tx.send_replace(true);
    }
}

/// Mock implementation of the ConversionTransport trait.
///
/// Provides controllable behavior for testing:
/// - Track requests for assertions
/// - Fail single conversions for chosen file names
/// - Hold requests until released, to test in-flight behavior
///
/// Single conversions answer `"<format>:<file name>"`; zip requests answer
/// `"zip:<n>"` where n is the number of files sent.
#[derive(Debug, Default)]
pub struct MockTransport {
    requests: Arc<RwLock<Vec<RecordedRequest>>>,
    failing_names: Arc<RwLock<Vec<String>>>,
    zip_error: Arc<RwLock<Option<TransportError>>>,
    delay_ms: Arc<RwLock<u64>>,
    gate: Arc<RwLock<Option<watch::Receiver<bool>>>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockTransport {
    /// Create a new mock transport.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get all recorded requests.
    pub async fn recorded_requests(&self) -> Vec<RecordedRequest> {
        self.requests.read().await.clone()
    }

    /// Number of single-file requests made.
    pub async fn single_count(&self) -> usize {
        self.requests
            .read()
            .await
            .iter()
            .filter(|r| matches!(r, RecordedRequest::Single { .. }))
            .count()
    }

    /// Single conversions of a file called `name` fail with a 500.
    pub async fn fail_file(&self, name: &str) {
        self.failing_names.write().await.push(name.to_string());
    }

    /// Make the next zip request fail with the given error.
    pub async fn set_zip_error(&self, error: TransportError) {
        *self.zip_error.write().await = Some(error);
    }

    /// Set the simulated request duration.
    pub async fn set_delay(&self, ms: u64) {
        *self.delay_ms.write().await = ms;
    }

    /// Hold every request until the returned gate is released (or dropped).
    pub async fn hold_requests(&self) -> RequestGate {
        let (tx, rx) = watch::channel(false);
        *self.gate.write().await = Some(rx);
        RequestGate { tx }
    }

    /// Highest number of requests that were in flight at the same time.
    pub fn max_concurrency(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    /// Number of requests currently in flight.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    async fn simulate_latency(&self) {
        let running = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(running, Ordering::SeqCst);

        let gate = self.gate.read().await.clone();
        if let Some(mut open) = gate {
            // A dropped gate counts as released
            let _ = open.wait_for(|released| *released).await;
        }

        let delay = *self.delay_ms.read().await;
        if delay > 0 {
            tokio::time::sleep(Duration::from_millis(delay)).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl ConversionTransport for MockTransport {
    async fn convert_single(
        &self,
        file: &ClientFile,
        format: TargetFormat,
    ) -> Result<Bytes, TransportError> {
        self.requests.write().await.push(RecordedRequest::Single {
            file_name: file.name.clone(),
            format,
        });
        self.simulate_latency().await;

        if self.failing_names.read().await.contains(&file.name) {
            return Err(TransportError::Status {
                status: 500,
                message: "Failed to convert the image.".to_string(),
            });
        }
        Ok(Bytes::from(format!("{}:{}", format, file.name)))
    }

    async fn convert_and_zip(
        &self,
        files: &[ClientFile],
        format: TargetFormat,
    ) -> Result<Bytes, TransportError> {
        self.requests.write().await.push(RecordedRequest::Zip {
            files: files
                .iter()
                .map(|f| (f.name.clone(), f.bytes.clone()))
                .collect(),
            format,
        });
        self.simulate_latency().await;

        if let Some(err) = self.zip_error.write().await.take() {
            return Err(err);
        }
        Ok(Bytes::from(format!("zip:{}", files.len())))
    }
}
