//! Common test utilities: a real pixconv server on an ephemeral port.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;

use chrono::{TimeZone, Utc};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use pixconv_client::{ClientFile, ClientOrchestrator, HttpTransport, TransportConfig};
use pixconv_core::{Config, RasterConverter};
use pixconv_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use pixconv_core::testing::fixtures;

/// A server running in the test process.
pub struct TestServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
    _static_dir: tempfile::TempDir,
}

impl TestServer {
    /// Start a server with the real raster converter.
    pub async fn start() -> Self {
        let static_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut config = Config::default();
        config.server.static_dir = static_dir.path().to_path_buf();

        let converter = Arc::new(RasterConverter::new(config.converter.clone()));
        let app = create_router(Arc::new(AppState::new(config, converter)));

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind");
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            handle,
            _static_dir: static_dir,
        }
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    /// An orchestrator talking to this server over HTTP.
    pub fn orchestrator(&self) -> ClientOrchestrator {
        let transport = HttpTransport::new(TransportConfig::new(self.url())).unwrap();
        ClientOrchestrator::new(Arc::new(transport))
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// A JPEG client file with a fixed modification time.
pub fn jpeg_file(name: &str, width: u32, height: u32) -> ClientFile {
    ClientFile::new(
        name,
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        "image/jpeg",
        fixtures::jpeg_bytes(width, height),
    )
}

/// A file that claims to be a JPEG but cannot be decoded.
pub fn corrupt_file(name: &str) -> ClientFile {
    ClientFile::new(
        name,
        Utc.timestamp_millis_opt(1_700_000_000_000).unwrap(),
        "image/jpeg",
        fixtures::corrupt_bytes(),
    )
}
