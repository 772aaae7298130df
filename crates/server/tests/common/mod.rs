//! Common test utilities for endpoint testing.
//!
//! This module provides a test fixture that creates an in-process router
//! with either the controllable `MockConverter` or the real
//! `RasterConverter` injected, plus a small multipart body builder.

#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode};
use axum::Router;
use bytes::Bytes;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use pixconv_core::{testing::MockConverter, Config, Converter, RasterConverter};

/// Re-export fixtures for test convenience
pub use pixconv_core::testing::fixtures;

/// Test fixture driving the router in-process.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_single_conversion() {
///     let fixture = TestFixture::new();
///
///     let form = MultipartForm::new()
///         .file("image", "photo.jpg", "image/jpeg", fixtures::jpeg_bytes(10, 10))
///         .text("format", "png");
///     let response = fixture.post_multipart("/convert-single", form).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock converter, when the fixture was built with one
    pub converter: Option<Arc<MockConverter>>,
    /// Directory served as static files
    pub static_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl TestResponse {
    /// Body parsed as JSON, or `Null` if it is not JSON.
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).unwrap_or(Value::Null)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestFixture {
    /// Fixture backed by a `MockConverter`.
    pub fn new() -> Self {
        let converter = Arc::new(MockConverter::new());
        let mut fixture = Self::build(
            Config::default(),
            Arc::clone(&converter) as Arc<dyn Converter>,
        );
        fixture.converter = Some(converter);
        fixture
    }

    /// Fixture backed by the real raster converter.
    pub fn with_real_converter() -> Self {
        Self::with_config(Config::default())
    }

    /// Real converter with custom configuration. `static_dir` is always
    /// replaced by a fresh temp directory.
    pub fn with_config(config: Config) -> Self {
        let converter = Arc::new(RasterConverter::new(config.converter.clone()));
        Self::build(config, converter)
    }

    fn build(mut config: Config, converter: Arc<dyn Converter>) -> Self {
        let static_dir = TempDir::new().expect("Failed to create temp dir");
        std::fs::write(
            static_dir.path().join("index.html"),
            "<!doctype html><title>pixconv</title>",
        )
        .expect("Failed to write index.html");
        config.server.static_dir = static_dir.path().to_path_buf();

        let state = Arc::new(pixconv_server::state::AppState::new(config, converter));
        let router = pixconv_server::api::create_router(state);

        Self {
            router,
            converter: None,
            static_dir,
        }
    }

    /// The mock converter; panics for real-converter fixtures.
    pub fn mock(&self) -> &MockConverter {
        self.converter
            .as_deref()
            .expect("fixture was built with the real converter")
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        let request = Request::builder()
            .method("GET")
            .uri(path)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    /// Send a multipart POST request.
    pub async fn post_multipart(&self, path: &str, form: MultipartForm) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", form.content_type())
            .body(Body::from(form.into_body()))
            .unwrap();
        self.send(request).await
    }

    /// Send a POST request with raw body and custom content type.
    pub async fn post_raw(&self, path: &str, body: &str, content_type: &str) -> TestResponse {
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header("Content-Type", content_type)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// Minimal `multipart/form-data` encoder for building request bodies.
#[derive(Debug, Default)]
pub struct MultipartForm {
    body: Vec<u8>,
}

const BOUNDARY: &str = "pixconv-test-boundary-7MA4YWxkTrZu0gW";

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file part.
    pub fn file(
        mut self,
        field: &str,
        file_name: &str,
        content_type: &str,
        data: impl AsRef<[u8]>,
    ) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"; filename=\"{file_name}\"\r\nContent-Type: {content_type}\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(data.as_ref());
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// Add a JPEG file part.
    pub fn jpeg(self, field: &str, file_name: &str, data: impl AsRef<[u8]>) -> Self {
        self.file(field, file_name, "image/jpeg", data)
    }

    /// Add a text part.
    pub fn text(mut self, field: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{field}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={BOUNDARY}")
    }

    pub fn into_body(mut self) -> Vec<u8> {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        self.body
    }
}

/// Entry names and contents of a ZIP archive, in archive order.
pub fn read_zip(bytes: &[u8]) -> Vec<(String, Vec<u8>)> {
    use std::io::Read;

    let mut archive =
        zip::ZipArchive::new(std::io::Cursor::new(bytes)).expect("response is not a ZIP");
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut data = Vec::new();
            entry.read_to_end(&mut data).unwrap();
            (entry.name().to_string(), data)
        })
        .collect()
}
