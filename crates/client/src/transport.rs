//! Client side of the conversion HTTP API.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{multipart, Client, Response};
use serde::{Deserialize, Serialize};
use tracing::debug;

use pixconv_core::TargetFormat;

use crate::error::TransportError;
use crate::tracker::ClientFile;

/// Sends files to a conversion server.
#[async_trait]
pub trait ConversionTransport: Send + Sync {
    /// Converts one file, returning the converted bytes.
    async fn convert_single(
        &self,
        file: &ClientFile,
        format: TargetFormat,
    ) -> Result<Bytes, TransportError>;

    /// Converts a batch of files, returning the ZIP archive bytes.
    async fn convert_and_zip(
        &self,
        files: &[ClientFile],
        format: TargetFormat,
    ) -> Result<Bytes, TransportError>;
}

/// Settings for `HttpTransport`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransportConfig {
    /// Base URL of the server, e.g. `http://localhost:3000`.
    pub server_url: String,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    120
}

impl TransportConfig {
    pub fn new(server_url: impl Into<String>) -> Self {
        Self {
            server_url: server_url.into(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

/// `ConversionTransport` over HTTP multipart requests.
pub struct HttpTransport {
    client: Client,
    config: TransportConfig,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { client, config })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.server_url.trim_end_matches('/')
    }

    fn file_part(file: &ClientFile) -> Result<multipart::Part, TransportError> {
        Ok(multipart::Part::bytes(file.bytes.to_vec())
            .file_name(file.name.clone())
            .mime_str(&file.mime_type)?)
    }

    async fn post(&self, path: &str, form: multipart::Form) -> Result<Bytes, TransportError> {
        let url = format!("{}{}", self.base_url(), path);
        debug!(url = %url, "Posting conversion request");

        let response = self.client.post(&url).multipart(form).send().await?;
        Self::read_body(response).await
    }

    async fn read_body(response: Response) -> Result<Bytes, TransportError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&body)
                .map(|b| b.error)
                .unwrap_or(body);
            return Err(TransportError::Status {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.bytes().await?)
    }
}

#[async_trait]
impl ConversionTransport for HttpTransport {
    async fn convert_single(
        &self,
        file: &ClientFile,
        format: TargetFormat,
    ) -> Result<Bytes, TransportError> {
        let form = multipart::Form::new()
            .part("image", Self::file_part(file)?)
            .text("format", format.as_str());
        self.post("/convert-single", form).await
    }

    async fn convert_and_zip(
        &self,
        files: &[ClientFile],
        format: TargetFormat,
    ) -> Result<Bytes, TransportError> {
        let mut form = multipart::Form::new().text("format", format.as_str());
        for file in files {
            form = form.part("images", Self::file_part(file)?);
        }
        self.post("/convert-and-zip", form).await
    }
}
