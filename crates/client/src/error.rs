use thiserror::Error;

/// Errors talking to the conversion server.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server responded with {status}: {message}")]
    Status { status: u16, message: String },
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Request(e.to_string())
        }
    }
}

/// Errors returned by `ClientOrchestrator` operations.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("A conversion batch is already running")]
    BatchInProgress,

    #[error("No successfully converted files to download")]
    NothingToDownload,

    #[error(transparent)]
    Transport(#[from] TransportError),
}
