//! Client for the pixconv conversion server.
//!
//! [`ClientOrchestrator`] tracks the files a user picked, converts them
//! through a [`ConversionTransport`] and exposes what a view should show.

pub mod error;
pub mod orchestrator;
pub mod testing;
pub mod tracker;
pub mod transport;

pub use error::{ClientError, TransportError};
pub use orchestrator::{ClientEvent, ClientOrchestrator, ConvertSummary, ViewState, ZipDownload};
pub use tracker::{ClientFile, ConvertedFile, FileKey, FileStatus, FileTracker, TrackedFile};
pub use transport::{ConversionTransport, HttpTransport, TransportConfig};
