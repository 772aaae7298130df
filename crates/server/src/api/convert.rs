//! Conversion endpoints: one image back as raw bytes, or many as a ZIP stream.

use axum::{
    body::Body,
    extract::{
        multipart::{MultipartError, MultipartRejection},
        Multipart, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::str::FromStr;
use std::sync::Arc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

use pixconv_core::{
    content_disposition, convert_into_archive, BatchItem, TargetFormat, ZipStream,
    ARCHIVE_CONTENT_TYPE,
};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

fn rejected_body(rejection: MultipartRejection) -> ApiError {
    api_error(
        StatusCode::BAD_REQUEST,
        format!("Invalid multipart body: {}", rejection.body_text()),
    )
}

fn unreadable_body(err: MultipartError) -> ApiError {
    let status = err.status();
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        return api_error(status, "Upload exceeds the size limit.");
    }
    api_error(
        StatusCode::BAD_REQUEST,
        format!("Invalid multipart body: {}", err.body_text()),
    )
}

fn parse_format(value: Option<&str>) -> Result<TargetFormat, ApiError> {
    value
        .and_then(|v| TargetFormat::from_str(v).ok())
        .ok_or_else(|| api_error(StatusCode::BAD_REQUEST, "Invalid target format specified."))
}

/// A file part of the multipart body.
struct Upload {
    file_name: String,
    bytes: bytes::Bytes,
}

/// Reads every part of the body before anything is validated, so the
/// order of `format` and the file parts does not matter.
async fn read_form(
    multipart: &mut Multipart,
    file_field: &str,
) -> Result<(Vec<Upload>, Option<String>), ApiError> {
    let mut uploads = Vec::new();
    let mut format = None;

    while let Some(field) = multipart.next_field().await.map_err(unreadable_body)? {
        let name = field.name().unwrap_or("").to_string();
        if name == file_field {
            // Text parts under the file field name are not uploads
            let Some(file_name) = field.file_name().map(|s| s.to_string()) else {
                continue;
            };
            let bytes = field.bytes().await.map_err(unreadable_body)?;
            uploads.push(Upload { file_name, bytes });
        } else if name == "format" {
            format = Some(field.text().await.map_err(unreadable_body)?);
        }
    }

    Ok((uploads, format))
}

/// `POST /convert-single`: converts the `image` part to `format`.
pub async fn convert_single(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(rejected_body)?;
    let (uploads, format) = read_form(&mut multipart, "image").await?;

    let Some(upload) = uploads.into_iter().next() else {
        return Err(api_error(StatusCode::BAD_REQUEST, "No file uploaded."));
    };
    let format = parse_format(format.as_deref())?;

    let converted = state
        .converter()
        .convert(&upload.bytes, format)
        .await
        .map_err(|e| {
            error!(file = %upload.file_name, format = %format, error = %e, "Conversion failed");
            api_error(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to convert the image.",
            )
        })?;

    info!(
        file = %upload.file_name,
        format = %format,
        width = converted.width,
        height = converted.height,
        bytes = converted.bytes.len(),
        "Converted image"
    );

    Ok((
        [(header::CONTENT_TYPE, converted.content_type())],
        converted.bytes,
    )
        .into_response())
}

/// `POST /convert-and-zip`: converts every `images` part and streams back a
/// ZIP of the ones that succeeded.
///
/// Headers go out before the first entry is converted. An archive failure
/// after that point surfaces as an error in the body stream, which aborts
/// the response.
pub async fn convert_and_zip(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, ApiError> {
    let mut multipart = multipart.map_err(rejected_body)?;
    let (uploads, format) = read_form(&mut multipart, "images").await?;

    if uploads.is_empty() {
        return Err(api_error(StatusCode::BAD_REQUEST, "No files were uploaded."));
    }
    let format = parse_format(format.as_deref())?;

    let items: Vec<BatchItem> = uploads
        .into_iter()
        .map(|u| BatchItem::new(u.file_name, u.bytes))
        .collect();

    let batch_id = Uuid::new_v4();
    let span = info_span!("batch", id = %batch_id, format = %format, files = items.len());
    span.in_scope(|| info!("Starting archive"));

    let (archive, chunks) = ZipStream::channel(&state.config().archive);
    let converter = state.converter();
    tokio::spawn(
        async move {
            if let Err(e) = convert_into_archive(converter.as_ref(), items, format, archive).await
            {
                error!(error = %e, "Archive stream aborted");
            }
        }
        .instrument(span),
    );

    Ok((
        [
            (header::CONTENT_TYPE, ARCHIVE_CONTENT_TYPE.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition()),
        ],
        Body::from_stream(ReceiverStream::new(chunks)),
    )
        .into_response())
}
