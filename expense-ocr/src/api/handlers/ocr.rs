use std::time::Instant;

use axum::{
    Json,
    extract::{
        Multipart, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use tracing::{debug, warn};

use crate::AppState;
use crate::api::models::envelope::ApiEnvelope;
use crate::api::models::expense::UploadedImage;
use crate::errors::{Error, Result};
use crate::metrics;

/// Multipart field carrying the receipt image.
pub const FILE_FIELD: &str = "file";

/// Extract structured expense data from a receipt image.
#[utoipa::path(
    post,
    path = "/api/ocr",
    tag = "ocr",
    summary = "Extract expense data",
    description = "Runs OCR on the uploaded image and asks a language model to structure the recognised text \
        as an expense record. The record's fields are returned next to `success: true`; their names and types \
        are whatever the model produced.",
    request_body(
        content_type = "multipart/form-data",
        content = crate::openapi::extra_types::ExpenseUpload,
        description = "A single image file under the `file` field"
    ),
    responses(
        (status = 200, description = "Expense record extracted", body = crate::openapi::extra_types::ExtractionSuccess),
        (status = 400, description = "No file uploaded", body = crate::openapi::extra_types::ExtractionFailure),
        (status = 413, description = "File exceeds the configured upload limit", body = crate::openapi::extra_types::ExtractionFailure),
        (status = 500, description = "OCR or language model failure, or an unparseable model reply", body = crate::openapi::extra_types::ExtractionFailure)
    )
)]
#[tracing::instrument(skip_all)]
pub async fn extract_expense(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<(StatusCode, Json<ApiEnvelope>)> {
    let started = Instant::now();

    let result = match read_upload(multipart).await {
        Ok(image) => state.extractor.extract(image).await,
        Err(e) => Err(e),
    };

    let outcome = match &result {
        Ok(_) => "success",
        Err(e) => e.outcome(),
    };
    metrics::record_extraction(outcome);
    metrics::record_extraction_duration(outcome, started.elapsed());

    let record = result?;
    Ok((StatusCode::OK, Json(ApiEnvelope::from(record))))
}

/// Pull the first `file` part with a filename out of the request body.
///
/// Any later parts are drained and ignored.
async fn read_upload(multipart: std::result::Result<Multipart, MultipartRejection>) -> Result<UploadedImage> {
    let mut multipart = multipart.map_err(|rejection| {
        debug!("Request body is not multipart/form-data: {}", rejection);
        Error::NoFileUploaded
    })?;

    let mut image: Option<UploadedImage> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if image.is_some() => {
                warn!("Ignoring malformed trailing multipart data: {}", e);
                break;
            }
            Err(e) => return Err(upload_error(e)),
        };

        if image.is_some() || field.name() != Some(FILE_FIELD) {
            continue;
        }
        // A part without a filename is a plain form value
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| file_read_error(&file_name, e))?;

        debug!(file_name = %file_name, bytes = data.len(), "Received upload");
        image = Some(UploadedImage {
            file_name: Some(file_name),
            content_type,
            data,
        });
    }

    image.ok_or(Error::NoFileUploaded)
}

/// The body broke off or was malformed while the file itself was being read.
fn file_read_error(file_name: &str, e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        return Error::UploadTooLarge;
    }
    Error::Other(anyhow::Error::new(e).context(format!("Failed to read uploaded file {file_name:?}")))
}

fn upload_error(e: MultipartError) -> Error {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        Error::UploadTooLarge
    } else {
        debug!("Failed to read multipart body: {}", e);
        Error::NoFileUploaded
    }
}
