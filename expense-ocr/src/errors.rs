use crate::api::models::envelope::ApiEnvelope;
use crate::providers::ProviderError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error as ThisError;

/// Envelope message for any upstream or internal failure.
pub const PROCESSING_FAILED: &str = "OCR processing failed";

#[derive(ThisError, Debug)]
pub enum Error {
    /// The request carried no file under the `file` field
    #[error("No file uploaded")]
    NoFileUploaded,

    /// The request body exceeded `limits.max_upload_bytes`
    #[error("Uploaded file exceeds the configured size limit")]
    UploadTooLarge,

    /// The OCR or language model provider could not be reached or answered with an error
    #[error(transparent)]
    Provider(#[from] ProviderError),

    /// The language model's reply is not valid JSON
    #[error("Failed to parse language model reply: {0}")]
    MalformedCompletion(#[source] serde_json::Error),

    /// The language model's reply is valid JSON but not an object
    #[error("Language model reply is a JSON {kind}, expected an object")]
    NonObjectCompletion { kind: &'static str },

    /// The upload broke off mid-file, or another internal failure; carries the full context chain
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::NoFileUploaded => StatusCode::BAD_REQUEST,
            Error::UploadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Error::Provider(_) | Error::MalformedCompletion(_) | Error::NonObjectCompletion { .. } | Error::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns a user-safe error message, without leaking which provider failed or why
    pub fn user_message(&self) -> &'static str {
        match self {
            Error::NoFileUploaded => "No file uploaded",
            Error::UploadTooLarge => "File too large",
            Error::MalformedCompletion(_) => "Failed to parse AI response.",
            Error::NonObjectCompletion { .. } => "AI response is not a JSON object.",
            Error::Provider(_) | Error::Other(_) => PROCESSING_FAILED,
        }
    }

    /// Label used for the outcome metric
    pub fn outcome(&self) -> &'static str {
        match self {
            Error::NoFileUploaded => "no_file",
            Error::UploadTooLarge => "too_large",
            Error::Provider(_) => "provider_error",
            Error::Other(_) => "internal_error",
            Error::MalformedCompletion(_) => "malformed_completion",
            Error::NonObjectCompletion { .. } => "non_object_completion",
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        // Log full error details for debugging - different log levels based on severity
        match &self {
            Error::Provider(e) => {
                tracing::error!(provider = %e.provider(), "OCR processing error: {}", e);
            }
            Error::Other(e) => {
                tracing::error!("OCR processing error: {:#}", e);
            }
            Error::MalformedCompletion(_) | Error::NonObjectCompletion { .. } => {
                tracing::warn!("Failed to parse AI response: {}", self);
            }
            Error::NoFileUploaded | Error::UploadTooLarge => {
                tracing::debug!("Client error: {}", self);
            }
        }

        (self.status_code(), Json(ApiEnvelope::failure(self.user_message()))).into_response()
    }
}

/// Type alias for service operation results
pub type Result<T> = std::result::Result<T, Error>;
