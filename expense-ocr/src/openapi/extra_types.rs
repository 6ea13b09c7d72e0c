//! Documentation-only schemas.
//!
//! The real envelope is [`crate::api::models::envelope::ApiEnvelope`], whose success shape depends
//! on whatever fields the model returns; these types describe it for OpenAPI consumers.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Multipart body of `POST /api/ocr`.
#[derive(Debug, Deserialize, ToSchema)]
#[allow(unused)]
pub struct ExpenseUpload {
    /// Receipt or invoice image.
    #[schema(format = Binary, value_type = String)]
    pub file: Vec<u8>,
}

/// Successful extraction. Every field besides `success` comes straight from the language model,
/// in the order it produced them.
#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "success": true,
    "merchant": "Acme",
    "amount": 42.0
}))]
pub struct ExtractionSuccess {
    /// Always `true`.
    pub success: bool,
}

/// Failed extraction.
#[derive(Debug, Serialize, ToSchema)]
#[schema(example = json!({
    "success": false,
    "error": "OCR processing failed"
}))]
pub struct ExtractionFailure {
    /// Always `false`.
    pub success: bool,

    /// One of `No file uploaded`, `File too large`, `Failed to parse AI response.`,
    /// `AI response is not a JSON object.` or `OCR processing failed`.
    #[schema(example = "No file uploaded")]
    pub error: String,
}
