//! OpenAPI documentation for the HTTP surface.
//!
//! Served as JSON at `/api-docs/openapi.json` and rendered with Scalar at `/docs`.

pub mod extra_types;

use utoipa::OpenApi;

use crate::api;

#[derive(OpenApi)]
#[openapi(
    paths(api::handlers::ocr::extract_expense),
    components(schemas(
        extra_types::ExpenseUpload,
        extra_types::ExtractionSuccess,
        extra_types::ExtractionFailure,
    )),
    tags(
        (name = "ocr", description = "Receipt and invoice extraction"),
    ),
    info(
        title = "Expense OCR API",
        version = "1.0.0",
        description = "Turns a photographed receipt or invoice into a structured expense record using \
            OCR followed by a language model.",
    ),
)]
pub struct ApiDoc;
