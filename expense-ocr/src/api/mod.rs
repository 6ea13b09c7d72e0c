//! HTTP surface of the service.
//!
//! - **[`handlers`]**: Axum route handlers
//! - **[`models`]**: The uploaded image, the expense record and the response envelope
//!
//! The only business endpoint is `POST /api/ocr`; it is documented with `utoipa` and the
//! interactive docs are served at `/docs`.

pub mod handlers;
pub mod models;
