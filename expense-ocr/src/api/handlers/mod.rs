//! HTTP request handlers.
//!
//! Handlers return [`crate::errors::Result`]; the error side renders itself as a
//! `{"success": false, "error": ...}` envelope with the matching status code.

pub mod ocr;
