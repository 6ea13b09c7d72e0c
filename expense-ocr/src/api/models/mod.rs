//! API request and response data models.
//!
//! This module contains the data structures exchanged over HTTP. They are request-scoped and
//! never persisted.
//!
//! - [`expense`]: the uploaded image and the structured record extracted from it
//! - [`envelope`]: the `{ success, error?, ...fields }` wrapper every response uses

pub mod envelope;
pub mod expense;
