use serde::ser::{Serialize, SerializeMap, Serializer};

use super::expense::ExpenseRecord;

/// Top-level JSON object returned to every caller.
///
/// Serializes as `{"success": true, ...record fields}` or `{"success": false, "error": "..."}`.
/// `success` is always the first key and always reflects the outcome: a `success` field emitted
/// by the model is dropped rather than allowed to overwrite it.
#[derive(Debug, Clone, PartialEq)]
pub enum ApiEnvelope {
    Success(ExpenseRecord),
    Failure { error: String },
}

impl ApiEnvelope {
    pub fn failure(error: impl Into<String>) -> Self {
        ApiEnvelope::Failure { error: error.into() }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, ApiEnvelope::Success(_))
    }
}

/// Envelope key carrying the outcome.
const SUCCESS_FIELD: &str = "success";

impl From<ExpenseRecord> for ApiEnvelope {
    fn from(record: ExpenseRecord) -> Self {
        if let Some(value) = record.get(SUCCESS_FIELD) {
            tracing::debug!(%value, "Dropping `success` field emitted by the language model");
        }
        ApiEnvelope::Success(record)
    }
}

impl Serialize for ApiEnvelope {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ApiEnvelope::Success(record) => {
                let mut map = serializer.serialize_map(None)?;
                map.serialize_entry(SUCCESS_FIELD, &true)?;
                // The outcome flag is owned by the envelope; a model-supplied `success` never reaches the client
                for (field, value) in record.iter().filter(|(field, _)| field.as_str() != SUCCESS_FIELD) {
                    map.serialize_entry(field, value)?;
                }
                map.end()
            }
            ApiEnvelope::Failure { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry(SUCCESS_FIELD, &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}
