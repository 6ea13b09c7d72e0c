use base64::{Engine, engine::general_purpose::STANDARD};
use bytes::Bytes;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::errors::Error;

/// An image received from a client.
///
/// Held only for the duration of one request; [`UploadedImage::into_base64`] consumes it so the
/// raw bytes cannot outlive the OCR submission.
#[derive(Debug, Clone)]
pub struct UploadedImage {
    /// File name declared by the client, if any
    pub file_name: Option<String>,
    /// Media type declared by the client, if any. Not validated.
    pub content_type: Option<String>,
    pub data: Bytes,
}

impl UploadedImage {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Consume the image and return its bytes as standard, padded base64.
    pub fn into_base64(self) -> String {
        STANDARD.encode(&self.data)
    }
}

/// Structured expense data produced by the language model.
///
/// No schema is enforced: this is whatever object the model emitted, with its field order
/// preserved.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ExpenseRecord(Map<String, Value>);

impl ExpenseRecord {
    /// Parse a model reply. The reply must be a JSON object.
    pub fn parse(reply: &str) -> Result<Self, Error> {
        match serde_json::from_str::<Value>(reply).map_err(Error::MalformedCompletion)? {
            Value::Object(fields) => Ok(Self(fields)),
            other => Err(Error::NonObjectCompletion { kind: json_kind(&other) }),
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for ExpenseRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self(fields)
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
