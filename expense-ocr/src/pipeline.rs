//! The extraction pipeline: image → OCR text → instruction → model reply → expense record.
//!
//! Each step runs only if the previous one succeeded. Nothing is retried, cached or shared
//! between requests; the only state is the read-only provider clients built at startup.

use tracing::instrument;

use crate::api::models::expense::{ExpenseRecord, UploadedImage};
use crate::config::Config;
use crate::errors::Result;
use crate::providers::{ChatClient, VisionClient};

/// Prefix of the instruction sent to the language model; the OCR text is appended verbatim.
pub const EXTRACTION_INSTRUCTION: &str = "Extract structured expense data from the following OCR text: ";

/// Reply assumed when the model returns no content.
pub const EMPTY_REPLY: &str = "{}";

/// Build the instruction that asks the model to structure `ocr_text`.
pub fn build_instruction(ocr_text: &str) -> String {
    format!("{EXTRACTION_INSTRUCTION}{ocr_text}")
}

/// Runs the OCR and structuring calls for one uploaded image.
#[derive(Clone)]
pub struct ExpenseExtractor {
    vision: VisionClient,
    chat: ChatClient,
}

impl ExpenseExtractor {
    pub fn new(vision: VisionClient, chat: ChatClient) -> Self {
        Self { vision, chat }
    }

    /// Build both provider clients from configuration, sharing one HTTP client.
    pub fn from_config(http: reqwest::Client, config: &Config) -> Self {
        Self::new(VisionClient::new(http.clone(), &config.vision), ChatClient::new(http, &config.openai))
    }

    /// Extract a structured expense record from `image`.
    ///
    /// The image is consumed by the base64 encoding step and dropped before any network call
    /// completes. Provider failures surface as [`crate::errors::Error::Provider`]; replies that
    /// are not a JSON object surface as parse errors.
    #[instrument(skip_all, fields(file_name = ?image.file_name, content_type = ?image.content_type, bytes = image.len()))]
    pub async fn extract(&self, image: UploadedImage) -> Result<ExpenseRecord> {
        let encoded = image.into_base64();

        let ocr_text = self.vision.detect_text(&encoded).await?;
        drop(encoded);

        let instruction = build_instruction(&ocr_text);
        let reply = self.chat.complete(&instruction).await?;

        let record = ExpenseRecord::parse(reply.as_deref().unwrap_or(EMPTY_REPLY))?;
        tracing::info!(fields = record.len(), "Extracted expense record");
        Ok(record)
    }
}
