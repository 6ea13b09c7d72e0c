//! Google Cloud Vision text detection client.

use serde::{Deserialize, Serialize};
use tracing::instrument;
use url::Url;

use super::{Provider, ProviderError, send_json};
use crate::config::VisionConfig;

const ANNOTATE_PATH: &str = "/v1/images:annotate";
const TEXT_DETECTION: &str = "TEXT_DETECTION";

#[derive(Debug, Serialize)]
struct AnnotateRequest<'a> {
    requests: [AnnotateImageRequest<'a>; 1],
}

#[derive(Debug, Serialize)]
struct AnnotateImageRequest<'a> {
    image: Image<'a>,
    features: [Feature; 1],
}

#[derive(Debug, Serialize)]
struct Image<'a> {
    /// Base64-encoded image bytes
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct Feature {
    #[serde(rename = "type")]
    kind: &'static str,
}

/// Response to a batch annotate call. `responses` is required: a body without it is malformed.
#[derive(Debug, Deserialize)]
pub struct AnnotateResponse {
    pub responses: Vec<AnnotateImageResponse>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AnnotateImageResponse {
    pub full_text_annotation: Option<TextAnnotation>,
    pub error: Option<AnnotateStatus>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct TextAnnotation {
    pub text: Option<String>,
}

/// Per-image error reported inside an otherwise successful response.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnnotateStatus {
    pub code: Option<i64>,
    pub message: Option<String>,
}

impl AnnotateResponse {
    /// Full text of the first image result, or an empty string when nothing was detected.
    pub fn into_text(self) -> String {
        self.responses
            .into_iter()
            .next()
            .and_then(|response| {
                if let Some(status) = &response.error {
                    tracing::warn!(code = ?status.code, message = ?status.message, "OCR provider reported a per-image error");
                }
                response.full_text_annotation
            })
            .and_then(|annotation| annotation.text)
            .unwrap_or_default()
    }
}

/// Client for the Vision `images:annotate` endpoint.
#[derive(Clone)]
pub struct VisionClient {
    http: reqwest::Client,
    endpoint: Url,
    api_key: String,
}

impl VisionClient {
    pub fn new(http: reqwest::Client, config: &VisionConfig) -> Self {
        let mut endpoint = config.url.clone();
        endpoint.set_path(&format!("{}{}", config.url.path().trim_end_matches('/'), ANNOTATE_PATH));

        Self {
            http,
            endpoint,
            api_key: config.api_key.clone().unwrap_or_default(),
        }
    }

    /// Run text detection on one base64-encoded image.
    ///
    /// Returns the recognized text, which is empty when the image contains no text.
    #[instrument(skip_all, fields(image_base64_len = image_base64.len()))]
    pub async fn detect_text(&self, image_base64: &str) -> Result<String, ProviderError> {
        let body = AnnotateRequest {
            requests: [AnnotateImageRequest {
                image: Image { content: image_base64 },
                features: [Feature { kind: TEXT_DETECTION }],
            }],
        };

        // The key travels in the query string; the URL is never logged.
        let mut url = self.endpoint.clone();
        url.query_pairs_mut().append_pair("key", &self.api_key);

        let request = self.http.post(url).json(&body);
        let response: AnnotateResponse = send_json(Provider::Vision, request).await?;
        let text = response.into_text();

        tracing::debug!(text_len = text.len(), "Text detection completed");
        Ok(text)
    }
}
