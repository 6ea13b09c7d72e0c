//! OpenAI-compatible chat completions client.
//!
//! Only the fields the pipeline reads are modelled. Every response field is optional so that
//! providers which omit usage, ids or finish reasons are still accepted; a reply without any
//! content is reported as `None`.

use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{Provider, ProviderError, send_json};
use crate::config::OpenAiConfig;

const CHAT_COMPLETIONS_PATH: &str = "/chat/completions";

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatCompletionResponse {
    pub choices: Option<Vec<ChatChoice>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatChoice {
    pub message: Option<ChatResponseMessage>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ChatResponseMessage {
    pub content: Option<String>,
}

impl ChatCompletionResponse {
    /// Content of the first choice. Empty content counts as no content.
    pub fn into_content(self) -> Option<String> {
        self.choices?
            .into_iter()
            .next()?
            .message?
            .content
            .filter(|content| !content.is_empty())
    }
}

/// Client for the `chat/completions` endpoint.
#[derive(Clone)]
pub struct ChatClient {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
}

impl ChatClient {
    pub fn new(http: reqwest::Client, config: &OpenAiConfig) -> Self {
        Self {
            http,
            endpoint: format!("{}{}", config.url.as_str().trim_end_matches('/'), CHAT_COMPLETIONS_PATH),
            api_key: config.api_key.clone().unwrap_or_default(),
            model: config.model.clone(),
        }
    }

    /// Send `instruction` as a single system message and return the model's reply text.
    #[instrument(skip_all, fields(model = %self.model, instruction_len = instruction.len()))]
    pub async fn complete(&self, instruction: &str) -> Result<Option<String>, ProviderError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: [ChatMessage {
                role: "system",
                content: instruction,
            }],
        };

        let request = self.http.post(&self.endpoint).bearer_auth(&self.api_key).json(&body);
        let response: ChatCompletionResponse = send_json(Provider::LanguageModel, request).await?;
        let content = response.into_content();

        tracing::debug!(has_content = content.is_some(), "Chat completion received");
        Ok(content)
    }
}
