//! Clients for the two upstream services the extraction pipeline depends on.
//!
//! - [`vision`]: Google Cloud Vision text detection (OCR)
//! - [`openai`]: OpenAI-compatible chat completions (structuring)
//!
//! Both clients share one [`reqwest::Client`] and report failures as [`ProviderError`]. The
//! error keeps enough detail for logs; callers only ever see a generic message.

use serde::de::DeserializeOwned;
use std::fmt;

pub mod openai;
pub mod vision;

pub use openai::ChatClient;
pub use vision::VisionClient;

/// Upper bound on how much of an upstream error body is kept for diagnostics.
const ERROR_BODY_EXCERPT_CHARS: usize = 512;

/// Which upstream service a call was made to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    Vision,
    LanguageModel,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Vision => write!(f, "OCR provider"),
            Provider::LanguageModel => write!(f, "language model provider"),
        }
    }
}

/// Errors that can occur while calling an upstream provider
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Network failure, TLS failure, or the connection was dropped mid-response
    #[error("{provider} request failed: {source}")]
    Transport {
        provider: Provider,
        #[source]
        source: reqwest::Error,
    },

    /// The provider answered with a non-2xx status
    #[error("{provider} returned HTTP {status}: {body}")]
    Status {
        provider: Provider,
        status: reqwest::StatusCode,
        body: String,
    },

    /// The provider answered 2xx but the payload does not have the expected shape
    #[error("{provider} returned a malformed payload: {source}")]
    Decode {
        provider: Provider,
        #[source]
        source: serde_json::Error,
    },
}

impl ProviderError {
    pub fn provider(&self) -> Provider {
        match self {
            ProviderError::Transport { provider, .. } | ProviderError::Status { provider, .. } | ProviderError::Decode { provider, .. } => {
                *provider
            }
        }
    }
}

/// Send a prepared request and decode a successful JSON response.
///
/// Non-2xx responses are turned into [`ProviderError::Status`] with an excerpt of the body. The
/// body is read as text first so that decoding failures are reported separately from transport
/// failures.
pub(crate) async fn send_json<T: DeserializeOwned>(provider: Provider, request: reqwest::RequestBuilder) -> Result<T, ProviderError> {
    // URLs may carry credentials in their query string, so they are stripped from errors.
    let response = request.send().await.map_err(|source| {
        let source = source.without_url();
        tracing::error!(%provider, error = %source, "Upstream request failed");
        ProviderError::Transport { provider, source }
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|source| ProviderError::Transport {
        provider,
        source: source.without_url(),
    })?;

    tracing::debug!(%provider, status = status.as_u16(), response_len = body.len(), "Upstream request completed");

    if !status.is_success() {
        return Err(ProviderError::Status {
            provider,
            status,
            body: body.chars().take(ERROR_BODY_EXCERPT_CHARS).collect(),
        });
    }

    serde_json::from_str(&body).map_err(|source| ProviderError::Decode { provider, source })
}
