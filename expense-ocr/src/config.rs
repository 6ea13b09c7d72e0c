//! Application configuration management.
//!
//! Configuration is loaded from a YAML file with environment variable overrides. The configuration
//! file path defaults to `config.yaml` but can be specified via `-f` flag or `EXPENSE_OCR_CONFIG`
//! environment variable. A missing file is not an error: every field has a default, and the
//! provider credentials are usually supplied through the environment.
//!
//! ## Loading Priority
//!
//! Configuration sources are merged in the following order (later sources override earlier ones):
//!
//! 1. **YAML config file** - Base configuration (default: `config.yaml`)
//! 2. **Environment variables** - Variables prefixed with `EXPENSE_OCR_` override YAML values
//! 3. **Provider variables** - `GOOGLE_CLOUD_VISION_API_KEY`, `OPENAI_API_KEY` and `PORT` are read
//!    verbatim and override `vision.api_key`, `openai.api_key` and `port` respectively
//!
//! For nested config values, use double underscores in environment variables. For example,
//! `EXPENSE_OCR_OPENAI__MODEL=gpt-4o` sets the `openai.model` field.
//!
//! ## Environment Variable Examples
//!
//! ```bash
//! # Provider credentials
//! GOOGLE_CLOUD_VISION_API_KEY=AIza...
//! OPENAI_API_KEY=sk-...
//!
//! # Override server port
//! PORT=8080
//!
//! # Point the language model client at an OpenAI-compatible gateway
//! EXPENSE_OCR_OPENAI__URL=https://gateway.example.com/ai/v1
//! EXPENSE_OCR_ENABLE_METRICS=true
//! ```

use clap::Parser;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Simple CLI args - just for specifying config file
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Path to configuration file
    #[arg(short = 'f', long, env = "EXPENSE_OCR_CONFIG", default_value = "config.yaml")]
    pub config: String,

    /// Validate configuration and exit without starting the server.
    #[arg(long)]
    pub validate: bool,
}

/// Main application configuration.
///
/// Loaded once at startup and never mutated afterwards; handlers see it through
/// [`crate::AppState`].
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// HTTP server host to bind to (e.g., "0.0.0.0" for all interfaces)
    pub host: String,
    /// HTTP server port to bind to
    pub port: u16,
    /// OCR provider (Google Cloud Vision) settings
    pub vision: VisionConfig,
    /// Language model provider (OpenAI-compatible chat completions) settings
    pub openai: OpenAiConfig,
    /// Request size limits
    pub limits: LimitsConfig,
    /// Enable Prometheus metrics endpoint at `/internal/metrics`
    pub enable_metrics: bool,
    /// Enable OpenTelemetry OTLP export for distributed tracing
    pub enable_otel_export: bool,
}

/// Google Cloud Vision `images:annotate` settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct VisionConfig {
    /// Base URL of the Vision API; `/v1/images:annotate` is appended
    pub url: Url,
    /// API key, sent as the `key` query parameter
    pub api_key: Option<String>,
}

/// OpenAI-compatible chat completions settings.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct OpenAiConfig {
    /// Base URL of the API, including the version segment; `/chat/completions` is appended
    pub url: Url,
    /// API key, sent as a bearer token
    pub api_key: Option<String>,
    /// Model identifier requested for every completion
    pub model: String,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct LimitsConfig {
    /// Maximum accepted request body size in bytes. Unlimited when unset.
    pub max_upload_bytes: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            vision: VisionConfig::default(),
            openai: OpenAiConfig::default(),
            limits: LimitsConfig::default(),
            enable_metrics: false,
            enable_otel_export: false,
        }
    }
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("https://vision.googleapis.com").expect("static URL is valid"),
            api_key: None,
        }
    }
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            url: Url::parse("https://api.openai.com/v1").expect("static URL is valid"),
            api_key: None,
            model: "gpt-4".to_string(),
        }
    }
}

// Credentials must never end up in logs, so these skip the derived Debug.
impl fmt::Debug for VisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisionConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &redact(&self.api_key))
            .finish()
    }
}

impl fmt::Debug for OpenAiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpenAiConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &redact(&self.api_key))
            .field("model", &self.model)
            .finish()
    }
}

fn redact(secret: &Option<String>) -> &'static str {
    match secret {
        Some(_) => "<redacted>",
        None => "<unset>",
    }
}

impl Config {
    #[allow(clippy::result_large_err)]
    pub fn load(args: &Args) -> Result<Self, figment::Error> {
        let config: Self = Self::figment(args).extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration for consistency and required fields
    #[allow(clippy::result_large_err)]
    pub fn validate(&self) -> Result<(), figment::Error> {
        if self.vision.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(figment::Error::from(
                "Config validation: vision.api_key is not configured. \
                 Please set GOOGLE_CLOUD_VISION_API_KEY or add vision.api_key to the config file."
                    .to_string(),
            ));
        }

        if self.openai.api_key.as_deref().is_none_or(str::is_empty) {
            return Err(figment::Error::from(
                "Config validation: openai.api_key is not configured. \
                 Please set OPENAI_API_KEY or add openai.api_key to the config file."
                    .to_string(),
            ));
        }

        if self.openai.model.trim().is_empty() {
            return Err(figment::Error::from("Config validation: openai.model cannot be empty".to_string()));
        }

        if self.limits.max_upload_bytes == Some(0) {
            return Err(figment::Error::from(
                "Config validation: limits.max_upload_bytes must be greater than 0 (omit it for no limit)".to_string(),
            ));
        }

        Ok(())
    }

    pub fn figment(args: &Args) -> Figment {
        Figment::new()
            // Load base config file
            .merge(Yaml::file(&args.config))
            // Prefixed environment variables override specific values; the config path itself is a CLI concern
            .merge(Env::prefixed("EXPENSE_OCR_").ignore(&["CONFIG"]).split("__"))
            // Conventional provider credential and port variables
            .merge(Env::raw().only(&["PORT"]))
            .merge(
                Env::raw()
                    .only(&["GOOGLE_CLOUD_VISION_API_KEY"])
                    .map(|_| "vision.api_key".into()),
            )
            .merge(Env::raw().only(&["OPENAI_API_KEY"]).map(|_| "openai.api_key".into()))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
