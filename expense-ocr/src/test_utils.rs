//! Test utilities for integration testing (available with `test-utils` feature).
//!
//! Provider calls are pointed at [`wiremock`] servers; the HTTP surface is exercised through
//! [`axum_test::TestServer`].

use crate::config::{Config, OpenAiConfig, VisionConfig};
use axum_test::TestServer;
use axum_test::multipart::{MultipartForm, Part};
use serde_json::json;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TEST_VISION_KEY: &str = "test-vision-key";
pub const TEST_OPENAI_KEY: &str = "sk-test-openai-key";

/// Configuration whose providers point at the given mock servers.
///
/// The language model base URL gets a `/v1` suffix so mocks match the real `/v1/chat/completions`
/// path.
pub fn create_test_config(vision_uri: &str, openai_uri: &str) -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        vision: VisionConfig {
            url: vision_uri.parse().expect("mock server URI is a valid URL"),
            api_key: Some(TEST_VISION_KEY.to_string()),
        },
        openai: OpenAiConfig {
            url: format!("{}/v1", openai_uri.trim_end_matches('/'))
                .parse()
                .expect("mock server URI is a valid URL"),
            api_key: Some(TEST_OPENAI_KEY.to_string()),
            model: "gpt-4".to_string(),
        },
        ..Default::default()
    }
}

/// Build the application router for `config` and wrap it in a test server.
pub fn create_test_app(config: Config) -> TestServer {
    crate::Application::new(config)
        .expect("Failed to create application")
        .into_test_server()
}

/// Mount a Vision `images:annotate` mock that reports `text` as the full-text annotation.
/// `None` mounts a result with no annotation at all.
pub async fn mount_ocr_text(server: &MockServer, text: Option<&str>) {
    let result = match text {
        Some(text) => json!({ "fullTextAnnotation": { "text": text } }),
        None => json!({}),
    };

    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "responses": [result] })))
        .mount(server)
        .await;
}

/// Mount a chat completions mock whose first choice carries `content`.
/// `None` mounts a response with a null message content.
pub async fn mount_completion(server: &MockServer, content: Option<&str>) {
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": "chatcmpl-test",
            "object": "chat.completion",
            "model": "gpt-4",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": content },
                "finish_reason": "stop"
            }]
        })))
        .mount(server)
        .await;
}

/// A multipart form carrying a small fake image under the `file` field.
pub fn receipt_form() -> MultipartForm {
    MultipartForm::new().add_part(
        "file",
        Part::bytes(b"\xFF\xD8\xFF\xE0fake-receipt".to_vec())
            .file_name("receipt.jpg")
            .mime_type("image/jpeg"),
    )
}
