//! End-to-end tests: the full router against mocked OCR and language model providers.

use axum::http::StatusCode;
use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use crate::test_utils::{
    TEST_OPENAI_KEY, TEST_VISION_KEY, create_test_app, create_test_config, mount_completion, mount_ocr_text, receipt_form,
};

/// Mount a mock that must never be hit.
async fn forbid_calls(server: &MockServer) {
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(server)
        .await;
}

/// End-to-end: receipt image → OCR text → instruction → model reply → merged envelope
#[test_log::test(tokio::test)]
async fn test_e2e_extracts_expense_record() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .and(query_param("key", TEST_VISION_KEY))
        .and(body_partial_json(json!({
            "requests": [{ "features": [{ "type": "TEXT_DETECTION" }] }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{ "fullTextAnnotation": { "text": "Total: $42.00, Store: Acme" } }]
        })))
        .expect(1)
        .mount(&vision)
        .await;

    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(wiremock::matchers::header("authorization", format!("Bearer {TEST_OPENAI_KEY}").as_str()))
        .and(body_partial_json(json!({
            "model": "gpt-4",
            "messages": [{
                "role": "system",
                "content": "Extract structured expense data from the following OCR text: Total: $42.00, Store: Acme"
            }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "role": "assistant", "content": "{\"merchant\":\"Acme\",\"amount\":42.0}" } }]
        })))
        .expect(1)
        .mount(&openai)
        .await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let response = server.post("/api/ocr").multipart(receipt_form()).await;

    response.assert_status_ok();
    assert_eq!(response.text(), r#"{"success":true,"merchant":"Acme","amount":42.0}"#);
}

#[test_log::test(tokio::test)]
async fn test_no_file_is_client_error_without_provider_calls() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    forbid_calls(&vision).await;
    forbid_calls(&openai).await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let form = axum_test::multipart::MultipartForm::new().add_text("comment", "forgot the receipt");
    let response = server.post("/api/ocr").multipart(form).await;

    response.assert_status_bad_request();
    assert_eq!(response.text(), r#"{"success":false,"error":"No file uploaded"}"#);
}

#[test_log::test(tokio::test)]
async fn test_non_multipart_body_is_no_file() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    forbid_calls(&vision).await;
    forbid_calls(&openai).await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let response = server.post("/api/ocr").json(&json!({ "file": "receipt.jpg" })).await;

    response.assert_status_bad_request();
    response.assert_json(&json!({ "success": false, "error": "No file uploaded" }));
}

#[test_log::test(tokio::test)]
async fn test_ocr_provider_error_status_is_generic_failure() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .respond_with(ResponseTemplate::new(500).set_body_string("backend exploded"))
        .expect(1)
        .mount(&vision)
        .await;
    forbid_calls(&openai).await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let response = server.post("/api/ocr").multipart(receipt_form()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), r#"{"success":false,"error":"OCR processing failed"}"#);
}

#[test_log::test(tokio::test)]
async fn test_ocr_provider_unreachable_is_generic_failure() {
    let openai = MockServer::start().await;
    forbid_calls(&openai).await;

    // Nothing listens on port 1
    let server = create_test_app(create_test_config("http://127.0.0.1:1", &openai.uri()));
    let response = server.post("/api/ocr").multipart(receipt_form()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), r#"{"success":false,"error":"OCR processing failed"}"#);
}

#[test_log::test(tokio::test)]
async fn test_language_model_error_is_generic_failure() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_ocr_text(&vision, Some("TOTAL 12.50")).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error": { "message": "The server had an error while processing your request." }
        })))
        .expect(1)
        .mount(&openai)
        .await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let response = server.post("/api/ocr").multipart(receipt_form()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), r#"{"success":false,"error":"OCR processing failed"}"#);
}

#[test_log::test(tokio::test)]
async fn test_language_model_unreachable_is_generic_failure() {
    let vision = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/images:annotate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "responses": [{ "fullTextAnnotation": { "text": "TOTAL 12.50" } }]
        })))
        .expect(1)
        .mount(&vision)
        .await;

    // Nothing listens on port 1
    let server = create_test_app(create_test_config(&vision.uri(), "http://127.0.0.1:1"));
    let response = server.post("/api/ocr").multipart(receipt_form()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), r#"{"success":false,"error":"OCR processing failed"}"#);
}

#[test_log::test(tokio::test)]
async fn test_unparseable_reply_is_parse_failure() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_ocr_text(&vision, Some("TOTAL 12.50")).await;
    mount_completion(&openai, Some("not json")).await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let response = server.post("/api/ocr").multipart(receipt_form()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), r#"{"success":false,"error":"Failed to parse AI response."}"#);
}

#[test_log::test(tokio::test)]
async fn test_non_object_reply_is_rejected() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_ocr_text(&vision, Some("TOTAL 12.50")).await;
    mount_completion(&openai, Some("[1,2]")).await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let response = server.post("/api/ocr").multipart(receipt_form()).await;

    response.assert_status(StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.text(), r#"{"success":false,"error":"AI response is not a JSON object."}"#);
}

#[test_log::test(tokio::test)]
async fn test_no_text_and_empty_reply_is_bare_success() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_ocr_text(&vision, None).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_partial_json(json!({
            "messages": [{ "content": "Extract structured expense data from the following OCR text: " }]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "choices": [{ "message": { "content": "{}" } }]
        })))
        .expect(1)
        .mount(&openai)
        .await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let response = server.post("/api/ocr").multipart(receipt_form()).await;

    response.assert_status_ok();
    assert_eq!(response.text(), r#"{"success":true}"#);
}

#[test_log::test(tokio::test)]
async fn test_missing_choices_is_bare_success() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_ocr_text(&vision, Some("blurry")).await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": "chatcmpl-empty" })))
        .mount(&openai)
        .await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let response = server.post("/api/ocr").multipart(receipt_form()).await;

    response.assert_status_ok();
    assert_eq!(response.text(), r#"{"success":true}"#);
}

#[test_log::test(tokio::test)]
async fn test_identical_requests_yield_identical_bodies() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_ocr_text(&vision, Some("Coffee 3.20\nCroissant 2.80\nTOTAL 6.00")).await;
    mount_completion(
        &openai,
        Some(r#"{"merchant":"Bakery","items":[{"name":"Coffee","price":3.2},{"name":"Croissant","price":2.8}],"total":6.0}"#),
    )
    .await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let first = server.post("/api/ocr").multipart(receipt_form()).await;
    let second = server.post("/api/ocr").multipart(receipt_form()).await;

    first.assert_status_ok();
    second.assert_status_ok();
    assert_eq!(first.as_bytes(), second.as_bytes());

    let body: Value = first.json();
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["items"][1]["name"], json!("Croissant"));
}

#[test_log::test(tokio::test)]
async fn test_model_success_field_cannot_flip_outcome() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_ocr_text(&vision, Some("VOID")).await;
    mount_completion(&openai, Some(r#"{"success":false,"note":"void receipt"}"#)).await;

    let server = create_test_app(create_test_config(&vision.uri(), &openai.uri()));
    let response = server.post("/api/ocr").multipart(receipt_form()).await;

    response.assert_status_ok();
    assert_eq!(response.text(), r#"{"success":true,"note":"void receipt"}"#);
}

#[test_log::test(tokio::test)]
async fn test_healthz() {
    let server = create_test_app(create_test_config("http://127.0.0.1:1", "http://127.0.0.1:1"));
    let response = server.get("/healthz").await;
    response.assert_status_ok();
    response.assert_text("OK");
}

#[test_log::test(tokio::test)]
async fn test_openapi_and_docs_endpoints() {
    let server = create_test_app(create_test_config("http://127.0.0.1:1", "http://127.0.0.1:1"));

    let document = server.get("/api-docs/openapi.json").await;
    document.assert_status_ok();
    let document: Value = document.json();
    assert!(document["openapi"].is_string());
    assert!(document["paths"]["/api/ocr"]["post"].is_object());

    let docs = server.get("/docs").await;
    docs.assert_status_ok();
    assert!(docs.text().contains("/api-docs/openapi.json") || docs.text().contains("Expense OCR API"));
}

#[test_log::test(tokio::test)]
async fn test_metrics_endpoint_absent_by_default() {
    let server = create_test_app(create_test_config("http://127.0.0.1:1", "http://127.0.0.1:1"));
    let response = server.get("/internal/metrics").await;
    response.assert_status_not_found();
}

#[test_log::test(tokio::test)]
async fn test_metrics_endpoint_when_enabled() {
    let vision = MockServer::start().await;
    let openai = MockServer::start().await;
    mount_ocr_text(&vision, Some("TOTAL 1.00")).await;
    mount_completion(&openai, Some(r#"{"total":1.0}"#)).await;

    let mut config = create_test_config(&vision.uri(), &openai.uri());
    config.enable_metrics = true;
    let server = create_test_app(config);

    server.post("/api/ocr").multipart(receipt_form()).await.assert_status_ok();

    let response = server.get("/internal/metrics").await;
    response.assert_status_ok();
    let text = response.text();
    assert!(text.contains("expense_ocr_extractions_total"));
    assert!(text.contains(r#"outcome="success""#));
}
