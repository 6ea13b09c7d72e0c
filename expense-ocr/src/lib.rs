//! # expense-ocr: receipt and invoice extraction service
//!
//! `expense-ocr` is a small HTTP service that turns a photographed receipt or invoice into a
//! structured expense record. A client uploads an image to `POST /api/ocr`; the service runs it
//! through an OCR provider (Google Cloud Vision `TEXT_DETECTION`), hands the recognised text to a
//! language model (an OpenAI-compatible chat completions endpoint) with an instruction to extract
//! expense data, and returns whatever JSON object the model produced merged into a
//! `{"success": true, ...}` envelope.
//!
//! ## Request Flow
//!
//! 1. The handler ([`api::handlers::ocr`]) reads the first `file` part of the multipart body.
//! 2. The [`pipeline::ExpenseExtractor`] base64-encodes the image and calls the OCR provider
//!    ([`providers::VisionClient`]).
//! 3. The recognised text is embedded in a single system instruction and sent to the language
//!    model ([`providers::ChatClient`]).
//! 4. The reply is parsed into an [`api::models::expense::ExpenseRecord`] and wrapped in an
//!    [`api::models::envelope::ApiEnvelope`].
//!
//! Every failure becomes an [`errors::Error`], which renders itself as a
//! `{"success": false, "error": ...}` envelope. Provider details are logged, never returned.
//!
//! The service is stateless: nothing is stored, cached or retried, and concurrent requests share
//! only the read-only [`AppState`].
//!
//! ## Configuration
//!
//! See [`config`]. Provider credentials come from `GOOGLE_CLOUD_VISION_API_KEY` and
//! `OPENAI_API_KEY`; everything else has a default.
//!
//! ## Other endpoints
//!
//! - `GET /healthz`: liveness probe
//! - `GET /api-docs/openapi.json` and `GET /docs`: API documentation
//! - `GET /internal/metrics`: Prometheus metrics, when `enable_metrics` is set

pub mod api;
pub mod config;
pub mod errors;
pub mod metrics;
mod openapi;
pub mod pipeline;
pub mod providers;
pub mod telemetry;

#[cfg(test)]
mod test;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::sync::Arc;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_prometheus::PrometheusMetricLayer;
use bon::Builder;
pub use config::Config;
use tokio::net::TcpListener;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::{Level, debug, info};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::openapi::ApiDoc;
use crate::pipeline::ExpenseExtractor;

/// Application state shared across all request handlers.
///
/// Built once at startup and read-only afterwards.
///
/// ```ignore
/// let state = AppState::builder()
///     .config(config)
///     .extractor(Arc::new(extractor))
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState {
    pub config: Config,
    pub extractor: Arc<ExpenseExtractor>,
}

/// Build the main application router.
///
/// - `POST /api/ocr` with the configured upload limit
/// - `/healthz`, the OpenAPI document and Scalar docs
/// - Prometheus metrics at `/internal/metrics` when enabled
/// - Request tracing on every route
pub fn build_router(state: &AppState) -> Router {
    let body_limit = match state.config.limits.max_upload_bytes {
        Some(limit) => DefaultBodyLimit::max(limit),
        None => DefaultBodyLimit::disable(),
    };

    let api_routes = Router::new()
        .route("/api/ocr", post(api::handlers::ocr::extract_expense))
        .layer(body_limit)
        .with_state(state.clone());

    let mut router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(api_routes)
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    if state.config.enable_metrics {
        let (prometheus_layer, metric_handle) = PrometheusMetricLayer::pair();

        router = router
            .route("/internal/metrics", get(|| async move { metric_handle.render() }))
            .layer(prometheus_layer);
    }

    router.layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

pub struct Application {
    router: Router,
    config: Config,
}

impl Application {
    /// Create the provider clients and the router.
    ///
    /// Makes no network calls; unreachable providers only show up when a request is served.
    pub fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting expense-ocr with configuration: {:#?}", config);

        let http = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let extractor = ExpenseExtractor::from_config(http, &config);

        let app_state = AppState::builder().config(config.clone()).extractor(Arc::new(extractor)).build();
        let router = build_router(&app_state);

        Ok(Self { router, config })
    }

    /// Convert application into a test server (for tests)
    #[cfg(any(test, feature = "test-utils"))]
    pub fn into_test_server(self) -> axum_test::TestServer {
        axum_test::TestServer::new(self.router).expect("Failed to create test server")
    }

    /// Serve until `shutdown` resolves, then let in-flight requests finish.
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "expense-ocr listening on http://{}, available at http://localhost:{}",
            bind_addr,
            listener.local_addr().map(|a| a.port()).unwrap_or(self.config.port)
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}
