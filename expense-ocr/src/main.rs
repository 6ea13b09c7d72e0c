use clap::Parser;
use expense_ocr::{Application, Config, telemetry};

/// Resolves on Ctrl+C or SIGTERM. The server then stops accepting uploads and lets running
/// extractions finish their provider calls.
async fn shutdown_signal() {
    use tokio::signal;

    let interrupt = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::warn!("Ctrl+C handler unavailable: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!("SIGTERM handler unavailable: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        _ = interrupt => "Ctrl+C",
        _ = terminate => "SIGTERM",
    };
    tracing::info!(signal = received, "Shutdown requested, draining in-flight extractions");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Must happen before the provider HTTP client is built
    rustls::crypto::aws_lc_rs::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))?;

    let args = expense_ocr::config::Args::parse();

    // Fails fast on missing provider credentials
    let config = Config::load(&args)?;

    if args.validate {
        println!("Configuration is valid.");
        return Ok(());
    }

    telemetry::init_telemetry(config.enable_otel_export)?;

    tracing::debug!("{:?}", args);
    tracing::debug!("{:?}", config);

    let shutdown = shutdown_signal();
    Application::new(config)?.serve(shutdown).await
}
