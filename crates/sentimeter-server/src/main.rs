//! Sentimeter Server
//!
//! Batch sentiment prediction over HTTP. Loads the classifier once at
//! start-up and serves `POST /predict` until SIGINT or SIGTERM.

use anyhow::Result;
use clap::Parser;
use metrics_exporter_prometheus::PrometheusHandle;
use sentimeter_classifiers::load_classifier;
use sentimeter_server::{create_router, AppState, Cli, ServiceConfig};
use tokio::signal;
use tracing::{error, info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.verbose, cli.log_json);

    info!("Starting Sentimeter server");

    let config = ServiceConfig::load(&cli.config, &cli)?;
    info!("Configuration loaded successfully");
    info!("Backend: {}", config.classifier.backend);
    info!("Model path: {}", config.classifier.model_path.display());
    info!("Device: {}", config.classifier.device);
    info!("Max batch size: {}", config.limits.max_batch_size);

    let metrics_handle = init_metrics()?;

    info!("Loading classifier...");
    let classifier = load_classifier(&config.classifier)
        .map_err(|e| anyhow::anyhow!("Failed to load classifier: {}", e))?;
    info!("Classifier '{}' ready", classifier.name());

    let addr = config.server.socket_addr()?;
    let state = AppState::new(classifier, config).with_metrics(metrics_handle);
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Listening on http://{}", addr);

    let shutdown = async {
        shutdown_signal().await;
        warn!("Shutdown signal received, stopping server...");
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

/// Listen for shutdown signals (SIGTERM, SIGINT)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
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
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Initialize tracing/logging
fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("sentimeter=debug,tower_http=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("sentimeter=info"))
    };

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}

/// Initialize metrics exporter and return handle for rendering
fn init_metrics() -> Result<PrometheusHandle> {
    use metrics_exporter_prometheus::PrometheusBuilder;

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| anyhow::anyhow!("Failed to install metrics: {}", e))?;

    metrics::describe_counter!(
        "sentimeter_requests_total",
        "Total number of prediction requests received"
    );
    metrics::describe_counter!(
        "sentimeter_items_total",
        "Total number of texts classified by outcome"
    );
    metrics::describe_histogram!(
        "sentimeter_batch_latency_us",
        metrics::Unit::Microseconds,
        "Batch classification latency in microseconds"
    );
    metrics::describe_counter!("sentimeter_errors_total", "Total number of request errors by kind");

    info!("Metrics exporter initialized");
    Ok(handle)
}
