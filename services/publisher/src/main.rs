use anyhow::{Context, Result};
use shots_publisher::api::{start_api_server, AppState};
use shots_publisher::{
    Backend, Config, InMemoryIndex, InMemoryStorage, MatchesIndexRepository, PgMatchesIndex,
    S3ShotsStorage, ShotsPublisher, ShotsStorage,
};
use std::sync::Arc;
use tokio::signal;
use tracing::{info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;

    // Initialize logging
    init_tracing(&config.service.log_level);

    info!(
        service = %config.service.name,
        backend = ?config.publisher.backend,
        "Starting shots publisher"
    );

    init_metrics(config.service.metrics_port)?;

    let (storage, index) = build_backends(&config).await?;

    let publisher = ShotsPublisher::from_config(&config.publisher, storage, index.clone());

    info!(
        bucket = publisher.bucket(),
        max_attempts = publisher.max_attempts(),
        "Publisher ready"
    );

    let state = AppState {
        publisher: Arc::new(publisher),
        index,
        service_name: config.service.name.clone(),
    };

    start_api_server(state, &config.api, shutdown_signal()).await?;

    info!("Shots publisher stopped");

    Ok(())
}

/// Wire the storage and index adapters selected by configuration
async fn build_backends(
    config: &Config,
) -> Result<(Arc<dyn ShotsStorage>, Arc<dyn MatchesIndexRepository>)> {
    match config.publisher.backend {
        Backend::Supabase => {
            let index = PgMatchesIndex::new(&config.database)
                .await
                .context("Failed to initialize matches index")?;

            if config.database.run_migrations {
                index
                    .run_migrations()
                    .await
                    .context("Failed to run database migrations")?;
            }

            let storage = S3ShotsStorage::new(&config.storage)
                .await
                .context("Failed to initialize S3 storage")?;

            let storage: Arc<dyn ShotsStorage> = Arc::new(storage);
            let index: Arc<dyn MatchesIndexRepository> = Arc::new(index);
            Ok((storage, index))
        }
        Backend::Memory => {
            warn!("Memory backend selected; published files are not persisted");
            let storage: Arc<dyn ShotsStorage> = Arc::new(InMemoryStorage::new());
            let index: Arc<dyn MatchesIndexRepository> = Arc::new(InMemoryIndex::new());
            Ok((storage, index))
        }
    }
}

/// Initialize tracing/logging
fn init_tracing(log_level: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().json())
        .init();
}

/// Initialize Prometheus metrics exporter
fn init_metrics(port: u16) -> Result<()> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(([0, 0, 0, 0], port))
        .install()
        .context("Failed to install Prometheus metrics exporter")?;

    info!(port = port, "Prometheus metrics exporter started");

    Ok(())
}

/// Wait for shutdown signal (SIGINT or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received SIGTERM signal");
        }
    }
}
