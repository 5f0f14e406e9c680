use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boiler::api::{create_router, AppStateInner};
use boiler::background::{start_workers, JobQueue};
use boiler::config::Config;
use boiler::graphql::create_schema;
use boiler::service::{Service, ServiceApi};
use boiler::{db, errors, metrics};

/// Wait for shutdown signal (SIGTERM or SIGINT)
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
            Ok(mut stream) => {
                stream.recv().await;
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
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        },
        _ = terminate => {
            info!("Received SIGTERM signal");
        },
    }

    info!("Starting graceful shutdown...");
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,boiler=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    errors::stack::install_panic_hook();
    errors::codes::init_well_known();

    info!("Starting boiler v{}", env!("CARGO_PKG_VERSION"));

    // Initialize metrics
    metrics::registry::init_metrics();
    info!("Metrics registry initialized");

    // Load configuration
    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Configuration loaded successfully");

    // Initialize database backend
    let store = db::init_database(&config.database).context("Failed to initialize database")?;
    store
        .test_connection()
        .await
        .context("Failed to test database connection")?;
    info!("Database connection established");

    // Service and background workers share the job queue
    let (queue, jobs) = JobQueue::new(config.worker.queue_capacity);
    let service: Arc<dyn ServiceApi> =
        Arc::new(Service::new(store.clone(), config.jwt.clone(), queue));
    let workers = start_workers(service.clone(), &config.worker, jobs);

    let graphql_schema = create_schema(service.clone());

    let state = Arc::new(AppStateInner {
        service,
        store,
        graphql_schema,
        jwt: config.jwt.clone(),
    });

    let app = create_router(state, config.request_timeout());

    // Start server
    let addr = config.server_address();
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind server")?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Draining background jobs...");
    workers.shutdown().await;

    info!("Server shutdown complete");

    Ok(())
}
