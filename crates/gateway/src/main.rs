//! Notarium API Gateway
//!
//! HTTP entry point for receipt operations.
//! Handles:
//! - Database bootstrap before serving
//! - Request context derivation
//! - Receipt routing
//! - Observability (logging, metrics)

mod extract;
mod handlers;
mod middleware;

use axum::{
    routing::get,
    Router,
};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder};
use notarium_common::{
    config::{AppConfig, ObservabilityConfig},
    db,
    metrics::{self, LATENCY_BUCKETS},
    ExecutionContext,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,

    /// Base context holding the shared database handle
    pub ctx: ExecutionContext,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    // Load configuration
    let config = AppConfig::load()?;
    let config = Arc::new(config);

    init_tracing(&config.observability);

    info!("Starting Notarium API Gateway v{}", notarium_common::VERSION);

    // Initialize metrics
    init_metrics(&config.observability)?;

    // Connect, retrying while the database comes up, and reconcile the schema
    let pool = db::bootstrap(&config.database).await.map_err(|e| {
        tracing::error!(error = %e, "Database bootstrap failed");
        e
    })?;

    let state = AppState {
        config: config.clone(),
        ctx: ExecutionContext::new().with_db(pool),
    };

    // Build the router
    let app = create_router(state);

    // Start the server
    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;
    info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    let (stop_tx, mut stop_rx) = tokio::sync::watch::channel(false);
    let mut server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = stop_rx.changed().await;
            })
            .await
    });

    tokio::select! {
        served = &mut server => {
            served??;
            return Ok(());
        }
        _ = shutdown_signal() => {}
    }

    // In-flight requests get shutdown_timeout to drain
    let _ = stop_tx.send(true);
    match tokio::time::timeout(config.shutdown_timeout(), server).await {
        Ok(served) => served??,
        Err(_) => warn!(
            timeout_secs = config.server.shutdown_timeout_secs,
            "Graceful shutdown timed out, dropping open connections"
        ),
    }

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true);

    if config.json_logging {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn init_metrics(config: &ObservabilityConfig) -> anyhow::Result<()> {
    metrics::register_metrics();

    if config.metrics_port == 0 {
        return Ok(());
    }

    PrometheusBuilder::new()
        .with_http_listener(SocketAddr::from(([0, 0, 0, 0], config.metrics_port)))
        .set_buckets_for_metric(
            Matcher::Suffix("duration_seconds".to_string()),
            LATENCY_BUCKETS,
        )?
        .install()?;

    info!(port = config.metrics_port, "Prometheus exporter listening");
    Ok(())
}

/// Create the main application router
fn create_router(state: AppState) -> Router {
    // CORS configuration
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Request ID propagation
    let request_id = SetRequestIdLayer::x_request_id(MakeRequestUuid);
    let propagate_id = PropagateRequestIdLayer::x_request_id();

    let timeout = TimeoutLayer::new(state.config.request_timeout());

    let api_routes = Router::new()
        // Health endpoints
        .route("/health", get(handlers::health::health))
        .route("/ready", get(handlers::health::ready))

        // Receipt endpoints
        .route(
            "/receipts",
            get(handlers::receipts::list_receipts).post(handlers::receipts::create_receipt),
        )
        .route(
            "/receipts/{hash}",
            get(handlers::receipts::get_receipt).delete(handlers::receipts::delete_receipts),
        )
        .route_layer(axum::middleware::from_fn(middleware::track_requests));

    // Compose the app
    Router::new()
        .nest("/v1", api_routes)
        .layer(timeout)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(propagate_id)
        .layer(request_id)
        .with_state(state)
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, starting shutdown..."),
        _ = terminate => info!("Received SIGTERM, starting shutdown..."),
    }
}
