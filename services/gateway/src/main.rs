//! DNS-intelligence gateway
//!
//! Single-binary service that owns the credential pool:
//! 1. Keeps a pool of provider accounts stocked with request budget
//! 2. Dispatches fabrication requests to the account worker
//! 3. Receives fabrication responses on a webhook and feeds them to the pool
//! 4. Exposes pool health and Prometheus metrics

mod config;
mod metrics;
mod producer;
mod provider;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use metrics_exporter_prometheus::PrometheusHandle;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use account_pool::{AccountPool, run_consumer};
use account_store::{MemoryAccountStore, MemoryPendingStore};

use crate::config::Config;
use crate::producer::HttpProducer;
use crate::provider::UsageClient;

/// Shared application state accessible from all handlers
#[derive(Clone)]
struct AppState {
    pool: Arc<AccountPool>,
    inbound: mpsc::Sender<Vec<u8>>,
    prometheus: PrometheusHandle,
}

/// Build the axum router with all routes and shared state.
fn build_router(state: AppState, max_connections: usize) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route("/fabrication/response", post(fabrication_response_handler))
        .layer(tower::limit::ConcurrencyLimitLayer::new(max_connections))
        .with_state(state)
}

async fn health_handler(State(state): State<AppState>) -> Response {
    axum::Json(state.pool.health().await).into_response()
}

async fn metrics_handler(State(state): State<AppState>) -> String {
    state.prometheus.render()
}

/// Inbound half of the fabrication channel, realized as a worker webhook.
///
/// Acknowledges every delivery: the consume loop validates the body and
/// drops bad messages with a warning, exactly as a broker consumer would.
async fn fabrication_response_handler(
    State(state): State<AppState>,
    body: axum::body::Bytes,
) -> StatusCode {
    if state.inbound.send(body.to_vec()).await.is_err() {
        warn!("fabrication channel closed, dropping response");
        metrics::record_webhook("dropped");
        return StatusCode::SERVICE_UNAVAILABLE;
    }
    metrics::record_webhook("accepted");
    StatusCode::NO_CONTENT
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing with JSON output and LOG_LEVEL / RUST_LOG support
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("starting dns-gateway");

    // Install the Prometheus recorder before any metrics are emitted
    let prometheus = metrics::install_recorder();

    let config = Config::from_env().context("failed to load configuration from environment")?;
    info!(
        listen_addr = %config.listen_addr,
        worker_url = %config.worker_url,
        requests_capacity = config.pool.requests_capacity,
        max_pending_requests = config.pool.max_pending_requests,
        "configuration loaded"
    );

    let http = reqwest::Client::new();
    let store = Arc::new(MemoryAccountStore::new());
    let pending = Arc::new(MemoryPendingStore::new());
    let producer = Arc::new(HttpProducer::new(config.worker_url.clone(), http.clone()));
    let verifier = Arc::new(UsageClient::new(config.provider_base_url.clone(), http));

    let pool = Arc::new(AccountPool::new(
        config.pool.clone(),
        store,
        pending,
        producer,
        verifier,
    ));
    pool.initialize().await;

    // Webhook deliveries flow through an in-process channel into the consume
    // loop, the same shape a broker consumer would have.
    let (inbound_tx, inbound_rx) = mpsc::channel::<Vec<u8>>(64);
    let consumer = tokio::spawn(run_consumer(pool.clone(), inbound_rx));

    let state = AppState {
        pool: pool.clone(),
        inbound: inbound_tx,
        prometheus,
    };
    let router = build_router(state, config.max_connections);

    let listener = TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("failed to bind {}", config.listen_addr))?;
    info!(addr = %config.listen_addr, "listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("shutting down");
    pool.shutdown().await;
    let _ = consumer.await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        warn!(%error, "failed to listen for shutdown signal");
    }
}
