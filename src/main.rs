//! Transaction Fraud Scoring API
//!
//! Mock blockchain transaction log plus a fraud scoring endpoint.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     FRAUD SCORING API                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌───────────┐   ┌───────────┐   ┌───────────────────────┐ │
//! │  │  API      │──▶│  Feature  │──▶│  Fraud Scorer         │ │
//! │  │  (Axum)   │   │  Deriver  │   │  threshold | model    │ │
//! │  └─────┬─────┘   └───────────┘   └───────────────────────┘ │
//! │        ▼                                                    │
//! │  ┌──────────────────────────┐                              │
//! │  │  Transaction Store       │                              │
//! │  │  memory | PostgreSQL     │                              │
//! │  └──────────────────────────┘                              │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod features;
mod handlers;
mod models;
mod scoring;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{CorsLayer, Any},
    trace::TraceLayer,
    compression::CompressionLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

pub use error::{AppError, AppResult};

use scoring::FraudScorer;
use store::TransactionStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenvy::dotenv().ok();
    let config = config::Config::from_env()
        .map_err(anyhow::Error::msg)
        .context("Invalid configuration")?;

    // Initialize logging
    init_tracing(&config.log_format);

    tracing::info!("Fraud Scoring API starting...");

    // Acquire artifacts before serving; failure aborts startup
    let scorer = scoring::build(&config).context("Failed to initialize fraud scorer")?;

    let store = store::build(&config)
        .await
        .context("Failed to initialize transaction store")?;

    // Build application state
    let state = AppState {
        store,
        scorer,
        config: config.clone(),
    };

    // Build router
    let app = create_router(state);

    // Start server
    let ip = config
        .host
        .parse::<std::net::IpAddr>()
        .with_context(|| format!("Invalid HOST '{}'", config.host))?;
    let addr = SocketAddr::new(ip, config.port);
    tracing::info!("🚀 Server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server has been shut down gracefully");
    Ok(())
}

fn init_tracing(format: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "fraud_api=debug,tower_http=debug".into());
    let registry = tracing_subscriber::registry().with(filter);

    if format.eq_ignore_ascii_case("json") {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Received shutdown signal, initiating graceful shutdown");
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn TransactionStore>,
    pub scorer: Arc<dyn FraudScorer>,
    pub config: config::Config,
}

/// Create the main router with all routes
fn create_router(state: AppState) -> Router {
    if state.config.is_production() {
        tracing::warn!("CORS allows any origin");
    }

    Router::new()
        .route("/health", get(handlers::health::check))
        .route("/api/transactions", get(handlers::transactions::list))
        .route("/api/predict", post(handlers::predict::predict))
        .fallback(not_found)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any)
        )
        .with_state(state)
}

async fn not_found() -> AppError {
    AppError::NotFound("Not found".to_string())
}
