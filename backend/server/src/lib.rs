//! Feedback ingestion service.
//!
//!
//!
//! # General Infrastructure
//! - Frontends POST feedback as json, the interesting part is a json string inside the `feedback` field
//! - Server extracts `additionalInformation`, rejects empty ones and skips duplicates of the latest record
//! - Feedback is appended to Redis
//! - Qualifying feedback is queued for a human channel (Discord webhook or a Redis topic read by a bot)
//! - Metrics are exported for Prometheus on a separate port
//!
//!
//!
//! # Request Lifecycle
//!
//! `Received → Extracted → DupChecked → Persisted → [NotifyAttempted | NotifySkipped] → Done`
//!
//! - Parsing, the duplicate check and the write happen inside the request, errors fail the request
//! - Notification runs on a worker behind a bounded queue, the request never waits for it
//! - Notification failures are logged and counted, never returned to the client
//!
//!
//!
//! # Routes
//!
//! | method | path | notes |
//! |--------|------|-------|
//! | GET | `/health` | `ok` |
//! | POST | `/api` | store and notify |
//! | POST | `/api/songvoter-feedback` | store only |
//! | POST | `/api/pro-skyblock-feedback` | store only |
//!
//! Success and duplicates answer `204 No Content`. Unparseable payloads and empty
//! `additionalInformation` answer `400`, storage failures `500`.
//!
//!
//!
//! # Setup
//!
//! Run against a local Redis.
//! ```sh
//! REDIS_URL=redis://127.0.0.1:6379 WEBHOOK_URL=https://discord.com/api/webhooks/... cargo run -p feedback
//! ```
//!
//! Without a usable `WEBHOOK_URL` the server still starts, notifications are only logged.
//!
//! Run without any external service.
//! ```sh
//! STORAGE_BACKEND=memory NOTIFY_BACKEND=log cargo run -p feedback
//! ```
//!
//! Send a test feedback.
//! ```sh
//! cargo run -p tester -- "The button broke completely" --other-issue
//! ```
use std::{net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Error};
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use metrics_exporter_prometheus::PrometheusBuilder;
use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::{
    cors::{AllowHeaders, AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod database;
pub mod error;
pub mod routes;
pub mod state;
pub mod utils;

use config::Config;
use routes::{feedback_handler, health_handler, silent_feedback_handler};
use state::State;

pub async fn start_server() -> Result<(), Error> {
    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Loading config...");
    let config = Config::load()?;

    info!("Starting metrics...");
    let metrics_address = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));
    PrometheusBuilder::new()
        .with_http_listener(metrics_address)
        .install()
        .context("could not start metrics exporter")?;

    info!("Initializing state...");
    let state = State::new(config).await?;

    info!("Starting server...");
    let app = build_router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("could not bind {address}"))?;
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server stopped unexpectedly")?;

    info!("Server shutting down, draining notifications...");
    state.dispatcher.shutdown(state.config.notify_drain).await;

    Ok(())
}

pub fn build_router(state: Arc<State>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api", post(feedback_handler))
        .route("/api/songvoter-feedback", post(silent_feedback_handler))
        .route("/api/pro-skyblock-feedback", post(silent_feedback_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors(&state.config.allowed_origins))
        .with_state(state)
}

fn cors(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            HeaderValue::from_str(origin)
                .map_err(|e| warn!("Ignoring invalid origin {origin}: {e}"))
                .ok()
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::HEAD,
            Method::PUT,
            Method::DELETE,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(false)
        .max_age(Duration::from_secs(60 * 60))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
