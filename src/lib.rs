//! Doorbell trigger: a small web endpoint that plays a chime on a local
//! speaker.
//!
//! - `POST /ding` checks the IP block list and the global cooldown, then runs
//!   the chime script under a timeout.
//! - A background task plays a quiet tone on an interval so the speaker does
//!   not fall asleep.
//! - `/admin/logs` is a password gated console showing the event log tail and
//!   the active IP blocks.
//!
//! All playback is serialized through one audio device lock.
use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Router,
    http::{HeaderValue, Method},
    routing::{get, post},
};
use tokio::{
    net::TcpListener,
    signal::{self, ctrl_c},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

pub mod api;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod repositories;
pub mod services;
pub mod state;

use config::Config;
use infrastructure::file_logger::FileLogger;
use repositories::log_repository::FileLogRepository;
use services::audio::PlayerCommand;
use services::keepalive::Keepalive;
use state::AppState;

pub fn build_router(state: AppState) -> Router {
    let cors = cors_layer(&state.config.allowed_origins);

    Router::new()
        .route("/", get(api::ding::index))
        .route("/ding", post(api::ding::ding))
        .route("/health", get(api::health::health_check))
        .route(
            api::admin::LOGS_PATH,
            get(api::admin::logs_page).post(api::admin::logs_submit),
        )
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    if allowed_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    info!("Configuring CORS for origins: {:?}", allowed_origins);

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(tower_http::cors::Any)
}

pub fn spawn_keepalive(state: &AppState) {
    let config = &state.config;
    if config.keepalive_interval.is_zero() {
        info!("Keepalive disabled");
        return;
    }

    let Some(player) = PlayerCommand::parse(&config.keepalive_player) else {
        warn!("KEEPALIVE_PLAYER is empty, keepalive disabled");
        return;
    };

    info!(
        "Keepalive every {:?} via {}",
        config.keepalive_interval, config.keepalive_player
    );

    Keepalive {
        wav_path: config.keepalive_wav.clone(),
        player,
        interval: config.keepalive_interval,
        audio: state.audio.clone(),
        logger: state.logger.clone(),
    }
    .spawn();
}

pub async fn start_server() -> anyhow::Result<()> {
    info!("Loading config...");
    let config = Config::load();

    let logger = Arc::new(
        FileLogger::new(&config.log_path)
            .with_context(|| format!("Unable to open log file {}", config.log_path.display()))?,
    );
    let log_repo = Arc::new(FileLogRepository::new(config.log_path.clone()));
    let port = config.port;

    let state = AppState::new(config, logger, log_repo);
    spawn_keepalive(&state);

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Unable to bind {addr}"))?;
    info!("Server running on {addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server shutting down...");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
                info!("Received terminate signal, shutting down");
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
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
