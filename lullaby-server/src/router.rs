use crate::config::RelayConfig;
use crate::room::{RegistryStats, SessionRelay};
use crate::signaling::{SignalingService, ws_handler};
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct RelayStats {
    #[serde(flatten)]
    pub registry: RegistryStats,
    pub connections: usize,
}

/// Spawns the session relay and wires the signaling service to it.
pub fn start_relay(config: &RelayConfig) -> SignalingService {
    SessionRelay::spawn_with(config, |relay| {
        let service = SignalingService::new(relay);
        (service.clone(), Arc::new(service))
    })
}

pub fn router(service: SignalingService) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(|| async { "Lullaby relay is running" }))
        .route("/stats", get(stats_handler))
        .route("/ws", get(ws_handler))
        .layer(cors)
        .with_state(service)
}

async fn stats_handler(
    State(service): State<SignalingService>,
) -> Result<Json<RelayStats>, StatusCode> {
    let registry = service
        .relay()
        .stats()
        .await
        .map_err(|_| StatusCode::SERVICE_UNAVAILABLE)?;

    Ok(Json(RelayStats {
        registry,
        connections: service.connection_count(),
    }))
}

/// Binds the configured address and serves until the listener fails.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let service = start_relay(&config);
    let app = router(service);

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    info!("Signaling relay listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app).await?;
    Ok(())
}
