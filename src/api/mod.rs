//! HTTP API module - health endpoint and WebSocket transport

mod websocket;

use std::sync::Arc;

use anyhow::Result;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tokio::sync::RwLock;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::combat::CombatAuthority;
use crate::config::CombatConfig;
use crate::weapons::WeaponTable;
pub use websocket::{ClientMessage, CombatantSession, ConnectionManager, ServerMessage};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<CombatConfig>,
    pub authority: Arc<RwLock<CombatAuthority>>,
    pub connections: Arc<ConnectionManager>,
}

impl AppState {
    /// Build state from a loaded configuration
    pub fn new(config: CombatConfig) -> Result<Self> {
        let weapons = WeaponTable::from_profiles(&config.weapons)?;
        let config = Arc::new(config);
        Ok(Self {
            authority: Arc::new(RwLock::new(CombatAuthority::new(config.clone(), weapons))),
            connections: Arc::new(ConnectionManager::new()),
            config,
        })
    }
}

/// Build the API router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ws", get(websocket::ws_handler))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    combatants: usize,
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let combatants = state.authority.read().await.combatant_count();
    Json(HealthResponse {
        status: "ok",
        combatants,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_app_state_builds_from_defaults() {
        let state = AppState::new(CombatConfig::default()).unwrap();
        assert_eq!(state.authority.read().await.combatant_count(), 0);
    }

    #[test]
    fn test_app_state_rejects_bad_weapon_id() {
        let mut config = CombatConfig::default();
        config.weapons[0].name = "not a valid id".to_string();
        assert!(AppState::new(config).is_err());
    }
}
