//! combatd - server-authoritative combat daemon
//!
//! Clients report fire events and movement over WebSocket; the server
//! validates everything, computes damage, and owns all health/status
//! state. Clients are never trusted with stats or outcomes.

pub mod api;
pub mod combat;
pub mod config;
pub mod movement;
pub mod weapons;

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::Result;
use tokio::net::TcpListener;
use tokio::sync::watch;
use tracing::info;

use api::AppState;
use config::CombatConfig;

/// Heartbeat period driving regen and the bleeding tick
const TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub combat: CombatConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".parse().unwrap(),
            combat: CombatConfig::default(),
        }
    }
}

/// The combatd server instance
pub struct Server {
    config: Config,
    state: AppState,
    shutdown_tx: watch::Sender<bool>,
    shutdown_rx: watch::Receiver<bool>,
}

impl Server {
    /// Create a new server instance
    pub fn new(config: Config) -> Result<Self> {
        let state = AppState::new(config.combat.clone())?;
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Ok(Self {
            config,
            state,
            shutdown_tx,
            shutdown_rx,
        })
    }

    /// Get a handle to the shared application state
    pub fn state(&self) -> AppState {
        self.state.clone()
    }

    /// Run the server until shutdown
    pub async fn run(&self) -> Result<()> {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        let local_addr = listener.local_addr()?;
        info!("combatd listening on {}", local_addr);

        self.spawn_heartbeat();

        let router = api::router(self.state.clone());
        let mut shutdown_rx = self.shutdown_rx.clone();

        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_rx.changed().await.ok();
            })
            .await?;

        info!("combatd shutdown complete");
        Ok(())
    }

    /// Spawn the simulation heartbeat task. Delta time comes from the
    /// clock, not the nominal interval, so regen and bleeding stay honest
    /// under scheduler lag.
    fn spawn_heartbeat(&self) {
        let state = self.state.clone();
        let mut shutdown_rx = self.shutdown_rx.clone();

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK_INTERVAL);
            let mut last = Instant::now();
            loop {
                tokio::select! {
                    _ = interval.tick() => {
                        let now = Instant::now();
                        let dt = now.duration_since(last).as_secs_f32();
                        last = now;
                        let events = state.authority.write().await.tick(dt, now);
                        state.connections.dispatch(events).await;
                    }
                    _ = shutdown_rx.changed() => break,
                }
            }
        });
    }

    /// Signal the server to shutdown
    pub fn shutdown(&self) {
        let _ = self.shutdown_tx.send(true);
    }

    /// Get the configured bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
