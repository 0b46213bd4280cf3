//! WebSocket handler for real-time combatant connections

use std::collections::HashMap;
use std::time::Instant;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::{Deserialize, Serialize};
use tokio::sync::{mpsc, RwLock};
use tracing::{info, warn};

use super::AppState;
use crate::combat::{
    BodyPart, CombatEvent, DamageType, FireEvent, HitReport, StatusEffectKind,
};

/// A connected combatant session
#[derive(Debug)]
pub struct CombatantSession {
    pub combatant_id: String,
    pub sender: mpsc::Sender<ServerMessage>,
}

/// Connection manager for all active WebSocket connections
#[derive(Default)]
pub struct ConnectionManager {
    sessions: RwLock<HashMap<String, CombatantSession>>,
}

impl ConnectionManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new combatant session
    pub async fn register(&self, session: CombatantSession) {
        let combatant_id = session.combatant_id.clone();
        self.sessions.write().await.insert(combatant_id, session);
    }

    /// Remove a combatant session
    pub async fn unregister(&self, combatant_id: &str) {
        self.sessions.write().await.remove(combatant_id);
    }

    /// Send a message to a specific combatant
    pub async fn send_to(&self, combatant_id: &str, msg: ServerMessage) {
        let sender = self
            .sessions
            .read()
            .await
            .get(combatant_id)
            .map(|s| s.sender.clone());
        if let Some(sender) = sender {
            if sender.send(msg).await.is_err() {
                warn!("Failed to send message to combatant {}", combatant_id);
            }
        }
    }

    /// Broadcast a message to every connected combatant
    pub async fn broadcast(&self, msg: ServerMessage) {
        let sessions = self.sessions.read().await;
        for session in sessions.values() {
            if session.sender.send(msg.clone()).await.is_err() {
                warn!("Failed to broadcast to combatant {}", session.combatant_id);
            }
        }
    }

    /// Route a batch of authority records: addressed events go to the
    /// affected combatant, killfeed records go to everyone
    pub async fn dispatch(&self, events: Vec<CombatEvent>) {
        for event in events {
            match event.recipient().map(str::to_string) {
                Some(combatant_id) => self.send_to(&combatant_id, event.into()).await,
                None => self.broadcast(event.into()).await,
            }
        }
    }
}

/// Messages sent from server to client
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Welcome message on connect
    #[serde(rename = "welcome")]
    Welcome {
        combatant_id: String,
        health: i32,
        max_health: i32,
    },
    /// Health changed; negative delta is damage, positive is healing
    #[serde(rename = "health_update")]
    HealthUpdate {
        health: i32,
        max_health: i32,
        delta: i32,
        body_part: Option<BodyPart>,
    },
    /// A status value actually changed
    #[serde(rename = "status_effect")]
    StatusEffect {
        #[serde(flatten)]
        effect: StatusEffectKind,
    },
    /// Broadcast once per death transition
    #[serde(rename = "death")]
    Death {
        combatant: String,
        killer: Option<String>,
        damage_type: DamageType,
    },
    /// Killfeed record for an applied hit
    #[serde(rename = "hit_applied")]
    HitApplied {
        attacker: String,
        target: String,
        amount: i32,
        body_part: BodyPart,
        weapon: String,
        timestamp: DateTime<Utc>,
    },
    /// Killfeed record for a lethal hit
    #[serde(rename = "kill")]
    Kill {
        attacker: String,
        target: String,
        weapon: String,
        timestamp: DateTime<Utc>,
    },
}

impl From<CombatEvent> for ServerMessage {
    fn from(event: CombatEvent) -> Self {
        match event {
            CombatEvent::HealthUpdate {
                health,
                max_health,
                delta,
                body_part,
                ..
            } => ServerMessage::HealthUpdate {
                health,
                max_health,
                delta,
                body_part,
            },
            CombatEvent::StatusEffect { effect, .. } => ServerMessage::StatusEffect { effect },
            CombatEvent::Death {
                combatant,
                killer,
                damage_type,
            } => ServerMessage::Death {
                combatant,
                killer,
                damage_type,
            },
            CombatEvent::HitApplied {
                attacker,
                target,
                amount,
                body_part,
                weapon,
                timestamp,
            } => ServerMessage::HitApplied {
                attacker,
                target,
                amount,
                body_part,
                weapon,
                timestamp,
            },
            CombatEvent::Kill {
                attacker,
                target,
                weapon,
                timestamp,
            } => ServerMessage::Kill {
                attacker,
                target,
                weapon,
                timestamp,
            },
        }
    }
}

/// Messages sent from client to server
#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// One shot or pellet outcome
    #[serde(rename = "fire")]
    Fire {
        weapon: String,
        #[serde(default)]
        hit: Option<HitReport>,
    },
    /// Periodic movement report
    #[serde(rename = "position")]
    Position {
        position: Vec3,
        /// Client clock; plausibility uses server arrival time instead
        timestamp: f64,
    },
    /// Request a respawn after death
    #[serde(rename = "respawn")]
    Respawn,
    /// Ping to keep connection alive
    #[serde(rename = "ping")]
    Ping,
}

/// Handle WebSocket upgrade
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Handle an individual WebSocket connection
async fn handle_socket(mut socket: WebSocket, state: AppState) {
    // Create message channel for this connection
    let (tx, mut rx) = mpsc::channel::<ServerMessage>(32);

    // Mint a session-scoped combatant id (would normally come from auth)
    let combatant_id = uuid::Uuid::new_v4().to_string();
    let combatant_id_clone = combatant_id.clone();

    info!("WebSocket connected: {}", combatant_id);

    state.authority.write().await.connect(&combatant_id);
    state
        .connections
        .register(CombatantSession {
            combatant_id: combatant_id.clone(),
            sender: tx,
        })
        .await;

    // Send welcome message
    let welcome = ServerMessage::Welcome {
        combatant_id: combatant_id.clone(),
        health: state.config.max_health,
        max_health: state.config.max_health,
    };
    if let Ok(json) = serde_json::to_string(&welcome) {
        let _ = socket.send(Message::Text(json.into())).await;
    }

    // Main loop: handle incoming messages and outgoing messages
    loop {
        tokio::select! {
            // Handle outgoing messages from our channel
            Some(msg) = rx.recv() => {
                if let Ok(json) = serde_json::to_string(&msg) {
                    if socket.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
            }
            // Handle incoming messages from WebSocket
            result = socket.recv() => {
                match result {
                    Some(Ok(Message::Text(text))) => {
                        if let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) {
                            handle_client_message(&state, &combatant_id, client_msg).await;
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    _ => {}
                }
            }
        }
    }

    // Clean up
    state.connections.unregister(&combatant_id_clone).await;
    state.authority.write().await.disconnect(&combatant_id_clone);
    info!("WebSocket disconnected: {}", combatant_id_clone);
}

/// Handle a message from the client
async fn handle_client_message(state: &AppState, combatant_id: &str, msg: ClientMessage) {
    match msg {
        ClientMessage::Fire { weapon, hit } => {
            let now = Instant::now();
            let events = state.authority.write().await.handle_fire_event(
                combatant_id,
                FireEvent { weapon, hit },
                now,
            );
            state.connections.dispatch(events).await;
        }
        ClientMessage::Position { position, .. } => {
            state
                .authority
                .write()
                .await
                .report_position(combatant_id, position, Instant::now());
        }
        ClientMessage::Respawn => {
            let events = state.authority.write().await.respawn(combatant_id);
            state.connections.dispatch(events).await;
        }
        ClientMessage::Ping => {
            // Just keep the connection alive, no response needed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_message_wire_shape() {
        let msg = ServerMessage::HealthUpdate {
            health: 65,
            max_health: 100,
            delta: -35,
            body_part: Some(BodyPart::Torso),
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "health_update");
        assert_eq!(json["delta"], -35);
        assert_eq!(json["body_part"], "torso");
    }

    #[test]
    fn test_status_effect_flattens() {
        let msg = ServerMessage::StatusEffect {
            effect: StatusEffectKind::Bleeding { stacks: 2 },
        };
        let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "status_effect");
        assert_eq!(json["effect"], "bleeding");
        assert_eq!(json["stacks"], 2);
    }

    #[test]
    fn test_client_message_parses_fire() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{
                "type": "fire",
                "weapon": "ak74",
                "hit": {
                    "target": "c-2",
                    "body_part": "head",
                    "position": [0.0, 0.0, 10.0]
                }
            }"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Fire { weapon, hit } => {
                assert_eq!(weapon, "ak74");
                assert_eq!(hit.unwrap().body_part, BodyPart::Head);
            }
            _ => panic!("expected fire message"),
        }
    }

    #[test]
    fn test_client_message_parses_position() {
        let msg: ClientMessage = serde_json::from_str(
            r#"{"type": "position", "position": [1.0, 2.0, 3.0], "timestamp": 12.5}"#,
        )
        .unwrap();
        match msg {
            ClientMessage::Position { position, timestamp } => {
                assert_eq!(position, Vec3::new(1.0, 2.0, 3.0));
                assert_eq!(timestamp, 12.5);
            }
            _ => panic!("expected position message"),
        }
    }
}
