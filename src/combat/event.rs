//! Fire events and outbound combat records
//!
//! `FireEvent` is the transient, per-shot (or per-pellet) client report;
//! it is consumed synchronously by the authority and discarded.
//! `CombatEvent` is the outbound record stream the transport layer routes
//! to clients and killfeed consumers.

use chrono::{DateTime, Utc};
use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::damage::{BodyPart, DamageType, Limb};

/// Client-reported outcome of one shot or pellet
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FireEvent {
    /// Weapon id, resolved against the server's own table
    pub weapon: String,
    /// Absent on a miss
    pub hit: Option<HitReport>,
}

/// The hit half of a fire event
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct HitReport {
    /// Reported hit reference; ids that resolve to no tracked combatant
    /// (world geometry, departed players) are treated as misses
    pub target: String,
    pub body_part: BodyPart,
    /// Reported impact position, checked against the attacker's position
    pub position: Vec3,
    #[serde(default)]
    pub normal: Option<Vec3>,
}

/// Status effects reported to clients
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum StatusEffectKind {
    Bleeding { stacks: u8 },
    Fracture { limb: Limb, fractured: bool },
}

/// Outbound records produced by the combat authority
#[derive(Debug, Clone, PartialEq)]
pub enum CombatEvent {
    /// Sent to the affected combatant after every health mutation
    HealthUpdate {
        combatant: String,
        health: i32,
        max_health: i32,
        /// Negative for damage, positive for healing, zero on respawn
        delta: i32,
        body_part: Option<BodyPart>,
    },
    /// Sent to the affected combatant when a status value actually changed
    StatusEffect {
        combatant: String,
        effect: StatusEffectKind,
    },
    /// Broadcast once per death transition; killer is absent for
    /// non-combat deaths (bleed-out, falls)
    Death {
        combatant: String,
        killer: Option<String>,
        damage_type: DamageType,
    },
    /// Killfeed/logging record for every applied hit
    HitApplied {
        attacker: String,
        target: String,
        amount: i32,
        body_part: BodyPart,
        weapon: String,
        timestamp: DateTime<Utc>,
    },
    /// Killfeed record emitted only when a fire event's damage was lethal
    Kill {
        attacker: String,
        target: String,
        weapon: String,
        timestamp: DateTime<Utc>,
    },
}

impl CombatEvent {
    /// The combatant this record should be delivered to, when it is not a
    /// broadcast
    pub fn recipient(&self) -> Option<&str> {
        match self {
            CombatEvent::HealthUpdate { combatant, .. } => Some(combatant),
            CombatEvent::StatusEffect { combatant, .. } => Some(combatant),
            CombatEvent::Death { .. } | CombatEvent::HitApplied { .. } | CombatEvent::Kill { .. } => {
                None
            }
        }
    }
}
