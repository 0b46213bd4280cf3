//! Combat authority
//!
//! Owns the session-scoped combatant map and orchestrates the full hit
//! path: validator, target resolution, damage model, ledger application,
//! and outbound record emission. Also drives passive regen and the 1 Hz
//! bleeding tick from the server heartbeat. All mutation happens on the
//! single simulation loop; nothing here blocks.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use glam::Vec3;
use tracing::{debug, info};

use super::damage::{compute_damage, DamageType, HealType};
use super::event::{CombatEvent, FireEvent, StatusEffectKind};
use super::ledger::{HealthLedger, LedgerEvent};
use super::rng::{CombatRng, ThreadRngSource};
use super::validator::FireValidator;
use crate::config::CombatConfig;
use crate::movement::PositionTracker;
use crate::weapons::WeaponTable;

/// One tracked participant
#[derive(Debug)]
pub struct Combatant {
    /// Armor tier 0-6; stays 0 until an inventory collaborator sets it
    pub armor_class: u8,
    pub ledger: HealthLedger,
}

/// The authoritative combat orchestrator for one game session
pub struct CombatAuthority {
    combatants: HashMap<String, Combatant>,
    validator: FireValidator,
    positions: PositionTracker,
    weapons: WeaponTable,
    config: Arc<CombatConfig>,
    rng: Box<dyn CombatRng>,
    /// Fractional seconds toward the next 1 Hz bleed tick
    bleed_accumulator: f32,
}

impl CombatAuthority {
    pub fn new(config: Arc<CombatConfig>, weapons: WeaponTable) -> Self {
        Self::with_rng(config, weapons, Box::new(ThreadRngSource::new()))
    }

    /// Construct with an explicit randomness source, for deterministic
    /// scenarios
    pub fn with_rng(
        config: Arc<CombatConfig>,
        weapons: WeaponTable,
        rng: Box<dyn CombatRng>,
    ) -> Self {
        Self {
            combatants: HashMap::new(),
            validator: FireValidator::new(config.rate_limit.clone()),
            positions: PositionTracker::new(config.movement.clone()),
            weapons,
            config,
            rng,
            bleed_accumulator: 0.0,
        }
    }

    /// Track a combatant whose character became active
    pub fn connect(&mut self, combatant_id: &str) {
        info!("Combatant connected: {}", combatant_id);
        self.combatants.insert(
            combatant_id.to_string(),
            Combatant {
                armor_class: 0,
                ledger: HealthLedger::new(self.config.clone()),
            },
        );
    }

    /// Discard all state for a departing combatant
    pub fn disconnect(&mut self, combatant_id: &str) {
        info!("Combatant disconnected: {}", combatant_id);
        self.combatants.remove(combatant_id);
        self.validator.clear(combatant_id);
        self.positions.clear(combatant_id);
    }

    /// Respawn a dead combatant: full health, all status cleared.
    /// Ignored while alive so clients cannot use it as a free heal.
    pub fn respawn(&mut self, combatant_id: &str) -> Vec<CombatEvent> {
        let Some(combatant) = self.combatants.get_mut(combatant_id) else {
            return Vec::new();
        };
        if combatant.ledger.is_alive() {
            debug!("Ignored respawn from living combatant {}", combatant_id);
            return Vec::new();
        }
        info!("Combatant respawned: {}", combatant_id);
        combatant.ledger.reset();
        Self::drain_one(combatant_id, &mut combatant.ledger)
    }

    /// Record a movement report; implausible reports are dropped inside
    /// the tracker
    pub fn report_position(&mut self, combatant_id: &str, position: Vec3, now: Instant) -> bool {
        self.positions.report(combatant_id, position, now)
    }

    /// Set a combatant's armor tier. Integration seam for an inventory
    /// collaborator.
    pub fn set_armor_class(&mut self, combatant_id: &str, armor_class: u8) {
        if let Some(combatant) = self.combatants.get_mut(combatant_id) {
            combatant.armor_class = armor_class;
        }
    }

    pub fn combatant(&self, combatant_id: &str) -> Option<&Combatant> {
        self.combatants.get(combatant_id)
    }

    pub fn combatant_count(&self) -> usize {
        self.combatants.len()
    }

    /// Process one client-reported fire event to a terminal outcome.
    ///
    /// Rejections and unresolvable hits produce no events and no state
    /// change; the attacker sees nothing.
    pub fn handle_fire_event(
        &mut self,
        attacker_id: &str,
        event: FireEvent,
        now: Instant,
    ) -> Vec<CombatEvent> {
        let attacker_pos = self.positions.get(attacker_id);
        let weapon = match self
            .validator
            .validate(attacker_id, &event, attacker_pos, &self.weapons, now)
        {
            Ok(weapon) => weapon.clone(),
            // Already logged by the validator
            Err(_) => return Vec::new(),
        };

        // A miss ends here
        let Some(hit) = event.hit else {
            return Vec::new();
        };
        let Some(attacker_pos) = attacker_pos else {
            return Vec::new();
        };

        if hit.target == attacker_id && !self.config.allow_self_damage {
            debug!("Dropped self-damage from {}", attacker_id);
            return Vec::new();
        }

        // A hit reference that resolves to no tracked combatant is world
        // geometry or someone who already left; treat as a miss
        let Some(target) = self.combatants.get(&hit.target) else {
            debug!("Hit reference {} from {} resolves to no combatant", hit.target, attacker_id);
            return Vec::new();
        };
        if !target.ledger.is_alive() {
            return Vec::new();
        }
        let armor_class = target.armor_class;

        let target_pos = self.positions.get(&hit.target).unwrap_or(hit.position);
        let distance = attacker_pos.distance(target_pos);
        let result = compute_damage(
            &weapon,
            hit.body_part,
            self.config.armor_for_class(armor_class),
            distance,
            &self.config.damage,
            self.rng.as_mut(),
        );

        let Some(target) = self.combatants.get_mut(&hit.target) else {
            return Vec::new();
        };
        let applied = target.ledger.take_damage(
            result.final_damage,
            Some(hit.body_part),
            Some(attacker_id),
            DamageType::Bullet,
            self.rng.as_mut(),
            now,
        );

        let mut lethal = false;
        let mut out = Vec::new();
        for ledger_event in target.ledger.drain_events() {
            if matches!(ledger_event, LedgerEvent::Died { .. }) {
                lethal = true;
            }
            out.push(map_ledger_event(&hit.target, ledger_event));
        }
        out.push(CombatEvent::HitApplied {
            attacker: attacker_id.to_string(),
            target: hit.target.clone(),
            amount: applied,
            body_part: hit.body_part,
            weapon: weapon.name.clone(),
            timestamp: Utc::now(),
        });
        if lethal {
            info!("{} killed {} with {}", attacker_id, hit.target, weapon.name);
            out.push(CombatEvent::Kill {
                attacker: attacker_id.to_string(),
                target: hit.target,
                weapon: weapon.name,
                timestamp: Utc::now(),
            });
        }
        out
    }

    /// Apply non-combat damage (falls, hazards); carries no attacker
    pub fn apply_damage(
        &mut self,
        combatant_id: &str,
        amount: i32,
        damage_type: DamageType,
        now: Instant,
    ) -> Vec<CombatEvent> {
        let Some(combatant) = self.combatants.get_mut(combatant_id) else {
            return Vec::new();
        };
        combatant
            .ledger
            .take_damage(amount, None, None, damage_type, self.rng.as_mut(), now);
        Self::drain_one(combatant_id, &mut combatant.ledger)
    }

    /// Apply item healing
    pub fn heal(&mut self, combatant_id: &str, amount: i32) -> Vec<CombatEvent> {
        let Some(combatant) = self.combatants.get_mut(combatant_id) else {
            return Vec::new();
        };
        combatant.ledger.heal(amount, HealType::Item);
        Self::drain_one(combatant_id, &mut combatant.ledger)
    }

    /// Advance the simulation by `dt` seconds: passive regen every tick,
    /// bleeding damage once per accumulated second. Under extreme
    /// scheduler lag the accumulator reset can skip or double-fire a bleed
    /// second; acceptable here.
    pub fn tick(&mut self, dt: f32, now: Instant) -> Vec<CombatEvent> {
        for combatant in self.combatants.values_mut() {
            combatant.ledger.tick_regen(dt, now);
        }

        self.bleed_accumulator += dt;
        if self.bleed_accumulator >= 1.0 {
            self.bleed_accumulator = 0.0;
            for combatant in self.combatants.values_mut() {
                combatant.ledger.process_bleed_tick(self.rng.as_mut(), now);
            }
        }

        let mut out = Vec::new();
        for (id, combatant) in self.combatants.iter_mut() {
            for ledger_event in combatant.ledger.drain_events() {
                out.push(map_ledger_event(id, ledger_event));
            }
        }
        out
    }

    fn drain_one(combatant_id: &str, ledger: &mut HealthLedger) -> Vec<CombatEvent> {
        ledger
            .drain_events()
            .into_iter()
            .map(|event| map_ledger_event(combatant_id, event))
            .collect()
    }
}

/// Translate a ledger event into an outbound record for one combatant
fn map_ledger_event(combatant_id: &str, event: LedgerEvent) -> CombatEvent {
    match event {
        LedgerEvent::Damaged {
            applied,
            body_part,
            health,
            max_health,
            ..
        } => CombatEvent::HealthUpdate {
            combatant: combatant_id.to_string(),
            health,
            max_health,
            delta: -applied,
            body_part,
        },
        LedgerEvent::Healed {
            applied,
            health,
            max_health,
            ..
        } => CombatEvent::HealthUpdate {
            combatant: combatant_id.to_string(),
            health,
            max_health,
            delta: applied,
            body_part: None,
        },
        LedgerEvent::Bleeding { stacks } => CombatEvent::StatusEffect {
            combatant: combatant_id.to_string(),
            effect: StatusEffectKind::Bleeding { stacks },
        },
        LedgerEvent::Fracture { limb, fractured } => CombatEvent::StatusEffect {
            combatant: combatant_id.to_string(),
            effect: StatusEffectKind::Fracture { limb, fractured },
        },
        LedgerEvent::Died {
            source,
            damage_type,
        } => CombatEvent::Death {
            combatant: combatant_id.to_string(),
            killer: source,
            damage_type,
        },
        LedgerEvent::Respawned { health, max_health } => CombatEvent::HealthUpdate {
            combatant: combatant_id.to_string(),
            health,
            max_health,
            delta: 0,
            body_part: None,
        },
    }
}
