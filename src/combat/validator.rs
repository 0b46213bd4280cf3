//! Fire-event validation
//!
//! Every client-reported shot passes through here before it can touch a
//! ledger. Checks run in order: attacker has a tracked position, the
//! weapon id resolves in the server's own table, the fire rate stays under
//! the server ceiling, and the reported hit position is within the
//! weapon's reach. Rejections are logged with attacker identity and
//! reason, then dropped silently; thresholds are never echoed to clients.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use glam::Vec3;
use thiserror::Error;
use tracing::info;

use super::event::FireEvent;
use crate::config::RateLimitConfig;
use crate::weapons::{WeaponProfile, WeaponTable};

/// Why a fire event was dropped
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RejectReason {
    #[error("attacker has no active character")]
    NoCharacter,
    #[error("unknown weapon: {0}")]
    InvalidWeapon(String),
    #[error("fire rate exceeded")]
    RateExceeded,
    #[error("reported hit beyond weapon reach")]
    ShotTooFar,
}

/// Per-attacker rate bookkeeping, created lazily on first fire
#[derive(Debug)]
struct RateLimitRecord {
    last_accepted: Instant,
    /// Shots seen inside the minimum interval since the last accepted one
    overflow: u32,
}

/// Gate in front of the combat authority
#[derive(Debug)]
pub struct FireValidator {
    records: HashMap<String, RateLimitRecord>,
    config: RateLimitConfig,
}

impl FireValidator {
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            records: HashMap::new(),
            config,
        }
    }

    /// Validate one fire event, resolving the weapon profile on success.
    ///
    /// Mutates the attacker's rate-limit record; events from one attacker
    /// must arrive here in order.
    pub fn validate<'w>(
        &mut self,
        attacker_id: &str,
        event: &FireEvent,
        attacker_pos: Option<Vec3>,
        weapons: &'w WeaponTable,
        now: Instant,
    ) -> Result<&'w WeaponProfile, RejectReason> {
        let result = self.check(attacker_id, event, attacker_pos, weapons, now);
        if let Err(ref reason) = result {
            info!(
                "Rejected fire event from {} ({}): {}",
                attacker_id, event.weapon, reason
            );
        }
        result
    }

    fn check<'w>(
        &mut self,
        attacker_id: &str,
        event: &FireEvent,
        attacker_pos: Option<Vec3>,
        weapons: &'w WeaponTable,
        now: Instant,
    ) -> Result<&'w WeaponProfile, RejectReason> {
        let Some(attacker_pos) = attacker_pos else {
            return Err(RejectReason::NoCharacter);
        };

        let weapon = weapons
            .get(&event.weapon)
            .ok_or_else(|| RejectReason::InvalidWeapon(event.weapon.clone()))?;

        self.check_rate(attacker_id, weapon, now)?;

        if let Some(hit) = &event.hit {
            if attacker_pos.distance(hit.position) > weapon.shoot_distance_ceiling() {
                return Err(RejectReason::ShotTooFar);
            }
        }

        Ok(weapon)
    }

    /// Fire-rate gate. Pellet weapons report one event per pellet, so the
    /// ceiling scales with pellet count.
    fn check_rate(
        &mut self,
        attacker_id: &str,
        weapon: &WeaponProfile,
        now: Instant,
    ) -> Result<(), RejectReason> {
        let ceiling_rpm = self.config.max_fire_rate_rpm * weapon.pellet_count.max(1) as f32;
        let min_interval = Duration::from_secs_f32(60.0 / ceiling_rpm);

        match self.records.get_mut(attacker_id) {
            None => {
                self.records.insert(
                    attacker_id.to_string(),
                    RateLimitRecord {
                        last_accepted: now,
                        overflow: 0,
                    },
                );
                Ok(())
            }
            Some(record) => {
                if now.saturating_duration_since(record.last_accepted) < min_interval {
                    // Inside the window: consume burst tolerance, keep the
                    // window anchor so sustained spam stays rejected
                    record.overflow += 1;
                    if record.overflow >= self.config.burst_tolerance {
                        return Err(RejectReason::RateExceeded);
                    }
                } else {
                    record.overflow = 0;
                    record.last_accepted = now;
                }
                Ok(())
            }
        }
    }

    /// Drop the attacker's rate record on disconnect
    pub fn clear(&mut self, attacker_id: &str) {
        self.records.remove(attacker_id);
    }
}
