//! Server-side position tracking
//!
//! Keeps the last plausible position per combatant, fed by client movement
//! reports. Each report's displacement is checked against
//! `max_speed * elapsed + tolerance`; implausible reports are logged and
//! dropped. Because a dropped report leaves the old record (and its
//! timestamp) in place, the allowance keeps growing with elapsed time, so
//! a legitimately teleported player re-synchronizes on their own.
//!
//! These positions are what the fire-event validator measures shot
//! distances against, so they must never be taken from the fire event
//! itself.

use std::collections::HashMap;
use std::time::Instant;

use glam::Vec3;
use tracing::warn;

use crate::config::MovementConfig;

#[derive(Debug, Clone, Copy)]
struct PositionRecord {
    position: Vec3,
    reported_at: Instant,
}

/// Last-known-position map, keyed by combatant id
#[derive(Debug)]
pub struct PositionTracker {
    records: HashMap<String, PositionRecord>,
    config: MovementConfig,
}

impl PositionTracker {
    pub fn new(config: MovementConfig) -> Self {
        Self {
            records: HashMap::new(),
            config,
        }
    }

    /// Record a reported position. Returns false when the report was
    /// implausible and dropped. The first report for an id is always
    /// accepted; spawn placement is the session layer's concern.
    pub fn report(&mut self, combatant_id: &str, position: Vec3, now: Instant) -> bool {
        match self.records.get_mut(combatant_id) {
            None => {
                self.records.insert(
                    combatant_id.to_string(),
                    PositionRecord {
                        position,
                        reported_at: now,
                    },
                );
                true
            }
            Some(record) => {
                let elapsed = now.saturating_duration_since(record.reported_at).as_secs_f32();
                let allowed = self.config.max_speed * elapsed + self.config.position_tolerance;
                let displacement = record.position.distance(position);
                if displacement > allowed {
                    warn!(
                        "Dropped implausible movement report from {}: moved {:.1} with {:.1} allowed",
                        combatant_id, displacement, allowed
                    );
                    return false;
                }
                record.position = position;
                record.reported_at = now;
                true
            }
        }
    }

    /// Last plausible position, if any has been reported
    pub fn get(&self, combatant_id: &str) -> Option<Vec3> {
        self.records.get(combatant_id).map(|r| r.position)
    }

    /// Forget a combatant on disconnect
    pub fn clear(&mut self, combatant_id: &str) {
        self.records.remove(combatant_id);
    }
}
