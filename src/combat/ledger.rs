//! Per-combatant health and status ledger
//!
//! The only place health, bleeding stacks, and fractures are ever written.
//! Every mutation clamps to its valid range, and the ledger queues domain
//! events for the authority to drain and fan out. Status-changed events
//! fire only when a value actually changed; the death transition fires at
//! most once per life and is terminal until an explicit reset.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;

use super::damage::{BodyPart, DamageType, HealType, Limb};
use super::rng::CombatRng;
use crate::config::CombatConfig;

/// Events queued by ledger mutations
#[derive(Debug, Clone, PartialEq)]
pub enum LedgerEvent {
    Damaged {
        applied: i32,
        body_part: Option<BodyPart>,
        damage_type: DamageType,
        health: i32,
        max_health: i32,
    },
    Healed {
        applied: i32,
        heal_type: HealType,
        health: i32,
        max_health: i32,
    },
    Bleeding {
        stacks: u8,
    },
    Fracture {
        limb: Limb,
        fractured: bool,
    },
    Died {
        source: Option<String>,
        damage_type: DamageType,
    },
    Respawned {
        health: i32,
        max_health: i32,
    },
}

/// Health/status state machine for one combatant
#[derive(Debug)]
pub struct HealthLedger {
    max_health: i32,
    current_health: i32,
    alive: bool,
    bleeding_stacks: u8,
    fractures: HashSet<Limb>,
    /// Gates regen eligibility; unset means never damaged this life
    last_damage: Option<Instant>,
    /// Fractional regen accumulated between whole-point heals
    regen_carry: f32,
    events: Vec<LedgerEvent>,
    config: Arc<CombatConfig>,
}

impl HealthLedger {
    /// Create a fresh ledger at full health
    pub fn new(config: Arc<CombatConfig>) -> Self {
        Self {
            max_health: config.max_health,
            current_health: config.max_health,
            alive: true,
            bleeding_stacks: 0,
            fractures: HashSet::new(),
            last_damage: None,
            regen_carry: 0.0,
            events: Vec::new(),
            config,
        }
    }

    pub fn health(&self) -> i32 {
        self.current_health
    }

    pub fn max_health(&self) -> i32 {
        self.max_health
    }

    pub fn is_alive(&self) -> bool {
        self.alive
    }

    pub fn bleeding_stacks(&self) -> u8 {
        self.bleeding_stacks
    }

    pub fn is_fractured(&self, limb: Limb) -> bool {
        self.fractures.contains(&limb)
    }

    /// Drain queued events in emission order
    pub fn drain_events(&mut self) -> Vec<LedgerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Apply damage; returns the amount actually applied.
    ///
    /// No-op on a dead combatant. Clamps to remaining health, derives
    /// bleeding/fracture status from the applied amount, and performs the
    /// death transition when health reaches zero. A fully negated hit
    /// (zero applied) mutates nothing and does not interrupt regen.
    pub fn take_damage(
        &mut self,
        amount: i32,
        body_part: Option<BodyPart>,
        source: Option<&str>,
        damage_type: DamageType,
        rng: &mut dyn CombatRng,
        now: Instant,
    ) -> i32 {
        if !self.alive {
            return 0;
        }
        let applied = amount.clamp(0, self.current_health);
        if applied == 0 {
            return 0;
        }

        self.current_health -= applied;
        self.last_damage = Some(now);
        self.regen_carry = 0.0;
        self.events.push(LedgerEvent::Damaged {
            applied,
            body_part,
            damage_type,
            health: self.current_health,
            max_health: self.max_health,
        });

        if damage_type == DamageType::Bullet && applied > self.config.bleeding.trigger_threshold {
            let probability = applied as f32 / 100.0;
            if rng.chance(probability) {
                self.add_bleeding(1);
            }
        }
        if applied > self.config.fracture.damage_threshold {
            if let Some(limb) = body_part.and_then(|part| part.as_limb()) {
                if rng.chance(self.config.fracture.chance) {
                    self.apply_fracture(limb);
                }
            }
        }

        if self.current_health == 0 {
            self.alive = false;
            self.events.push(LedgerEvent::Died {
                source: source.map(str::to_string),
                damage_type,
            });
        }

        applied
    }

    /// Heal up to max health; returns the amount actually applied.
    /// No-op on a dead combatant.
    pub fn heal(&mut self, amount: i32, heal_type: HealType) -> i32 {
        if !self.alive {
            return 0;
        }
        let applied = amount.clamp(0, self.max_health - self.current_health);
        if applied == 0 {
            return 0;
        }
        self.current_health += applied;
        self.events.push(LedgerEvent::Healed {
            applied,
            heal_type,
            health: self.current_health,
            max_health: self.max_health,
        });
        applied
    }

    /// Add bleeding stacks, clamped to the configured maximum
    pub fn add_bleeding(&mut self, stacks: u8) {
        let new = self
            .bleeding_stacks
            .saturating_add(stacks)
            .min(self.config.bleeding.max_stacks);
        if new != self.bleeding_stacks {
            self.bleeding_stacks = new;
            self.events.push(LedgerEvent::Bleeding { stacks: new });
        }
    }

    /// Remove bleeding stacks, clamped at zero
    pub fn remove_bleeding(&mut self, stacks: u8) {
        let new = self.bleeding_stacks.saturating_sub(stacks);
        if new != self.bleeding_stacks {
            self.bleeding_stacks = new;
            self.events.push(LedgerEvent::Bleeding { stacks: new });
        }
    }

    /// Mark a limb fractured; idempotent
    pub fn apply_fracture(&mut self, limb: Limb) {
        if self.fractures.insert(limb) {
            self.events.push(LedgerEvent::Fracture {
                limb,
                fractured: true,
            });
        }
    }

    /// Clear a limb fracture; idempotent
    pub fn heal_fracture(&mut self, limb: Limb) {
        if self.fractures.remove(&limb) {
            self.events.push(LedgerEvent::Fracture {
                limb,
                fractured: false,
            });
        }
    }

    /// Apply one 1 Hz bleed tick: damage scales with current stacks
    pub fn process_bleed_tick(&mut self, rng: &mut dyn CombatRng, now: Instant) {
        if !self.alive || self.bleeding_stacks == 0 {
            return;
        }
        let amount = self.config.bleeding.damage_per_tick * self.bleeding_stacks as i32;
        self.take_damage(amount, None, None, DamageType::Bleeding, rng, now);
    }

    /// Advance passive regen by `dt` seconds. Heals only while alive,
    /// below max health, and past the configured delay since last damage.
    pub fn tick_regen(&mut self, dt: f32, now: Instant) {
        let rate = self.config.regen.rate;
        if rate <= 0.0 || !self.alive || self.current_health >= self.max_health {
            return;
        }
        if let Some(last) = self.last_damage {
            if now.saturating_duration_since(last).as_secs_f32() < self.config.regen.delay {
                return;
            }
        }
        self.regen_carry += rate * dt;
        let whole = self.regen_carry as i32;
        if whole > 0 {
            self.regen_carry -= whole as f32;
            self.heal(whole, HealType::Regen);
        }
    }

    /// Respawn: restore full health and clear all status. The only
    /// transition out of the dead state.
    pub fn reset(&mut self) {
        self.alive = true;
        self.current_health = self.max_health;
        self.last_damage = None;
        self.regen_carry = 0.0;
        if self.bleeding_stacks != 0 {
            self.bleeding_stacks = 0;
            self.events.push(LedgerEvent::Bleeding { stacks: 0 });
        }
        let cleared: Vec<Limb> = self.fractures.drain().collect();
        for limb in cleared {
            self.events.push(LedgerEvent::Fracture {
                limb,
                fractured: false,
            });
        }
        self.events.push(LedgerEvent::Respawned {
            health: self.current_health,
            max_health: self.max_health,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::rng::FixedRng;

    fn ledger() -> HealthLedger {
        HealthLedger::new(Arc::new(CombatConfig::default()))
    }

    fn no_rolls() -> FixedRng {
        FixedRng(false)
    }

    #[test]
    fn test_damage_and_heal_clamping() {
        let mut l = ledger();
        let now = Instant::now();

        let applied = l.take_damage(30, None, None, DamageType::Bullet, &mut no_rolls(), now);
        assert_eq!(applied, 30);
        assert_eq!(l.health(), 70);

        let healed = l.heal(20, HealType::Item);
        assert_eq!(healed, 20);
        assert_eq!(l.health(), 90);

        // Cannot overheal
        let healed = l.heal(50, HealType::Item);
        assert_eq!(healed, 10);
        assert_eq!(l.health(), 100);

        // Healing at full health applies nothing and fires nothing
        l.drain_events();
        assert_eq!(l.heal(5, HealType::Item), 0);
        assert!(l.drain_events().is_empty());
    }

    #[test]
    fn test_overkill_clamps_to_remaining_health() {
        let mut l = ledger();
        let now = Instant::now();
        l.take_damage(95, None, None, DamageType::Bullet, &mut no_rolls(), now);
        assert_eq!(l.health(), 5);

        let applied = l.take_damage(10, None, None, DamageType::Bullet, &mut no_rolls(), now);
        assert_eq!(applied, 5);
        assert_eq!(l.health(), 0);
        assert!(!l.is_alive());
    }

    #[test]
    fn test_death_fires_once_and_dead_is_noop() {
        let mut l = ledger();
        let now = Instant::now();
        l.take_damage(100, None, Some("attacker-1"), DamageType::Bullet, &mut no_rolls(), now);

        let events = l.drain_events();
        let deaths: Vec<_> = events
            .iter()
            .filter(|e| matches!(e, LedgerEvent::Died { .. }))
            .collect();
        assert_eq!(deaths.len(), 1);
        assert_eq!(
            deaths[0],
            &LedgerEvent::Died {
                source: Some("attacker-1".to_string()),
                damage_type: DamageType::Bullet,
            }
        );

        // Further damage and healing are no-ops with no events
        assert_eq!(
            l.take_damage(10, None, None, DamageType::Bullet, &mut no_rolls(), now),
            0
        );
        assert_eq!(l.heal(10, HealType::Item), 0);
        assert!(l.drain_events().is_empty());
        assert_eq!(l.health(), 0);
    }

    #[test]
    fn test_bleeding_clamps_and_fires_on_change_only() {
        let mut l = ledger();

        l.add_bleeding(1);
        assert_eq!(l.bleeding_stacks(), 1);
        assert_eq!(
            l.drain_events(),
            vec![LedgerEvent::Bleeding { stacks: 1 }]
        );

        // Saturates at the configured max of 3
        l.add_bleeding(200);
        assert_eq!(l.bleeding_stacks(), 3);
        assert_eq!(
            l.drain_events(),
            vec![LedgerEvent::Bleeding { stacks: 3 }]
        );

        // Already at max: no change, no event
        l.add_bleeding(1);
        assert_eq!(l.bleeding_stacks(), 3);
        assert!(l.drain_events().is_empty());

        l.remove_bleeding(10);
        assert_eq!(l.bleeding_stacks(), 0);
        assert_eq!(
            l.drain_events(),
            vec![LedgerEvent::Bleeding { stacks: 0 }]
        );

        // Already at zero: no event
        l.remove_bleeding(1);
        assert!(l.drain_events().is_empty());
    }

    #[test]
    fn test_fracture_idempotence() {
        let mut l = ledger();

        l.apply_fracture(Limb::LeftLeg);
        assert!(l.is_fractured(Limb::LeftLeg));
        assert_eq!(l.drain_events().len(), 1);

        // Re-applying fires nothing
        l.apply_fracture(Limb::LeftLeg);
        assert!(l.drain_events().is_empty());

        l.heal_fracture(Limb::LeftLeg);
        assert!(!l.is_fractured(Limb::LeftLeg));
        assert_eq!(l.drain_events().len(), 1);

        // Healing an intact limb fires nothing
        l.heal_fracture(Limb::RightArm);
        assert!(l.drain_events().is_empty());
    }

    #[test]
    fn test_bullet_damage_derives_bleeding() {
        let mut l = ledger();
        let now = Instant::now();

        // 25 > threshold 10, roll forced to succeed
        l.take_damage(25, Some(BodyPart::Torso), None, DamageType::Bullet, &mut FixedRng(true), now);
        assert_eq!(l.bleeding_stacks(), 1);

        // At or below the threshold no roll happens even when forced
        let mut l = ledger();
        l.take_damage(10, Some(BodyPart::Torso), None, DamageType::Bullet, &mut FixedRng(true), now);
        assert_eq!(l.bleeding_stacks(), 0);
    }

    #[test]
    fn test_bleed_tick_damage_does_not_derive_bleeding() {
        let mut l = ledger();
        let now = Instant::now();
        l.take_damage(50, None, None, DamageType::Bleeding, &mut FixedRng(true), now);
        assert_eq!(l.bleeding_stacks(), 0);
    }

    #[test]
    fn test_limb_damage_derives_fracture() {
        let mut l = ledger();
        let now = Instant::now();

        // 35 > threshold 30 on a limb, roll forced
        l.take_damage(35, Some(BodyPart::RightLeg), None, DamageType::Bullet, &mut FixedRng(true), now);
        assert!(l.is_fractured(Limb::RightLeg));

        // Same damage to the torso cannot fracture
        let mut l = ledger();
        l.take_damage(35, Some(BodyPart::Torso), None, DamageType::Bullet, &mut FixedRng(true), now);
        assert!(!l.is_fractured(Limb::LeftArm));
        assert!(!l.is_fractured(Limb::RightLeg));
    }

    #[test]
    fn test_process_bleed_tick_scales_with_stacks() {
        let mut l = ledger();
        let now = Instant::now();
        l.add_bleeding(3);
        l.drain_events();

        l.process_bleed_tick(&mut no_rolls(), now);
        // 2 damage per tick * 3 stacks
        assert_eq!(l.health(), 94);

        let events = l.drain_events();
        assert_eq!(
            events,
            vec![LedgerEvent::Damaged {
                applied: 6,
                body_part: None,
                damage_type: DamageType::Bleeding,
                health: 94,
                max_health: 100,
            }]
        );
    }

    #[test]
    fn test_bleed_out_death_has_no_source() {
        let mut l = ledger();
        let now = Instant::now();
        l.take_damage(97, None, None, DamageType::Bullet, &mut no_rolls(), now);
        l.add_bleeding(3);
        l.drain_events();

        l.process_bleed_tick(&mut no_rolls(), now);
        assert!(!l.is_alive());
        let events = l.drain_events();
        assert!(events.contains(&LedgerEvent::Died {
            source: None,
            damage_type: DamageType::Bleeding,
        }));
    }

    #[test]
    fn test_regen_respects_delay() {
        let mut l = ledger();
        let t0 = Instant::now();
        l.take_damage(40, None, None, DamageType::Bullet, &mut no_rolls(), t0);
        l.drain_events();

        // Inside the 8s delay window: nothing
        l.tick_regen(1.0, t0 + std::time::Duration::from_secs(4));
        assert_eq!(l.health(), 60);

        // Past the delay: 1 hp/s accumulates
        l.tick_regen(1.0, t0 + std::time::Duration::from_secs(9));
        assert_eq!(l.health(), 61);
    }

    #[test]
    fn test_regen_accumulates_fractional_time() {
        let mut l = ledger();
        let t0 = Instant::now();
        l.take_damage(40, None, None, DamageType::Bullet, &mut no_rolls(), t0);
        let later = t0 + std::time::Duration::from_secs(20);

        // Four 0.25s ticks add up to one whole point
        for _ in 0..4 {
            l.tick_regen(0.25, later);
        }
        assert_eq!(l.health(), 61);
    }

    #[test]
    fn test_regen_interrupted_by_damage() {
        let mut l = ledger();
        let t0 = Instant::now();
        l.take_damage(40, None, None, DamageType::Bullet, &mut no_rolls(), t0);

        let later = t0 + std::time::Duration::from_secs(20);
        l.tick_regen(1.0, later);
        assert_eq!(l.health(), 61);

        // New damage restarts the delay window
        l.take_damage(1, None, None, DamageType::Bullet, &mut no_rolls(), later);
        l.tick_regen(1.0, later + std::time::Duration::from_secs(1));
        assert_eq!(l.health(), 60);
    }

    #[test]
    fn test_regen_never_fires_when_dead_or_full() {
        let mut l = ledger();
        let t0 = Instant::now();

        // Full health: no-op
        l.tick_regen(5.0, t0);
        assert_eq!(l.health(), 100);

        l.take_damage(100, None, None, DamageType::Bullet, &mut no_rolls(), t0);
        l.tick_regen(60.0, t0 + std::time::Duration::from_secs(120));
        assert_eq!(l.health(), 0);
        assert!(!l.is_alive());
    }

    #[test]
    fn test_death_then_reset() {
        let mut l = ledger();
        let now = Instant::now();
        l.take_damage(60, Some(BodyPart::LeftLeg), None, DamageType::Bullet, &mut FixedRng(true), now);
        l.take_damage(100, None, None, DamageType::Bullet, &mut no_rolls(), now);
        assert!(!l.is_alive());
        assert!(l.bleeding_stacks() > 0);
        assert!(l.is_fractured(Limb::LeftLeg));
        l.drain_events();

        l.reset();
        assert!(l.is_alive());
        assert_eq!(l.health(), 100);
        assert_eq!(l.bleeding_stacks(), 0);
        assert!(!l.is_fractured(Limb::LeftLeg));

        let events = l.drain_events();
        assert!(events.contains(&LedgerEvent::Bleeding { stacks: 0 }));
        assert!(events.contains(&LedgerEvent::Fracture {
            limb: Limb::LeftLeg,
            fractured: false,
        }));
        assert!(events.contains(&LedgerEvent::Respawned {
            health: 100,
            max_health: 100,
        }));
    }

    #[test]
    fn test_zero_applied_does_not_gate_regen() {
        let mut l = ledger();
        let t0 = Instant::now();
        l.take_damage(40, None, None, DamageType::Bullet, &mut no_rolls(), t0);

        // A fully negated hit later must not restart the delay window
        let later = t0 + std::time::Duration::from_secs(20);
        l.take_damage(0, None, None, DamageType::Bullet, &mut no_rolls(), later);
        l.tick_regen(1.0, later);
        assert_eq!(l.health(), 61);
    }
}
