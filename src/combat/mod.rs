//! Server-authoritative combat core
//!
//! Implements the full hit pipeline:
//! - Fire-event validation (rate limiting, distance plausibility, weapon
//!   existence)
//! - Damage computation (body part, armor, penetration, range falloff)
//! - Per-combatant health/status ledgers (bleeding, fractures, regen,
//!   death)
//! - Orchestration and outbound record emission
//!
//! Clients report what they saw; this module decides what actually
//! happened.

mod authority;
mod damage;
mod event;
mod ledger;
mod rng;
mod validator;

pub use authority::{Combatant, CombatAuthority};
pub use damage::{compute_damage, BodyPart, DamageResult, DamageType, HealType, Limb};
pub use event::{CombatEvent, FireEvent, HitReport, StatusEffectKind};
pub use ledger::{HealthLedger, LedgerEvent};
pub use rng::{CombatRng, FixedRng, SeededRng, ThreadRngSource};
pub use validator::{FireValidator, RejectReason};
