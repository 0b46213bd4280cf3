//! Damage model
//!
//! Pure computation from weapon stats, hit location, armor, and distance to
//! a final integer damage value:
//! - Body-part multiplier (head/torso/limb), composed with the weapon's own
//!   headshot multiplier on head hits
//! - Armor protection, reduced by weapon penetration, with a single
//!   ricochet roll per hit that fully negates on success
//! - Linear range falloff between effective and max range, down to the
//!   weapon's dropoff floor
//! - Floor to integer, clamp to >= 0

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::rng::CombatRng;
use crate::config::{ArmorClass, DamageConfig};
use crate::weapons::WeaponProfile;

/// Hit locations reported by fire events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyPart {
    Head,
    Torso,
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl BodyPart {
    /// The limb this part corresponds to, if any
    pub fn as_limb(&self) -> Option<Limb> {
        match self {
            BodyPart::LeftArm => Some(Limb::LeftArm),
            BodyPart::RightArm => Some(Limb::RightArm),
            BodyPart::LeftLeg => Some(Limb::LeftLeg),
            BodyPart::RightLeg => Some(Limb::RightLeg),
            BodyPart::Head | BodyPart::Torso => None,
        }
    }

    pub fn is_limb(&self) -> bool {
        self.as_limb().is_some()
    }
}

impl FromStr for BodyPart {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "head" => Ok(BodyPart::Head),
            "torso" | "chest" => Ok(BodyPart::Torso),
            "left_arm" | "leftarm" => Ok(BodyPart::LeftArm),
            "right_arm" | "rightarm" => Ok(BodyPart::RightArm),
            "left_leg" | "leftleg" => Ok(BodyPart::LeftLeg),
            "right_leg" | "rightleg" => Ok(BodyPart::RightLeg),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for BodyPart {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BodyPart::Head => "head",
            BodyPart::Torso => "torso",
            BodyPart::LeftArm => "left_arm",
            BodyPart::RightArm => "right_arm",
            BodyPart::LeftLeg => "left_leg",
            BodyPart::RightLeg => "right_leg",
        };
        write!(f, "{}", s)
    }
}

/// Limbs that can fracture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Limb {
    LeftArm,
    RightArm,
    LeftLeg,
    RightLeg,
}

impl std::fmt::Display for Limb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Limb::LeftArm => "left_arm",
            Limb::RightArm => "right_arm",
            Limb::LeftLeg => "left_leg",
            Limb::RightLeg => "right_leg",
        };
        write!(f, "{}", s)
    }
}

/// Causes of damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Bullet,
    Bleeding,
    Fall,
}

impl std::fmt::Display for DamageType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DamageType::Bullet => "bullet",
            DamageType::Bleeding => "bleeding",
            DamageType::Fall => "fall",
        };
        write!(f, "{}", s)
    }
}

/// Causes of healing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealType {
    Regen,
    Item,
}

/// Result of a damage computation
#[derive(Debug, Clone, PartialEq)]
pub struct DamageResult {
    /// Weapon base damage before modifiers
    pub base_damage: i32,
    /// Damage after all modifiers, floored and clamped
    pub final_damage: i32,
    /// Body part the computation was made for
    pub body_part: BodyPart,
    /// Whether armor fully negated the hit
    pub ricochet: bool,
}

/// Compute final damage for one hit.
///
/// Deterministic except for the ricochet roll, which happens exactly once
/// per hit and only when armor is present. Distances beyond max range clamp
/// to the dropoff floor; the validator rejects those shots before they get
/// here.
pub fn compute_damage(
    weapon: &WeaponProfile,
    body_part: BodyPart,
    armor: Option<&ArmorClass>,
    distance: f32,
    multipliers: &DamageConfig,
    rng: &mut dyn CombatRng,
) -> DamageResult {
    let mut damage = weapon.damage as f32 * multipliers.multiplier_for(body_part);
    if body_part == BodyPart::Head {
        damage *= weapon.headshot_multiplier;
    }

    if let Some(armor) = armor {
        if rng.chance(armor.ricochet_chance) {
            return DamageResult {
                base_damage: weapon.damage,
                final_damage: 0,
                body_part,
                ricochet: true,
            };
        }
        let protection = armor.protection * (1.0 - weapon.penetration / 100.0).max(0.0);
        damage *= 1.0 - protection;
    }

    damage *= falloff_factor(weapon, distance);

    DamageResult {
        base_damage: weapon.damage,
        final_damage: (damage.floor() as i32).max(0),
        body_part,
        ricochet: false,
    }
}

/// Fraction of damage remaining at the given distance
fn falloff_factor(weapon: &WeaponProfile, distance: f32) -> f32 {
    if distance <= weapon.effective_range {
        return 1.0;
    }
    if weapon.max_range <= weapon.effective_range {
        return weapon.damage_dropoff;
    }
    let t = ((distance - weapon.effective_range) / (weapon.max_range - weapon.effective_range))
        .min(1.0);
    1.0 - t * (1.0 - weapon.damage_dropoff)
}
