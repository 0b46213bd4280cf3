//! Combat tuning configuration
//!
//! All numeric policy lives here: body-part multipliers, the armor class
//! table, bleeding/fracture/regen tuning, rate-limit and movement bounds,
//! and the authoritative weapon profile list. Loaded once at startup and
//! shared read-only; nothing in the hit path mutates configuration.

use std::path::Path;

use anyhow::{ensure, Context, Result};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::combat::BodyPart;
use crate::weapons::WeaponProfile;

/// Body-part damage multipliers
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DamageConfig {
    pub head_multiplier: f32,
    pub torso_multiplier: f32,
    pub limb_multiplier: f32,
}

impl Default for DamageConfig {
    fn default() -> Self {
        Self {
            head_multiplier: 2.0,
            torso_multiplier: 1.0,
            limb_multiplier: 0.7,
        }
    }
}

impl DamageConfig {
    /// Multiplier for a hit on the given body part
    pub fn multiplier_for(&self, part: BodyPart) -> f32 {
        match part {
            BodyPart::Head => self.head_multiplier,
            BodyPart::Torso => self.torso_multiplier,
            _ => self.limb_multiplier,
        }
    }
}

/// One tier of the armor table (classes 1-6)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArmorClass {
    /// Tier number, 1-6; class 0 means unarmored and has no table entry
    pub class: u8,
    /// Fraction of damage absorbed, before penetration
    pub protection: f32,
    /// Chance that a hit is fully negated
    pub ricochet_chance: f32,
}

/// Bleeding status-effect tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BleedingConfig {
    /// Damage applied per stack on each 1 Hz bleed tick
    pub damage_per_tick: i32,
    pub max_stacks: u8,
    /// Bullet damage must exceed this to roll for a bleed
    pub trigger_threshold: i32,
}

impl Default for BleedingConfig {
    fn default() -> Self {
        Self {
            damage_per_tick: 2,
            max_stacks: 3,
            trigger_threshold: 10,
        }
    }
}

/// Fracture status-effect tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FractureConfig {
    pub chance: f32,
    /// Applied limb damage must exceed this to roll for a fracture
    pub damage_threshold: i32,
}

impl Default for FractureConfig {
    fn default() -> Self {
        Self {
            chance: 0.30,
            damage_threshold: 30,
        }
    }
}

/// Passive regeneration tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegenConfig {
    /// Health per second; 0 disables regen
    pub rate: f32,
    /// Seconds since last damage before regen resumes
    pub delay: f32,
}

impl Default for RegenConfig {
    fn default() -> Self {
        Self {
            rate: 1.0,
            delay: 8.0,
        }
    }
}

/// Fire-rate gate tuning
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    /// Server-side ceiling in rounds per minute, above any legitimate
    /// weapon's rate so network jitter never trips the gate
    pub max_fire_rate_rpm: f32,
    /// In-window events tolerated before rejection
    pub burst_tolerance: u32,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_fire_rate_rpm: 1000.0,
            burst_tolerance: 10,
        }
    }
}

/// Movement plausibility bounds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementConfig {
    /// Maximum plausible speed in world units per second
    pub max_speed: f32,
    /// Slack added to the displacement allowance per report
    pub position_tolerance: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            max_speed: 24.0,
            position_tolerance: 6.0,
        }
    }
}

/// Top-level combat configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombatConfig {
    pub max_health: i32,
    pub allow_self_damage: bool,
    pub damage: DamageConfig,
    pub armor: Vec<ArmorClass>,
    pub bleeding: BleedingConfig,
    pub fracture: FractureConfig,
    pub regen: RegenConfig,
    pub rate_limit: RateLimitConfig,
    pub movement: MovementConfig,
    pub weapons: Vec<WeaponProfile>,
}

impl Default for CombatConfig {
    fn default() -> Self {
        Self {
            max_health: 100,
            allow_self_damage: false,
            damage: DamageConfig::default(),
            armor: default_armor_table(),
            bleeding: BleedingConfig::default(),
            fracture: FractureConfig::default(),
            regen: RegenConfig::default(),
            rate_limit: RateLimitConfig::default(),
            movement: MovementConfig::default(),
            weapons: crate::weapons::default_profiles(),
        }
    }
}

fn default_armor_table() -> Vec<ArmorClass> {
    vec![
        ArmorClass { class: 1, protection: 0.10, ricochet_chance: 0.05 },
        ArmorClass { class: 2, protection: 0.20, ricochet_chance: 0.10 },
        ArmorClass { class: 3, protection: 0.35, ricochet_chance: 0.15 },
        ArmorClass { class: 4, protection: 0.45, ricochet_chance: 0.22 },
        ArmorClass { class: 5, protection: 0.55, ricochet_chance: 0.30 },
        ArmorClass { class: 6, protection: 0.65, ricochet_chance: 0.40 },
    ]
}

impl CombatConfig {
    /// Load configuration: defaults, then an optional TOML file, then
    /// `COMBATD_`-prefixed environment variables (`__` separates sections).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(CombatConfig::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let config: CombatConfig = figment
            .merge(Env::prefixed("COMBATD_").split("__"))
            .extract()
            .context("failed to load combat configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Look up the armor table entry for a class; 0 or unknown means
    /// unarmored.
    pub fn armor_for_class(&self, class: u8) -> Option<&ArmorClass> {
        if class == 0 {
            return None;
        }
        self.armor.iter().find(|a| a.class == class)
    }

    fn validate(&self) -> Result<()> {
        ensure!(self.max_health > 0, "max_health must be positive");
        for armor in &self.armor {
            ensure!(
                armor.class >= 1 && armor.class <= 6,
                "armor class {} out of range 1-6",
                armor.class
            );
            ensure!(
                (0.0..=1.0).contains(&armor.protection),
                "armor class {} protection must be within [0, 1]",
                armor.class
            );
            ensure!(
                (0.0..=1.0).contains(&armor.ricochet_chance),
                "armor class {} ricochet chance must be within [0, 1]",
                armor.class
            );
        }
        ensure!(
            self.bleeding.damage_per_tick >= 0,
            "bleeding damage_per_tick must not be negative"
        );
        ensure!(
            (0.0..=1.0).contains(&self.fracture.chance),
            "fracture chance must be within [0, 1]"
        );
        ensure!(self.regen.rate >= 0.0, "regen rate must not be negative");
        ensure!(
            self.rate_limit.max_fire_rate_rpm > 0.0,
            "max_fire_rate_rpm must be positive"
        );
        ensure!(
            self.movement.max_speed > 0.0,
            "movement max_speed must be positive"
        );
        for weapon in &self.weapons {
            ensure!(
                (0.0..=1.0).contains(&weapon.damage_dropoff),
                "weapon {} damage_dropoff must be within [0, 1]",
                weapon.name
            );
            ensure!(
                (0.0..=100.0).contains(&weapon.penetration),
                "weapon {} penetration must be within [0, 100]",
                weapon.name
            );
        }
        Ok(())
    }
}
