//! Authoritative weapon profile table
//!
//! Weapon ids follow DNS-label-style naming:
//! - 2-32 characters
//! - Lowercase alphanumeric and hyphens
//! - Must start and end with alphanumeric
//! - No consecutive hyphens
//!
//! Every fire event carries only an id; damage, fire rate, and range are
//! resolved from this table. Client-supplied stats are never consulted.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors for weapon ids
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WeaponIdError {
    #[error("weapon id must be 2-32 characters")]
    Length,
    #[error("weapon id must be lowercase alphanumeric, may contain single hyphens, and must start/end with alphanumeric")]
    InvalidFormat,
}

/// DNS-label-style pattern
static WEAPON_ID_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([a-z0-9-]*[a-z0-9])?$").unwrap());

/// Validate and normalize a weapon id.
///
/// # Examples
/// ```
/// use combatd::weapons::validate_weapon_id;
///
/// assert!(validate_weapon_id("ak74").is_ok());
/// assert!(validate_weapon_id("saiga-12").is_ok());
/// assert!(validate_weapon_id("AK74").is_ok()); // Normalized to "ak74"
///
/// assert!(validate_weapon_id("x").is_err());         // Too short
/// assert!(validate_weapon_id("-ak74").is_err());     // Starts with hyphen
/// assert!(validate_weapon_id("ak--74").is_err());    // Consecutive hyphens
/// ```
pub fn validate_weapon_id(id: &str) -> Result<String, WeaponIdError> {
    let normalized = id.to_lowercase();

    if normalized.len() < 2 || normalized.len() > 32 {
        return Err(WeaponIdError::Length);
    }

    if normalized.contains("--") || !WEAPON_ID_REGEX.is_match(&normalized) {
        return Err(WeaponIdError::InvalidFormat);
    }

    Ok(normalized)
}

/// Static stats for one weapon
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeaponProfile {
    /// Weapon id, referenced by fire events
    pub name: String,
    /// Base damage per bullet or pellet
    pub damage: i32,
    /// Multiplier applied on head hits, on top of the body-part multiplier
    pub headshot_multiplier: f32,
    /// Rounds per minute
    pub fire_rate: f32,
    /// Range up to which damage is unmodified
    pub effective_range: f32,
    /// Range at which falloff bottoms out
    pub max_range: f32,
    /// Fraction of damage remaining at max range
    pub damage_dropoff: f32,
    /// Armor penetration, 0-100
    pub penetration: f32,
    /// Projectiles per trigger pull; clients report one fire event per pellet
    #[serde(default = "default_pellet_count")]
    pub pellet_count: u32,
    /// Plausibility ceiling for reported hit positions; 0 falls back to
    /// max_range
    #[serde(default)]
    pub max_shoot_distance: f32,
}

fn default_pellet_count() -> u32 {
    1
}

impl WeaponProfile {
    /// The distance beyond which a reported hit is rejected outright
    pub fn shoot_distance_ceiling(&self) -> f32 {
        if self.max_shoot_distance > 0.0 {
            self.max_shoot_distance
        } else {
            self.max_range
        }
    }
}

/// Built-in weapon roster, used when the config file supplies none
pub fn default_profiles() -> Vec<WeaponProfile> {
    vec![
        WeaponProfile {
            name: "ak74".to_string(),
            damage: 35,
            headshot_multiplier: 2.0,
            fire_rate: 650.0,
            effective_range: 120.0,
            max_range: 400.0,
            damage_dropoff: 0.5,
            penetration: 45.0,
            pellet_count: 1,
            max_shoot_distance: 0.0,
        },
        WeaponProfile {
            name: "m9".to_string(),
            damage: 22,
            headshot_multiplier: 1.8,
            fire_rate: 450.0,
            effective_range: 30.0,
            max_range: 120.0,
            damage_dropoff: 0.4,
            penetration: 10.0,
            pellet_count: 1,
            max_shoot_distance: 0.0,
        },
        WeaponProfile {
            name: "mp5".to_string(),
            damage: 26,
            headshot_multiplier: 1.9,
            fire_rate: 800.0,
            effective_range: 60.0,
            max_range: 200.0,
            damage_dropoff: 0.45,
            penetration: 20.0,
            pellet_count: 1,
            max_shoot_distance: 0.0,
        },
        WeaponProfile {
            name: "saiga-12".to_string(),
            damage: 12,
            headshot_multiplier: 1.5,
            fire_rate: 300.0,
            effective_range: 15.0,
            max_range: 60.0,
            damage_dropoff: 0.3,
            penetration: 5.0,
            pellet_count: 8,
            max_shoot_distance: 0.0,
        },
        WeaponProfile {
            name: "svd".to_string(),
            damage: 70,
            headshot_multiplier: 2.2,
            fire_rate: 120.0,
            effective_range: 350.0,
            max_range: 800.0,
            damage_dropoff: 0.6,
            penetration: 70.0,
            pellet_count: 1,
            max_shoot_distance: 0.0,
        },
    ]
}

/// Immutable weapon lookup table, built once at startup
#[derive(Debug, Default)]
pub struct WeaponTable {
    profiles: HashMap<String, WeaponProfile>,
}

impl WeaponTable {
    /// Build a table from config-loaded profiles, validating ids
    pub fn from_profiles(profiles: &[WeaponProfile]) -> Result<Self, WeaponIdError> {
        let mut table = HashMap::new();
        for profile in profiles {
            let id = validate_weapon_id(&profile.name)?;
            let mut profile = profile.clone();
            profile.name = id.clone();
            table.insert(id, profile);
        }
        Ok(Self { profiles: table })
    }

    /// Look up a weapon by id
    pub fn get(&self, id: &str) -> Option<&WeaponProfile> {
        self.profiles.get(id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}
