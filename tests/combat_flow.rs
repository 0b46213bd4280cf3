//! End-to-end combat scenarios driving the authority directly
//!
//! Each test plays out one firefight shape: sustained fire against the
//! rate gate, shots at the edge of weapon reach, a kill followed by a
//! respawn, and a bleed-out. Rolls are pinned through the injectable
//! randomness source so outcomes are exact.

use std::sync::Arc;
use std::time::{Duration, Instant};

use glam::Vec3;

use combatd::combat::{
    BodyPart, CombatAuthority, CombatEvent, DamageType, FireEvent, FixedRng, HitReport,
};
use combatd::config::CombatConfig;
use combatd::weapons::WeaponTable;

fn authority_with(config: CombatConfig, rng: FixedRng) -> CombatAuthority {
    let weapons = WeaponTable::from_profiles(&config.weapons).unwrap();
    CombatAuthority::with_rng(Arc::new(config), weapons, Box::new(rng))
}

fn fire(weapon: &str, target: &str, body_part: BodyPart, position: Vec3) -> FireEvent {
    FireEvent {
        weapon: weapon.to_string(),
        hit: Some(HitReport {
            target: target.to_string(),
            body_part,
            position,
            normal: None,
        }),
    }
}

fn connect_pair(auth: &mut CombatAuthority, now: Instant, separation: f32) {
    auth.connect("attacker");
    auth.connect("victim");
    auth.report_position("attacker", Vec3::ZERO, now);
    auth.report_position("victim", Vec3::new(0.0, 0.0, separation), now);
}

#[test]
fn test_sustained_fire_trips_the_rate_gate() {
    // Tall health pool so every accepted shot stays observable
    let mut config = CombatConfig::default();
    config.max_health = 1000;
    config.rate_limit.max_fire_rate_rpm = 600.0;
    config.rate_limit.burst_tolerance = 10;
    let mut auth = authority_with(config, FixedRng(false));

    let base = Instant::now();
    connect_pair(&mut auth, base, 50.0);
    let aim = Vec3::new(0.0, 0.0, 50.0);

    // Ten shots land inside one 0.1s window: the first anchors the window,
    // the next nine consume burst tolerance
    for i in 0..10u64 {
        let at = base + Duration::from_millis(i * 5);
        let events = auth.handle_fire_event("attacker", fire("ak74", "victim", BodyPart::Torso, aim), at);
        assert!(
            events.iter().any(|e| matches!(e, CombatEvent::HitApplied { .. })),
            "shot {} should land",
            i + 1
        );
    }
    assert_eq!(auth.combatant("victim").unwrap().ledger.health(), 650);

    // The eleventh is rejected silently
    let events = auth.handle_fire_event(
        "attacker",
        fire("ak74", "victim", BodyPart::Torso, aim),
        base + Duration::from_millis(55),
    );
    assert!(events.is_empty());
    assert_eq!(auth.combatant("victim").unwrap().ledger.health(), 650);

    // Once the interval is satisfied, fire lands again
    let events = auth.handle_fire_event(
        "attacker",
        fire("ak74", "victim", BodyPart::Torso, aim),
        base + Duration::from_millis(200),
    );
    assert!(!events.is_empty());
    assert_eq!(auth.combatant("victim").unwrap().ledger.health(), 615);
}

#[test]
fn test_shots_beyond_weapon_reach_are_dropped() {
    let mut config = CombatConfig::default();
    for weapon in &mut config.weapons {
        weapon.max_shoot_distance = 1000.0;
    }
    let mut auth = authority_with(config, FixedRng(false));

    let now = Instant::now();
    auth.connect("attacker");
    auth.connect("victim");
    auth.report_position("attacker", Vec3::ZERO, now);
    auth.report_position("victim", Vec3::new(0.0, 0.0, 999.0), now);

    // 1001 exceeds the 1000 ceiling: rejected, no damage
    let events = auth.handle_fire_event(
        "attacker",
        fire("ak74", "victim", BodyPart::Torso, Vec3::new(0.0, 0.0, 1001.0)),
        now,
    );
    assert!(events.is_empty());
    assert_eq!(auth.combatant("victim").unwrap().ledger.health(), 100);

    // 999 is inside the ceiling; far past max range the ak74 bottoms out
    // at its dropoff floor: floor(35 * 0.5) = 17
    let events = auth.handle_fire_event(
        "attacker",
        fire("ak74", "victim", BodyPart::Torso, Vec3::new(0.0, 0.0, 999.0)),
        now + Duration::from_millis(200),
    );
    assert!(!events.is_empty());
    assert_eq!(auth.combatant("victim").unwrap().ledger.health(), 83);
}

#[test]
fn test_kill_then_respawn_restores_a_clean_slate() {
    let mut auth = authority_with(CombatConfig::default(), FixedRng(true));
    let now = Instant::now();
    connect_pair(&mut auth, now, 50.0);
    let aim = Vec3::new(0.0, 0.0, 50.0);

    // Forced rolls: the first torso hit also applies a bleed stack
    auth.handle_fire_event("attacker", fire("ak74", "victim", BodyPart::Torso, aim), now);
    // A heavy limb hit fractures the leg (svd: 70 * 0.7 = 49 applied)
    auth.handle_fire_event(
        "attacker",
        fire("svd", "victim", BodyPart::LeftLeg, aim),
        now + Duration::from_millis(600),
    );
    let ledger = &auth.combatant("victim").unwrap().ledger;
    assert_eq!(ledger.health(), 16);
    assert!(ledger.bleeding_stacks() > 0);
    assert!(ledger.is_fractured(combatd::combat::Limb::LeftLeg));

    // Finish with a headshot; both death and kill records come out
    let events = auth.handle_fire_event(
        "attacker",
        fire("m9", "victim", BodyPart::Head, aim),
        now + Duration::from_millis(1200),
    );
    assert!(events.iter().any(|e| matches!(
        e,
        CombatEvent::Death { killer: Some(k), .. } if k == "attacker"
    )));
    assert!(events.iter().any(|e| matches!(
        e,
        CombatEvent::Kill { attacker, target, .. } if attacker == "attacker" && target == "victim"
    )));
    assert!(!auth.combatant("victim").unwrap().ledger.is_alive());

    // Respawn: full health, all status cleared, alive again
    let events = auth.respawn("victim");
    assert!(!events.is_empty());
    let ledger = &auth.combatant("victim").unwrap().ledger;
    assert!(ledger.is_alive());
    assert_eq!(ledger.health(), 100);
    assert_eq!(ledger.bleeding_stacks(), 0);
    assert!(!ledger.is_fractured(combatd::combat::Limb::LeftLeg));
}

#[test]
fn test_bleed_out_kills_without_a_killer() {
    let mut auth = authority_with(CombatConfig::default(), FixedRng(true));
    let base = Instant::now();
    connect_pair(&mut auth, base, 50.0);

    // One svd torso hit: 70 damage, forced bleed stack
    auth.handle_fire_event(
        "attacker",
        fire("svd", "victim", BodyPart::Torso, Vec3::new(0.0, 0.0, 50.0)),
        base,
    );
    let ledger = &auth.combatant("victim").unwrap().ledger;
    assert_eq!(ledger.health(), 30);
    assert_eq!(ledger.bleeding_stacks(), 1);

    // One stack bleeds 2 hp per simulated second; fifteen seconds finish
    // the victim off
    let mut death = None;
    for i in 1..=20u64 {
        let events = auth.tick(1.0, base + Duration::from_secs(i));
        if let Some(event) = events
            .iter()
            .find(|e| matches!(e, CombatEvent::Death { .. }))
        {
            death = Some((i, event.clone()));
            break;
        }
    }

    let (seconds, event) = death.expect("victim should bleed out");
    assert_eq!(seconds, 15);
    assert!(matches!(
        event,
        CombatEvent::Death {
            killer: None,
            damage_type: DamageType::Bleeding,
            ..
        }
    ));
}

#[test]
fn test_armored_victim_takes_reduced_damage() {
    let mut auth = authority_with(CombatConfig::default(), FixedRng(false));
    let now = Instant::now();
    connect_pair(&mut auth, now, 50.0);
    auth.set_armor_class("victim", 6);

    // ak74 vs class 6: 35 * (1 - 0.65 * (1 - 0.45)) = 22.48 -> 22
    auth.handle_fire_event(
        "attacker",
        fire("ak74", "victim", BodyPart::Torso, Vec3::new(0.0, 0.0, 50.0)),
        now,
    );
    assert_eq!(auth.combatant("victim").unwrap().ledger.health(), 78);
}
