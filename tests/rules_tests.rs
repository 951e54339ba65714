//! Tests for the pure game rules
//!
//! These tests verify that:
//! - Buffs aggregate per channel with floors
//! - Health ignores damage inside the invulnerability window and stays bounded
//! - Cooldowns fire once per window
//! - Experience carries over across multi-level gains
//! - Upgrade offers are distinct, valid and uniformly shuffled
//! - Rounds spawn on schedule and complete early on a full clear

use std::collections::{HashMap, HashSet};
use std::path::Path;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use spellswarm::sim::cooldown::CooldownActivator;
use spellswarm::sim::health::{DamageOutcome, Health};
use spellswarm::sim::magic::{MagicId, Spellbook};
use spellswarm::sim::magic_config::{MagicCatalog, DEFAULT_MAGICS_PATH};
use spellswarm::sim::progression::Progression;
use spellswarm::sim::rounds::{RoundCommand, RoundDefinition, RoundScheduler, RoundState};
use spellswarm::sim::stats::{StatChannel, StatProfile, SPEED_FLOOR};
use spellswarm::sim::upgrades::{apply_offer, generate_offers, UpgradeApplied, UpgradeKind};

fn load_catalog() -> MagicCatalog {
    MagicCatalog::load_from_file(Path::new(DEFAULT_MAGICS_PATH)).expect("magics.ron should load")
}

// =============================================================================
// Stat Aggregation Tests
// =============================================================================

#[test]
fn test_buffs_sum_per_channel() {
    let mut stats = StatProfile::default();
    stats.set_buff(StatChannel::Damage, "ring", 0.25);
    stats.set_buff(StatChannel::Damage, "tome", 0.5);
    stats.set_buff(StatChannel::Area, "ring", 0.1);

    assert!((stats.damage() - 1.75).abs() < 1e-6);
    assert!((stats.area() - 1.1).abs() < 1e-6);
    assert_eq!(stats.speed(), 1.0, "Untouched channels keep their base");
}

#[test]
fn test_same_buff_id_replaces_value() {
    let mut stats = StatProfile::default();
    stats.set_buff(StatChannel::Speed, "haste", 0.5);
    stats.set_buff(StatChannel::Speed, "haste", 0.2);

    assert_eq!(stats.buff_count(StatChannel::Speed), 1);
    assert!((stats.speed() - 1.2).abs() < 1e-6);
}

#[test]
fn test_speed_floor_applies() {
    let mut stats = StatProfile::default();
    stats.set_buff(StatChannel::Speed, "mud", -5.0);
    assert_eq!(stats.speed(), SPEED_FLOOR);
}

#[test]
fn test_remove_buff_reports_channels() {
    let mut stats = StatProfile::default();
    stats.set_buff(StatChannel::Damage, "ring", 0.25);
    stats.set_buff(StatChannel::Area, "ring", 0.1);

    let removed = stats.remove_buff("ring");
    assert_eq!(removed.as_slice(), &[StatChannel::Damage, StatChannel::Area]);
    assert_eq!(stats.damage(), 1.0);

    assert!(stats.remove_buff("unknown").is_empty(), "Unknown ids are a no-op");
}

// =============================================================================
// Health Tests
// =============================================================================

#[test]
fn test_damage_during_invulnerability_is_ignored() {
    let mut health = Health::new(50.0, 1.0);

    assert_eq!(health.take_damage(0.0, 10.0), DamageOutcome::Hit { dealt: 10.0 });
    assert_eq!(health.current(), 40.0);

    assert_eq!(health.take_damage(0.5, 10.0), DamageOutcome::Ignored);
    assert_eq!(health.current(), 40.0);

    assert_eq!(health.take_damage(1.0, 10.0), DamageOutcome::Hit { dealt: 10.0 });
    assert_eq!(health.current(), 30.0);
}

#[test]
fn test_lethal_damage_kills_once() {
    let mut health = Health::new(30.0, 0.0);
    assert_eq!(health.take_damage(0.0, 100.0), DamageOutcome::Killed { dealt: 30.0 });
    assert!(health.is_dead());
    assert_eq!(health.take_damage(1.0, 10.0), DamageOutcome::Ignored);
    assert_eq!(health.heal(50.0), 0.0, "The dead cannot be healed");
}

#[test]
fn test_negative_amounts_are_ignored() {
    let mut health = Health::new(100.0, 0.0);
    assert_eq!(health.take_damage(0.0, -20.0), DamageOutcome::Ignored);
    assert_eq!(health.heal(-20.0), 0.0);
    assert_eq!(health.current(), 100.0);
}

#[test]
fn test_health_stays_bounded() {
    let mut rng = StdRng::seed_from_u64(99);
    let mut health = Health::new(80.0, 0.0);
    let mut now = 0.0;

    for _ in 0..1000 {
        now += 0.1;
        let amount = rng.gen_range(-30.0..60.0);
        if rng.gen_bool(0.5) {
            health.take_damage(now, amount);
        } else {
            health.heal(amount);
        }
        assert!(health.current() >= 0.0 && health.current() <= health.max());
        if health.is_dead() {
            health = Health::new(80.0, 0.0);
        }
    }
}

#[test]
fn test_increase_max_keeps_percentage() {
    let mut health = Health::new(100.0, 0.0);
    health.take_damage(0.0, 50.0);
    health.increase_max(100.0);
    assert_eq!(health.max(), 200.0);
    assert!((health.current() - 100.0).abs() < 1e-4);
}

// =============================================================================
// Cooldown Tests
// =============================================================================

#[test]
fn test_double_activation_within_cooldown_fires_once() {
    let mut cooldown = CooldownActivator::new();
    let mut fired = 0;

    cooldown.activate(0.0, 1.0, || fired += 1);
    cooldown.activate(0.5, 1.0, || fired += 1);
    assert_eq!(fired, 1);

    cooldown.activate(1.0, 1.0, || fired += 1);
    assert_eq!(fired, 2);
}

#[test]
fn test_shorter_duration_takes_effect_on_next_check() {
    let mut cooldown = CooldownActivator::new();
    cooldown.trigger(0.0);
    assert!(!cooldown.is_ready(0.6, 1.0));
    assert!(cooldown.is_ready(0.6, 0.5), "Duration is re-read on every check");
}

// =============================================================================
// Progression Tests
// =============================================================================

#[test]
fn test_gain_spanning_two_thresholds() {
    let mut progression = Progression::new(10, 5);
    let reached = progression.gain_experience(35);

    // 35 - 10 - (10 + 2 * 5)
    assert_eq!(reached.as_slice(), &[2, 3], "Exactly two level-ups");
    assert_eq!(progression.level, 3);
    assert_eq!(progression.experience, 5);
    assert!(progression.experience < progression.experience_to_next_level);
}

#[test]
fn test_experience_never_reaches_threshold_after_gain() {
    let mut progression = Progression::new(10, 5);
    for amount in [3, 17, 40, 1, 250, 9] {
        progression.gain_experience(amount);
        assert!(progression.experience < progression.experience_to_next_level);
    }
}

// =============================================================================
// Upgrade Offer Tests
// =============================================================================

#[test]
fn test_offers_are_distinct_new_abilities() {
    let catalog = load_catalog();
    let spellbook = Spellbook::default();
    let mut rng = StdRng::seed_from_u64(1);

    let offers = generate_offers(&catalog, &spellbook, 3, &mut rng);
    assert_eq!(offers.len(), 3);
    assert!(offers.iter().all(|o| o.kind == UpgradeKind::NewAbility));
    let unique: HashSet<_> = offers.iter().map(|o| o.magic.clone()).collect();
    assert_eq!(unique.len(), 3, "Offers must be distinct");
}

fn chi_square(catalog: &MagicCatalog, counts: &HashMap<MagicId, u32>, expected: f64) -> f64 {
    catalog
        .iter()
        .map(|def| {
            let observed = *counts.get(&def.id).unwrap_or(&0) as f64;
            (observed - expected).powi(2) / expected
        })
        .sum()
}

#[test]
fn test_offer_selection_is_uniform() {
    let catalog = load_catalog();
    assert_eq!(catalog.len(), 5, "Test assumes the shipped five-magic catalog");
    let spellbook = Spellbook::default();
    let mut rng = StdRng::seed_from_u64(12345);

    let trials = 10_000;
    let mut included: HashMap<MagicId, u32> = HashMap::new();
    let mut first: HashMap<MagicId, u32> = HashMap::new();
    for _ in 0..trials {
        let offers = generate_offers(&catalog, &spellbook, 3, &mut rng);
        assert_eq!(offers.len(), 3);
        for offer in &offers {
            *included.entry(offer.magic.clone()).or_insert(0) += 1;
        }
        *first.entry(offers[0].magic.clone()).or_insert(0) += 1;
    }

    // 4 degrees of freedom, p = 0.001
    let inclusion = chi_square(&catalog, &included, trials as f64 * 3.0 / 5.0);
    assert!(inclusion < 18.47, "chi-square {} rejects uniform inclusion", inclusion);
    let order = chi_square(&catalog, &first, trials as f64 / 5.0);
    assert!(order < 18.47, "chi-square {} rejects uniform order", order);
}

#[test]
fn test_capped_magics_are_not_offered() {
    let catalog = load_catalog();
    let bolt = MagicId::new("arcane_bolt");
    let mut spellbook = Spellbook::default();
    let definition = catalog.get(&bolt).expect("arcane_bolt is in the catalog");
    spellbook.acquire(definition);
    while spellbook.level_up(&bolt).is_some() {}

    let mut rng = StdRng::seed_from_u64(5);
    let offers = generate_offers(&catalog, &spellbook, 10, &mut rng);
    assert_eq!(offers.len(), 4, "Only the four unacquired magics remain");
    assert!(offers.iter().all(|o| o.magic != bolt));
}

#[test]
fn test_applying_offers() {
    let catalog = load_catalog();
    let mut spellbook = Spellbook::default();
    let mut rng = StdRng::seed_from_u64(9);

    let offer = generate_offers(&catalog, &spellbook, 1, &mut rng).remove(0);
    assert_eq!(
        apply_offer(&offer, &catalog, &mut spellbook),
        UpgradeApplied::Acquired(offer.magic.clone())
    );
    assert_eq!(apply_offer(&offer, &catalog, &mut spellbook), UpgradeApplied::Stale);

    let level_up = generate_offers(&catalog, &spellbook, 10, &mut rng)
        .into_iter()
        .find(|o| o.kind == UpgradeKind::LevelUp)
        .expect("the acquired magic can level up");
    assert_eq!(
        apply_offer(&level_up, &catalog, &mut spellbook),
        UpgradeApplied::LeveledUp {
            magic: offer.magic.clone(),
            level: 2
        }
    );
}

// =============================================================================
// Round Scheduler Tests
// =============================================================================

const TICK: f32 = 1.0 / 60.0;

fn scenario_round() -> RoundDefinition {
    RoundDefinition {
        number: 1,
        enemy_count: 5,
        roster: vec!["slime".to_string()],
        spawn_interval: 1.0,
        duration: 120.0,
        enemy_health_mult: 1.0,
        enemy_speed_mult: 1.0,
    }
}

#[test]
fn test_round_spawns_quota_then_completes_on_clear() {
    let mut scheduler = RoundScheduler::new(vec![scenario_round()], 3.0);
    scheduler.start();

    let mut spawned = 0;
    for _ in 0..(5.0 / TICK) as usize {
        for command in scheduler.tick(TICK) {
            if matches!(command, RoundCommand::Spawn { .. }) {
                scheduler.enemy_spawned();
                spawned += 1;
            }
        }
    }

    assert_eq!(spawned, 5);
    assert_eq!(scheduler.spawn_queue(), 0);
    assert_eq!(scheduler.state(), RoundState::Active);
    assert_eq!(scheduler.enemies_on_field(), 5);

    for _ in 0..4 {
        assert!(scheduler.enemy_killed(1).is_empty());
    }
    let out = scheduler.enemy_killed(1);
    assert_eq!(
        out,
        vec![RoundCommand::StateChanged {
            round: 1,
            state: RoundState::Completing
        }]
    );
    assert_eq!(scheduler.remaining_enemies(), 0);
}

#[test]
fn test_round_timer_caps_with_survivors() {
    let mut round = scenario_round();
    round.duration = 10.0;
    let mut scheduler = RoundScheduler::new(vec![round], 3.0);
    scheduler.start();

    let mut state = scheduler.state();
    for _ in 0..(11.0 / TICK) as usize {
        scheduler.tick(TICK);
        state = scheduler.state();
        if state != RoundState::Spawning && state != RoundState::Active {
            break;
        }
    }
    assert_eq!(state, RoundState::Completing);
    assert!(scheduler.remaining_enemies() > 0, "Nobody was killed");
}
