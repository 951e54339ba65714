//! Combat notifications
//!
//! Registers the simulation events and records them into the `CombatLog`:
//! - Damage requests and health changes
//! - Deaths, experience and level-ups
//! - Magic casts, acquisitions and upgrades
//! - Round and run transitions

use bevy::prelude::*;

pub mod events;
pub mod log;

use events::*;
use log::{CombatLog, CombatLogEventType};

use crate::sim::components::{Enemy, Player, Team};
use crate::sim::schedule::SimClock;
use crate::sim::systems::SimPhase;

/// Plugin for simulation events and the combat log
pub struct CombatPlugin;

impl Plugin for CombatPlugin {
    fn build(&self, app: &mut App) {
        app
            // Requests
            .add_event::<DamageEvent>()
            .add_event::<UpgradeSelectedEvent>()
            // Notifications
            .add_event::<HealthChangedEvent>()
            .add_event::<DeathEvent>()
            .add_event::<ExperienceGainedEvent>()
            .add_event::<LevelUpEvent>()
            .add_event::<RoundStateChangedEvent>()
            .add_event::<MagicCastEvent>()
            .add_event::<MagicAcquiredEvent>()
            .add_event::<MagicLevelUpEvent>()
            .add_event::<UpgradeOffersEvent>()
            .add_event::<RunEndedEvent>()
            // Resources
            .init_resource::<CombatLog>()
            // Runs every tick, paused or not, so offers and run results are logged
            .add_systems(
                FixedUpdate,
                (record_damage, record_combat_log)
                    .chain()
                    .after(SimPhase::Integration),
            );
    }
}

fn describe(entity: Entity, names: &Query<(Has<Player>, Option<&Enemy>)>) -> String {
    match names.get(entity) {
        Ok((true, _)) => "Player".to_string(),
        Ok((false, Some(enemy))) => format!("{} ({:?})", enemy.archetype, entity),
        _ => format!("{:?}", entity),
    }
}

/// Attribute applied damage to its magic. Only health changes caused by
/// damage count, so hits absorbed by invulnerability are not credited.
pub fn record_damage(
    mut damage_events: EventReader<DamageEvent>,
    mut health_events: EventReader<HealthChangedEvent>,
    mut combat_log: ResMut<CombatLog>,
    clock: Res<SimClock>,
    names: Query<(Has<Player>, Option<&Enemy>)>,
) {
    combat_log.run_time = clock.now;

    let mut dealt_to: Vec<(Entity, f32)> = health_events
        .read()
        .filter(|e| e.cause == HealthChangeCause::Damage)
        .map(|e| (e.entity, -e.delta))
        .collect();

    for event in damage_events.read() {
        let Some(index) = dealt_to.iter().position(|(target, _)| *target == event.target) else {
            continue;
        };
        let (_, dealt) = dealt_to.remove(index);
        let source = event
            .magic
            .as_ref()
            .map_or("contact", |magic| magic.as_str())
            .to_string();
        combat_log.record_damage(&source, dealt);
        let message = format!(
            "{} hit {} with {} for {:.1}",
            describe(event.source, &names),
            describe(event.target, &names),
            source,
            dealt
        );
        combat_log.log(CombatLogEventType::Damage, message);
    }
}

/// Record every notification into the combat log
#[allow(clippy::too_many_arguments)]
pub fn record_combat_log(
    clock: Res<SimClock>,
    mut combat_log: ResMut<CombatLog>,
    mut health_events: EventReader<HealthChangedEvent>,
    mut deaths: EventReader<DeathEvent>,
    mut level_ups: EventReader<LevelUpEvent>,
    mut rounds: EventReader<RoundStateChangedEvent>,
    mut casts: EventReader<MagicCastEvent>,
    mut acquired: EventReader<MagicAcquiredEvent>,
    mut magic_levels: EventReader<MagicLevelUpEvent>,
    mut offers: EventReader<UpgradeOffersEvent>,
    mut run_ended: EventReader<RunEndedEvent>,
    names: Query<(Has<Player>, Option<&Enemy>)>,
) {
    combat_log.run_time = clock.now;

    // Regeneration ticks every frame and is left out
    for event in health_events
        .read()
        .filter(|e| e.delta > 0.0 && e.cause != HealthChangeCause::Regeneration)
    {
        let message = format!(
            "{} restored {:.1} health ({:?}), now {:.0}/{:.0}",
            describe(event.entity, &names),
            event.delta,
            event.cause,
            event.current,
            event.max
        );
        combat_log.log(CombatLogEventType::Healing, message);
    }

    for event in casts.read() {
        let target = event
            .target
            .map_or_else(|| "no target".to_string(), |t| describe(t, &names));
        combat_log.log(
            CombatLogEventType::MagicCast,
            format!("{} cast {} at {}", describe(event.caster, &names), event.magic, target),
        );
    }

    for event in deaths.read() {
        if event.team == Team::Enemy {
            combat_log.record_kill();
        }
        let killer = event
            .killer
            .map_or_else(|| "unknown".to_string(), |k| describe(k, &names));
        combat_log.log(
            CombatLogEventType::Death,
            format!("{} was killed by {}", describe(event.victim, &names), killer),
        );
    }

    for event in level_ups.read() {
        combat_log.log(
            CombatLogEventType::LevelUp,
            format!("{} reached level {}", describe(event.entity, &names), event.level),
        );
    }

    for event in acquired.read() {
        combat_log.log(CombatLogEventType::Upgrade, format!("Acquired {}", event.magic));
    }

    for event in magic_levels.read() {
        combat_log.log(
            CombatLogEventType::Upgrade,
            format!("{} is now level {}", event.magic, event.level),
        );
    }

    for event in offers.read() {
        let choices: Vec<&str> = event.options.iter().map(|o| o.magic.as_str()).collect();
        combat_log.log(
            CombatLogEventType::Upgrade,
            format!("Level {} offers: {}", event.level, choices.join(", ")),
        );
    }

    for event in rounds.read() {
        combat_log.log(
            CombatLogEventType::Round,
            format!("Round {} is now {:?}", event.round, event.state),
        );
    }

    for event in run_ended.read() {
        combat_log.log(
            CombatLogEventType::RunEvent,
            format!("Run ended: {:?} after {:.1}s", event.outcome, event.elapsed),
        );
    }
}
