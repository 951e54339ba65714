//! Core combat systems
//!
//! Damage requests written during the decision phase are applied here, deaths
//! are resolved and experience is paid out to the killer.

use bevy::prelude::*;

use crate::combat::events::{
    DamageEvent, DeathEvent, ExperienceGainedEvent, HealthChangeCause, HealthChangedEvent,
    LevelUpEvent, RoundStateChangedEvent, RunEndedEvent, RunOutcome,
};
use crate::settings::SimSettings;

use super::components::{
    planar, Collider, ContactDamage, Dashing, Dead, Enemy, ExperienceReward, GameRng, HitFlash,
    PendingOffers, Player, Regeneration, RunState, RunStats, Team, Velocity,
};
use super::health::{DamageOutcome, Health};
use super::items::spawn_potion;
use super::progression::Progression;
use super::schedule::{ResumeAction, SimClock, SimSchedule};
use super::spawning::{emit_round_changes, RoundDirector};

/// Periodic heal for entities with `Regeneration`.
pub fn regenerate_health(
    clock: Res<SimClock>,
    mut regenerating: Query<(Entity, &mut Health, &Regeneration), Without<Dead>>,
    mut health_events: EventWriter<HealthChangedEvent>,
) {
    for (entity, mut health, regen) in regenerating.iter_mut() {
        if health.current() >= health.max() {
            continue;
        }
        let healed = health.heal(regen.per_second * clock.delta);
        if healed > 0.0 {
            health_events.send(HealthChangedEvent {
                entity,
                current: health.current(),
                max: health.max(),
                delta: healed,
                cause: HealthChangeCause::Regeneration,
            });
        }
    }
}

/// Enemies touching the player request contact damage, at most once per
/// `interval` each. A dashing player cannot be touched.
pub fn contact_damage(
    clock: Res<SimClock>,
    player: Query<(Entity, &Transform, &Collider, Has<Dashing>), (With<Player>, Without<Dead>)>,
    mut enemies: Query<(Entity, &Transform, &Collider, &mut ContactDamage), (With<Enemy>, Without<Dead>)>,
    mut damage_events: EventWriter<DamageEvent>,
) {
    let Ok((player_entity, player_transform, player_collider, dashing)) = player.get_single() else {
        return;
    };
    if dashing {
        return;
    }
    let player_pos = planar(player_transform);

    for (enemy_entity, transform, collider, mut contact) in enemies.iter_mut() {
        let reach = player_collider.radius + collider.radius;
        if planar(transform).distance(player_pos) >= reach {
            continue;
        }
        let interval = contact.interval;
        let amount = contact.amount;
        if let Some(event) = contact.cooldown.activate(clock.now, interval, || DamageEvent {
            source: enemy_entity,
            target: player_entity,
            amount,
            magic: None,
        }) {
            damage_events.send(event);
        }
    }
}

/// Apply damage requests through `Health::take_damage`.
pub fn apply_damage(
    mut commands: Commands,
    clock: Res<SimClock>,
    settings: Res<SimSettings>,
    mut schedule: ResMut<SimSchedule>,
    mut stats: ResMut<RunStats>,
    mut damage_events: EventReader<DamageEvent>,
    mut targets: Query<(&mut Health, &Team), Without<Dead>>,
    mut health_events: EventWriter<HealthChangedEvent>,
    mut death_events: EventWriter<DeathEvent>,
) {
    for event in damage_events.read() {
        let Ok((mut health, team)) = targets.get_mut(event.target) else {
            trace!("Damage request for missing or dead target {:?}", event.target);
            continue;
        };

        let outcome = health.take_damage(clock.now, event.amount);
        let dealt = outcome.dealt();
        if outcome != DamageOutcome::Ignored {
            match team {
                Team::Enemy => stats.damage_dealt += dealt,
                Team::Player => stats.damage_taken += dealt,
            }
            health_events.send(HealthChangedEvent {
                entity: event.target,
                current: health.current(),
                max: health.max(),
                delta: -dealt,
                cause: HealthChangeCause::Damage,
            });
        }

        match outcome {
            DamageOutcome::Ignored => {}
            DamageOutcome::Hit { .. } => {
                commands.entity(event.target).insert(HitFlash);
                schedule.schedule(
                    clock.now + settings.enemies.hit_flash,
                    ResumeAction::EndHitFlash(event.target),
                );
            }
            DamageOutcome::Killed { .. } => {
                death_events.send(DeathEvent {
                    victim: event.target,
                    team: *team,
                    killer: Some(event.source),
                    magic: event.magic.clone(),
                });
            }
        }
    }
}

/// Mark the dead, schedule their despawn and update the round and run state.
#[allow(clippy::too_many_arguments)]
pub fn handle_deaths(
    mut commands: Commands,
    clock: Res<SimClock>,
    settings: Res<SimSettings>,
    mut schedule: ResMut<SimSchedule>,
    mut director: ResMut<RoundDirector>,
    mut rng: ResMut<GameRng>,
    mut run_state: ResMut<RunState>,
    mut stats: ResMut<RunStats>,
    mut deaths: EventReader<DeathEvent>,
    mut enemies: Query<(&Enemy, &Transform, &mut Velocity)>,
    mut round_events: EventWriter<RoundStateChangedEvent>,
    mut run_events: EventWriter<RunEndedEvent>,
) {
    for death in deaths.read() {
        commands.entity(death.victim).insert(Dead);

        match death.team {
            Team::Enemy => {
                stats.enemies_killed += 1;
                schedule.schedule(
                    clock.now + settings.enemies.death_grace,
                    ResumeAction::Despawn(death.victim),
                );

                let Ok((enemy, transform, mut velocity)) = enemies.get_mut(death.victim) else {
                    continue;
                };
                velocity.0 = Vec2::ZERO;
                debug!("{} {:?} died", enemy.archetype, death.victim);

                let changes = director.scheduler.enemy_killed(enemy.round_number);
                emit_round_changes(changes, &mut round_events);
                stats.rounds_completed = director.scheduler.rounds_completed();

                if rng.chance(settings.potions.drop_chance) {
                    spawn_potion(&mut commands, planar(transform), &settings.potions);
                }
            }
            Team::Player => {
                if run_state.is_finished() {
                    continue;
                }
                info!("Player died after {:.1}s", clock.now);
                *run_state = RunState::GameOver;
                run_events.send(RunEndedEvent {
                    outcome: RunOutcome::Defeat,
                    elapsed: clock.now,
                });
            }
        }
    }
}

/// Pay experience to killers and resolve their level-ups.
///
/// Each level reached restores health fully and queues one offer set.
#[allow(clippy::too_many_arguments)]
pub fn award_experience(
    mut deaths: EventReader<DeathEvent>,
    rewards: Query<&ExperienceReward>,
    mut killers: Query<(&mut Progression, &mut Health), Without<Dead>>,
    mut pending: ResMut<PendingOffers>,
    mut stats: ResMut<RunStats>,
    mut experience_events: EventWriter<ExperienceGainedEvent>,
    mut level_events: EventWriter<LevelUpEvent>,
    mut health_events: EventWriter<HealthChangedEvent>,
) {
    for death in deaths.read() {
        let Some(killer) = death.killer else {
            continue;
        };
        let Ok(reward) = rewards.get(death.victim) else {
            continue;
        };
        let Ok((mut progression, mut health)) = killers.get_mut(killer) else {
            continue;
        };

        let reached = progression.gain_experience(reward.0);
        experience_events.send(ExperienceGainedEvent {
            entity: killer,
            amount: reward.0,
            experience: progression.experience,
            experience_to_next_level: progression.experience_to_next_level,
        });

        for level in reached {
            info!("Level up! Now level {}", level);
            let restored = health.restore_full();
            if restored > 0.0 {
                health_events.send(HealthChangedEvent {
                    entity: killer,
                    current: health.current(),
                    max: health.max(),
                    delta: restored,
                    cause: HealthChangeCause::LevelUp,
                });
            }
            level_events.send(LevelUpEvent { entity: killer, level });
            pending.queued_levels.push_back(level);
            stats.highest_level = stats.highest_level.max(level);
        }
    }
}
