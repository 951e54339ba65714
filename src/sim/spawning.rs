//! Enemy spawning
//!
//! `RoundDirector` owns the round scheduler and the loaded roster; the
//! `EnemySpawner` decides where new enemies appear.

use bevy::prelude::*;

use crate::combat::events::RoundStateChangedEvent;

use super::components::{
    planar, Collider, ContactDamage, DetectionRange, Enemy, ExperienceReward, GameRng, MoveSpeed,
    Player, RunStats, Team, Velocity,
};
use super::health::Health;
use super::rounds::{EnemyArchetype, RoundCommand, RoundDefinition, RoundScheduler, RoundsConfig};
use super::schedule::{SimClock, SimSchedule};
use super::stats::{StatChannel, StatProfile};

/// Buff id carrying a round's enemy speed multiplier.
pub const ROUND_SPEED_BUFF: &str = "round_speed";

/// Chooses where an enemy appears.
pub trait SpawnProvider: Send + Sync {
    fn spawn_position(&mut self, center: Vec2, rng: &mut GameRng) -> Vec2;
}

/// Places enemies on the edge of a square around the center.
#[derive(Debug, Clone, Copy)]
pub struct EdgeSpawner {
    pub radius: f32,
}

impl SpawnProvider for EdgeSpawner {
    fn spawn_position(&mut self, center: Vec2, rng: &mut GameRng) -> Vec2 {
        let r = self.radius;
        let side = if rng.random_f32() < 0.5 { -r } else { r };
        let along = rng.random_range(-r, r);
        let offset = if rng.random_f32() < 0.5 {
            Vec2::new(side, along)
        } else {
            Vec2::new(along, side)
        };
        center + offset
    }
}

#[derive(Resource)]
pub struct EnemySpawner {
    pub provider: Box<dyn SpawnProvider>,
}

impl EnemySpawner {
    pub fn new(provider: impl SpawnProvider + 'static) -> Self {
        Self {
            provider: Box::new(provider),
        }
    }
}

/// The round scheduler plus the definitions it spawns from.
#[derive(Resource, Debug)]
pub struct RoundDirector {
    pub scheduler: RoundScheduler,
    pub config: RoundsConfig,
}

impl RoundDirector {
    pub fn new(config: RoundsConfig) -> Self {
        Self {
            scheduler: RoundScheduler::new(config.rounds.clone(), config.intermission),
            config,
        }
    }

    /// Pick an archetype from the round roster. None for an empty roster or an
    /// unknown id.
    fn pick_archetype(&self, round: &RoundDefinition, rng: &mut GameRng) -> Option<&EnemyArchetype> {
        if round.roster.is_empty() {
            return None;
        }
        let id = &round.roster[rng.index(round.roster.len())];
        self.config.archetype(id)
    }
}

/// Forward scheduler state changes as events.
pub(crate) fn emit_round_changes(
    commands: Vec<RoundCommand>,
    round_events: &mut EventWriter<RoundStateChangedEvent>,
) {
    for command in commands {
        if let RoundCommand::StateChanged { round, state } = command {
            round_events.send(RoundStateChangedEvent { round, state });
        }
    }
}

/// Spawn one enemy of `archetype` scaled by the round multipliers.
pub fn spawn_enemy(
    commands: &mut Commands,
    archetype: &EnemyArchetype,
    round: &RoundDefinition,
    position: Vec2,
) -> Entity {
    let mut stats = StatProfile::default();
    if (round.enemy_speed_mult - 1.0).abs() > f32::EPSILON {
        stats.set_buff(StatChannel::Speed, ROUND_SPEED_BUFF, round.enemy_speed_mult - 1.0);
    }
    let max_health = (archetype.max_health * round.enemy_health_mult).round().max(1.0);

    commands
        .spawn((
            Enemy {
                archetype: archetype.id.clone(),
                round_number: round.number,
            },
            Team::Enemy,
            Transform::from_translation(position.extend(0.0)),
            Velocity::default(),
            MoveSpeed(archetype.move_speed),
            stats,
            Health::new(max_health, 0.0),
            Collider {
                radius: archetype.radius,
            },
            ContactDamage::new(archetype.contact_damage, archetype.damage_interval),
            ExperienceReward(archetype.experience_value),
            DetectionRange(archetype.detection_range),
        ))
        .id()
}

/// Advance the round scheduler and spawn whatever it asks for.
#[allow(clippy::too_many_arguments)]
pub fn tick_rounds(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut director: ResMut<RoundDirector>,
    mut spawner: ResMut<EnemySpawner>,
    mut rng: ResMut<GameRng>,
    mut stats: ResMut<RunStats>,
    player: Query<&Transform, With<Player>>,
    mut round_events: EventWriter<RoundStateChangedEvent>,
) {
    let center = player.get_single().map(planar).unwrap_or(Vec2::ZERO);
    let mut pending = director.scheduler.tick(clock.delta);

    while !pending.is_empty() {
        let mut follow_up = Vec::new();
        for command in pending {
            match command {
                RoundCommand::Spawn { round_index } => {
                    let Some(round) = director.config.rounds.get(round_index).cloned() else {
                        warn!("Spawn requested for missing round index {}", round_index);
                        follow_up.extend(director.scheduler.spawn_skipped());
                        continue;
                    };
                    let archetype = director.pick_archetype(&round, &mut rng).cloned();
                    match archetype {
                        Some(archetype) => {
                            let position = spawner.provider.spawn_position(center, &mut rng);
                            let entity = spawn_enemy(&mut commands, &archetype, &round, position);
                            trace!("Spawned {} {:?} at {:?}", archetype.id, entity, position);
                            director.scheduler.enemy_spawned();
                        }
                        None => {
                            warn!("Round {} has no spawnable enemy; skipping spawn", round.number);
                            follow_up.extend(director.scheduler.spawn_skipped());
                        }
                    }
                }
                RoundCommand::StateChanged { round, state } => {
                    round_events.send(RoundStateChangedEvent { round, state });
                }
            }
        }
        pending = follow_up;
    }

    stats.rounds_completed = director.scheduler.rounds_completed();
}

/// Despawn every enemy, cancel their pending resumptions and restart from the
/// first round.
pub fn restart_rounds(world: &mut World) {
    let enemies: Vec<Entity> = world
        .query_filtered::<Entity, With<Enemy>>()
        .iter(world)
        .collect();

    {
        let mut schedule = world.resource_mut::<SimSchedule>();
        for entity in &enemies {
            schedule.cancel_owner(*entity);
        }
    }
    for entity in enemies {
        world.despawn(entity);
    }

    let changes = {
        let mut director = world.resource_mut::<RoundDirector>();
        let mut changes = director.scheduler.reset();
        changes.extend(director.scheduler.start());
        changes
    };
    for command in changes {
        if let RoundCommand::StateChanged { round, state } = command {
            world.send_event(RoundStateChangedEvent { round, state });
        }
    }
    info!("Rounds restarted");
}
