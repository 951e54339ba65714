//! Movement: player intent and dash, enemy chase with separation, and
//! velocity integration.

use bevy::prelude::*;

use crate::settings::SimSettings;

use super::components::{
    planar, DashAbility, Dashing, Dead, DetectionRange, Enemy, InputIntent, MoveSpeed, Player,
    Velocity,
};
use super::schedule::{ResumeAction, SimClock, SimSchedule};
use super::stats::StatProfile;

/// Move input shorter than this does not steer a dash.
pub const DASH_INPUT_DEADZONE: f32 = 0.1;

/// Push away from neighbours closer than `distance`, stronger when closer,
/// averaged over the neighbours involved.
pub fn separation_force(
    position: Vec2,
    neighbours: impl IntoIterator<Item = Vec2>,
    distance: f32,
) -> Vec2 {
    if distance <= 0.0 {
        return Vec2::ZERO;
    }
    let mut force = Vec2::ZERO;
    let mut count = 0;
    for other in neighbours {
        let gap = position.distance(other);
        if gap < distance {
            let strength = (distance - gap) / distance;
            force += (position - other).normalize_or_zero() * strength;
            count += 1;
        }
    }
    if count > 0 {
        force / count as f32
    } else {
        force
    }
}

/// Turn the sampled intent into player velocity and start dashes.
pub fn apply_player_intent(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut intent: ResMut<InputIntent>,
    mut schedule: ResMut<SimSchedule>,
    mut player: Query<
        (Entity, &MoveSpeed, &StatProfile, &mut Velocity, &mut DashAbility, Option<&Dashing>),
        (With<Player>, Without<Dead>),
    >,
) {
    let dash_requested = std::mem::take(&mut intent.dash);
    let Ok((entity, move_speed, stats, mut velocity, mut dash, dashing)) = player.get_single_mut() else {
        return;
    };

    if let Some(dashing) = dashing {
        velocity.0 = dashing.direction * dash.speed();
        return;
    }

    let direction = intent.move_vector.clamp_length_max(1.0);
    if direction.x != 0.0 {
        dash.facing = Vec2::new(direction.x.signum(), 0.0);
    }
    if dash_requested && dash.cooldown.is_ready(clock.now, dash.cooldown_secs) {
        // Standing still dashes the way the player last faced
        let heading = if direction.length() < DASH_INPUT_DEADZONE {
            dash.facing
        } else {
            direction.normalize()
        };
        debug!("Dash started towards {:?}", heading);
        commands.entity(entity).insert(Dashing { direction: heading });
        velocity.0 = heading * dash.speed();
        schedule.schedule(clock.now + dash.duration, ResumeAction::EndDash(entity));
        return;
    }

    velocity.0 = direction * move_speed.0 * stats.speed();
}

/// Enemies chase a player inside their detection range while keeping apart
/// from each other. Positions are read from a snapshot taken before any
/// velocity changes.
pub fn steer_enemies(
    settings: Res<SimSettings>,
    player: Query<&Transform, (With<Player>, Without<Dead>)>,
    mut enemies: Query<
        (Entity, &Transform, &MoveSpeed, &StatProfile, &DetectionRange, &mut Velocity),
        (With<Enemy>, Without<Dead>),
    >,
) {
    let player_pos = player.get_single().ok().map(planar);
    let snapshot: Vec<(Entity, Vec2)> = enemies
        .iter()
        .map(|(entity, transform, ..)| (entity, planar(transform)))
        .collect();
    let spacing = settings.enemies.separation_distance;
    let weight = settings.enemies.separation_weight;

    for (entity, transform, move_speed, stats, detection, mut velocity) in enemies.iter_mut() {
        let position = planar(transform);
        let Some(target) = player_pos.filter(|p| p.distance(position) <= detection.0) else {
            velocity.0 = Vec2::ZERO;
            continue;
        };

        let to_player = (target - position).normalize_or_zero();
        let neighbours = snapshot
            .iter()
            .filter(|(other, _)| *other != entity)
            .map(|(_, pos)| *pos);
        let separation = separation_force(position, neighbours, spacing);
        let heading = (to_player + separation * weight).normalize_or_zero();
        velocity.0 = heading * move_speed.0 * stats.speed();
    }
}

/// Move every living entity by its velocity.
pub fn integrate_velocity(
    clock: Res<SimClock>,
    mut movers: Query<(&mut Transform, &Velocity), Without<Dead>>,
) {
    for (mut transform, velocity) in movers.iter_mut() {
        if velocity.0 != Vec2::ZERO {
            transform.translation += (velocity.0 * clock.delta).extend(0.0);
        }
    }
}
