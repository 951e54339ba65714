//! Magic casting and hit tests
//!
//! Every acquired magic auto-casts when its cooldown is ready and it has
//! something to hit. The shape decides what "something to hit" means:
//! - Projectile: nearest enemy inside the detection radius; the bolt is spent
//!   on the first enemy its swept path touches
//! - Orbit: a ball circling the owner; damages every enemy it overlaps each
//!   time the cooldown is ready
//! - Slash: any enemy inside the effective area; each enemy inside the volume
//!   is hit once per activation
//!
//! A cast without a target does not consume the cooldown.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::events::{DamageEvent, MagicCastEvent};

use super::components::{
    planar, Collider, Dead, Enemy, OrbitBall, Player, Projectile, SlashVolume, Velocity,
};
use super::magic::Spellbook;
use super::magic_config::{MagicCatalog, MagicShape};
use super::schedule::{SimClock, SimSchedule};
use super::stats::StatProfile;
use super::targeting::{find_nearest, first_swept_hit};

/// Where an orbit ball sits for a given angle (degrees) and radius. The
/// circle is centred `height` above the owner on the plane.
pub fn orbit_position(owner: Vec2, angle: f32, radius: f32, height: f32) -> Vec2 {
    owner + Vec2::Y * height + Vec2::from_angle(angle.to_radians()) * radius
}

/// Fire projectile and slash magics whose cooldown is ready.
pub fn cast_magics(
    mut commands: Commands,
    clock: Res<SimClock>,
    catalog: Res<MagicCatalog>,
    mut casters: Query<(Entity, &Transform, &StatProfile, &mut Spellbook), (With<Player>, Without<Dead>)>,
    enemies: Query<(Entity, &Transform), (With<Enemy>, Without<Dead>)>,
    mut cast_events: EventWriter<MagicCastEvent>,
) {
    let targets: Vec<(Entity, Vec2)> = enemies
        .iter()
        .map(|(entity, transform)| (entity, planar(transform)))
        .collect();

    for (caster, transform, stats, mut spellbook) in casters.iter_mut() {
        let origin = planar(transform);

        for magic in spellbook.iter_mut() {
            let Some(def) = catalog.get(&magic.id) else {
                warn!("No definition for magic '{}'", magic.id);
                continue;
            };
            let cooldown = magic.effective_cooldown(def, stats);
            if !magic.cooldown.is_ready(clock.now, cooldown) {
                continue;
            }

            match def.shape {
                MagicShape::Projectile {
                    speed,
                    lifetime,
                    radius,
                    detection_radius,
                } => {
                    let Some((target, target_pos)) =
                        find_nearest(origin, targets.iter().copied(), detection_radius)
                    else {
                        continue;
                    };
                    let damage = magic.effective_damage(def, stats);
                    let hit_radius = radius * magic.effective_area(def, stats);
                    let heading = (target_pos - origin).try_normalize().unwrap_or(Vec2::X);
                    let id = magic.id.clone();
                    magic.cooldown.activate(clock.now, cooldown, || {
                        commands.spawn((
                            Projectile {
                                owner: caster,
                                magic: id.clone(),
                                damage,
                                radius: hit_radius,
                                expires_at: clock.now + lifetime,
                            },
                            Transform::from_translation(origin.extend(0.0)),
                            Velocity(heading * speed),
                        ));
                    });
                    cast_events.send(MagicCastEvent {
                        caster,
                        magic: id,
                        target: Some(target),
                    });
                }
                MagicShape::Slash { duration } => {
                    let area = magic.effective_area(def, stats);
                    let Some((target, _)) = find_nearest(origin, targets.iter().copied(), area) else {
                        continue;
                    };
                    let damage = magic.effective_damage(def, stats);
                    let id = magic.id.clone();
                    magic.cooldown.activate(clock.now, cooldown, || {
                        commands.spawn((
                            SlashVolume {
                                owner: caster,
                                magic: id.clone(),
                                damage,
                                radius: area,
                                expires_at: clock.now + duration,
                                hit: SmallVec::new(),
                            },
                            Transform::from_translation(origin.extend(0.0)),
                        ));
                    });
                    cast_events.send(MagicCastEvent {
                        caster,
                        magic: id,
                        target: Some(target),
                    });
                }
                // Orbit balls strike on contact, see `orbit_ball_hits`
                MagicShape::Orbit { .. } => {}
            }
        }
    }
}

/// Make sure every orbit magic in a spellbook has its ball.
pub fn sync_orbit_balls(
    mut commands: Commands,
    catalog: Res<MagicCatalog>,
    owners: Query<(Entity, &Transform, &StatProfile, &Spellbook), Without<Dead>>,
    balls: Query<&OrbitBall>,
) {
    for (owner, transform, stats, spellbook) in owners.iter() {
        for magic in spellbook.iter() {
            let Some(def) = catalog.get(&magic.id) else {
                continue;
            };
            let MagicShape::Orbit {
                angular_speed,
                ball_radius,
                height,
            } = def.shape
            else {
                continue;
            };
            if balls.iter().any(|b| b.owner == owner && b.magic == magic.id) {
                continue;
            }

            let radius = magic.effective_area(def, stats);
            let position = orbit_position(planar(transform), 0.0, radius, height);
            debug!("Spawning orbit ball for '{}'", magic.id);
            commands.spawn((
                OrbitBall {
                    owner,
                    magic: magic.id.clone(),
                    angle: 0.0,
                    angular_speed,
                    ball_radius,
                    height,
                },
                Transform::from_translation(position.extend(0.0)),
            ));
        }
    }
}

/// Orbit balls damage every enemy they overlap whenever their magic's
/// cooldown is ready.
pub fn orbit_ball_hits(
    clock: Res<SimClock>,
    catalog: Res<MagicCatalog>,
    balls: Query<(&Transform, &OrbitBall)>,
    mut owners: Query<(&StatProfile, &mut Spellbook), Without<Dead>>,
    enemies: Query<(Entity, &Transform, &Collider), (With<Enemy>, Without<Dead>)>,
    mut damage_events: EventWriter<DamageEvent>,
    mut cast_events: EventWriter<MagicCastEvent>,
) {
    for (ball_transform, ball) in balls.iter() {
        let Ok((stats, mut spellbook)) = owners.get_mut(ball.owner) else {
            continue;
        };
        let Some(def) = catalog.get(&ball.magic) else {
            continue;
        };
        let Some(magic) = spellbook.get_mut(&ball.magic) else {
            continue;
        };

        let center = planar(ball_transform);
        let touching: SmallVec<[Entity; 8]> = enemies
            .iter()
            .filter(|(_, transform, collider)| {
                planar(transform).distance(center) <= ball.ball_radius + collider.radius
            })
            .map(|(entity, ..)| entity)
            .collect();
        if touching.is_empty() {
            continue;
        }

        let damage = magic.effective_damage(def, stats);
        let cooldown = magic.effective_cooldown(def, stats);
        if magic.cooldown.activate(clock.now, cooldown, || ()).is_none() {
            continue;
        }

        for target in &touching {
            damage_events.send(DamageEvent {
                source: ball.owner,
                target: *target,
                amount: damage,
                magic: Some(ball.magic.clone()),
            });
        }
        cast_events.send(MagicCastEvent {
            caster: ball.owner,
            magic: ball.magic.clone(),
            target: touching.first().copied(),
        });
    }
}

/// Sweep each projectile along this tick's path; the first enemy touched
/// takes the hit and the projectile is spent.
pub fn projectile_hits(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut schedule: ResMut<SimSchedule>,
    projectiles: Query<(Entity, &Transform, &Velocity, &Projectile)>,
    enemies: Query<(Entity, &Transform, &Collider), (With<Enemy>, Without<Dead>)>,
    mut damage_events: EventWriter<DamageEvent>,
) {
    let candidates: Vec<(Entity, Vec2, f32)> = enemies
        .iter()
        .map(|(entity, transform, collider)| (entity, planar(transform), collider.radius))
        .collect();

    for (entity, transform, velocity, projectile) in projectiles.iter() {
        let start = planar(transform);
        let end = start + velocity.0 * clock.delta;

        if let Some(target) = first_swept_hit(start, end, projectile.radius, candidates.iter().copied()) {
            damage_events.send(DamageEvent {
                source: projectile.owner,
                target,
                amount: projectile.damage,
                magic: Some(projectile.magic.clone()),
            });
            schedule.cancel_owner(entity);
            commands.entity(entity).despawn();
        } else if clock.now >= projectile.expires_at {
            trace!("Projectile {:?} expired", entity);
            schedule.cancel_owner(entity);
            commands.entity(entity).despawn();
        }
    }
}

/// Slash volumes follow their owner and hit each enemy inside once.
pub fn slash_hits(
    mut commands: Commands,
    clock: Res<SimClock>,
    mut schedule: ResMut<SimSchedule>,
    mut volumes: Query<(Entity, &mut Transform, &mut SlashVolume)>,
    owners: Query<&Transform, (With<Spellbook>, Without<SlashVolume>)>,
    enemies: Query<(Entity, &Transform, &Collider), (With<Enemy>, Without<Dead>, Without<SlashVolume>)>,
    mut damage_events: EventWriter<DamageEvent>,
) {
    for (entity, mut transform, mut volume) in volumes.iter_mut() {
        if clock.now >= volume.expires_at {
            schedule.cancel_owner(entity);
            commands.entity(entity).despawn();
            continue;
        }
        if let Ok(owner) = owners.get(volume.owner) {
            transform.translation.x = owner.translation.x;
            transform.translation.y = owner.translation.y;
        }

        let center = planar(&transform);
        for (enemy, enemy_transform, collider) in enemies.iter() {
            if volume.hit.contains(&enemy) {
                continue;
            }
            if planar(enemy_transform).distance(center) <= volume.radius + collider.radius {
                volume.hit.push(enemy);
                damage_events.send(DamageEvent {
                    source: volume.owner,
                    target: enemy,
                    amount: volume.damage,
                    magic: Some(volume.magic.clone()),
                });
            }
        }
    }
}

/// Advance orbit angles and place balls around their owner. Balls whose owner
/// or magic is gone are removed.
pub fn place_orbit_balls(
    mut commands: Commands,
    clock: Res<SimClock>,
    catalog: Res<MagicCatalog>,
    mut balls: Query<(Entity, &mut Transform, &mut OrbitBall)>,
    owners: Query<(&Transform, &StatProfile, &Spellbook), (Without<OrbitBall>, Without<Dead>)>,
) {
    for (entity, mut transform, mut ball) in balls.iter_mut() {
        let Ok((owner_transform, stats, spellbook)) = owners.get(ball.owner) else {
            commands.entity(entity).despawn();
            continue;
        };
        let (Some(def), Some(magic)) = (catalog.get(&ball.magic), spellbook.get(&ball.magic)) else {
            commands.entity(entity).despawn();
            continue;
        };

        ball.angle = (ball.angle + ball.angular_speed * clock.delta) % 360.0;
        let radius = magic.effective_area(def, stats);
        let position = orbit_position(planar(owner_transform), ball.angle, radius, ball.height);
        transform.translation = position.extend(0.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orbit_position_on_circle() {
        let p = orbit_position(Vec2::new(1.0, 1.0), 90.0, 2.0, 0.0);
        assert!((p - Vec2::new(1.0, 3.0)).length() < 1e-5);
    }

    #[test]
    fn test_orbit_height_lifts_the_circle() {
        let p = orbit_position(Vec2::ZERO, 0.0, 1.5, 0.5);
        assert!((p - Vec2::new(1.5, 0.5)).length() < 1e-5);
        let p = orbit_position(Vec2::ZERO, 180.0, 1.5, 0.5);
        assert!((p - Vec2::new(-1.5, 0.5)).length() < 1e-5);
    }
}
