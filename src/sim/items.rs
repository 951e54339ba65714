//! Health potions dropped by enemies.

use bevy::prelude::*;

use crate::combat::events::{HealthChangeCause, HealthChangedEvent};
use crate::settings::{PotionSettings, SimSettings};

use super::components::{planar, Collider, Dead, HealthPotion, Player, RunStats};
use super::health::Health;
use super::schedule::{SimClock, SimSchedule};

pub fn spawn_potion(commands: &mut Commands, position: Vec2, settings: &PotionSettings) -> Entity {
    commands
        .spawn((
            HealthPotion {
                heal_amount: settings.heal_amount,
            },
            Transform::from_translation(position.extend(0.0)),
        ))
        .id()
}

/// Potions within pickup range heal the player and disappear.
pub fn collect_potions(
    mut commands: Commands,
    settings: Res<SimSettings>,
    mut schedule: ResMut<SimSchedule>,
    mut stats: ResMut<RunStats>,
    mut player: Query<(Entity, &Transform, &Collider, &mut Health), (With<Player>, Without<Dead>)>,
    potions: Query<(Entity, &Transform, &HealthPotion)>,
    mut health_events: EventWriter<HealthChangedEvent>,
) {
    let Ok((player_entity, player_transform, collider, mut health)) = player.get_single_mut() else {
        return;
    };
    let player_pos = planar(player_transform);
    let reach = collider.radius + settings.potions.pickup_radius;

    for (potion_entity, transform, potion) in potions.iter() {
        if planar(transform).distance(player_pos) > reach {
            continue;
        }
        let healed = health.heal(potion.heal_amount);
        if healed > 0.0 {
            health_events.send(HealthChangedEvent {
                entity: player_entity,
                current: health.current(),
                max: health.max(),
                delta: healed,
                cause: HealthChangeCause::Potion,
            });
        }
        stats.potions_collected += 1;
        schedule.cancel_owner(potion_entity);
        commands.entity(potion_entity).despawn();
    }
}

/// Potions near the player drift towards them.
pub fn attract_potions(
    clock: Res<SimClock>,
    settings: Res<SimSettings>,
    player: Query<&Transform, (With<Player>, Without<Dead>, Without<HealthPotion>)>,
    mut potions: Query<&mut Transform, With<HealthPotion>>,
) {
    let Ok(player_transform) = player.get_single() else {
        return;
    };
    let target = planar(player_transform);
    let step = settings.potions.attract_speed * clock.delta;

    for mut transform in potions.iter_mut() {
        let position = planar(&transform);
        let distance = position.distance(target);
        if distance <= settings.potions.attract_distance {
            let moved = if distance <= step {
                target
            } else {
                position + (target - position) / distance * step
            };
            transform.translation.x = moved.x;
            transform.translation.y = moved.y;
        }
    }
}
