//! Input provider
//!
//! The simulation never reads devices. An `IntentSource` turns a view of the
//! world into a movement intent once per frame; the decision phase consumes
//! the latest intent on every tick.

use bevy::prelude::*;

use super::components::{planar, Dead, Enemy, InputIntent, Player};
use super::targeting::find_nearest;

/// What an intent source gets to see.
#[derive(Debug, Clone, Copy)]
pub struct InputView<'a> {
    pub player: Vec2,
    pub enemies: &'a [Vec2],
}

pub trait IntentSource: Send + Sync {
    fn sample(&mut self, view: &InputView) -> InputIntent;
}

/// Current intent source. With no source the player stands still.
#[derive(Resource, Default)]
pub struct InputProvider {
    pub source: Option<Box<dyn IntentSource>>,
}

impl InputProvider {
    pub fn new(source: impl IntentSource + 'static) -> Self {
        Self {
            source: Some(Box::new(source)),
        }
    }
}

/// Kites away from nearby enemies, dashes out of tight spots and drifts back
/// towards the arena center when it strays.
#[derive(Debug, Clone, Copy)]
pub struct Autopilot {
    pub flee_radius: f32,
    pub dash_radius: f32,
    pub home_radius: f32,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self {
            flee_radius: 4.0,
            dash_radius: 1.2,
            home_radius: 8.0,
        }
    }
}

impl IntentSource for Autopilot {
    fn sample(&mut self, view: &InputView) -> InputIntent {
        let nearest = find_nearest(
            view.player,
            view.enemies.iter().map(|pos| ((), *pos)),
            self.flee_radius,
        );

        match nearest {
            Some((_, enemy)) => {
                let away = (view.player - enemy).try_normalize().unwrap_or(Vec2::Y);
                InputIntent {
                    move_vector: away,
                    dash: view.player.distance(enemy) < self.dash_radius,
                }
            }
            None if view.player.length() > self.home_radius => InputIntent {
                move_vector: -view.player.normalize_or_zero(),
                dash: false,
            },
            None => InputIntent::default(),
        }
    }
}

/// Sample the intent source once per frame.
pub fn sample_input(
    mut provider: ResMut<InputProvider>,
    mut intent: ResMut<InputIntent>,
    player: Query<&Transform, (With<Player>, Without<Dead>)>,
    enemies: Query<&Transform, (With<Enemy>, Without<Dead>)>,
) {
    let Some(source) = provider.source.as_mut() else {
        return;
    };
    let Ok(player_transform) = player.get_single() else {
        return;
    };
    let positions: Vec<Vec2> = enemies.iter().map(planar).collect();
    let sampled = source.sample(&InputView {
        player: planar(player_transform),
        enemies: &positions,
    });

    intent.move_vector = sampled.move_vector;
    // Latched until a tick consumes it
    intent.dash |= sampled.dash;
}
