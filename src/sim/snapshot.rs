//! Player persistence
//!
//! Captures health and progression as a small JSON document and restores
//! them onto the player entity.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::combat::events::{HealthChangeCause, HealthChangedEvent};

use super::components::Player;
use super::health::Health;
use super::progression::Progression;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    pub max_health: f32,
    pub current_health: f32,
    pub level: u32,
    pub experience: u32,
    pub experience_to_next_level: u32,
}

impl PlayerSnapshot {
    pub fn capture(health: &Health, progression: &Progression) -> Self {
        Self {
            max_health: health.max(),
            current_health: health.current(),
            level: progression.level,
            experience: progression.experience,
            experience_to_next_level: progression.experience_to_next_level,
        }
    }

    /// Overwrite health and progression. The per-level increment is kept.
    pub fn apply(&self, health: &mut Health, progression: &mut Progression) {
        health.restore_from(self.current_health, self.max_health);
        progression.level = self.level.max(1);
        progression.experience = self.experience;
        progression.experience_to_next_level = self.experience_to_next_level.max(1);
    }

    pub fn to_json(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize snapshot: {}", e))
    }

    pub fn from_json(json: &str) -> Result<Self, String> {
        let snapshot: PlayerSnapshot =
            serde_json::from_str(json).map_err(|e| format!("Failed to parse snapshot: {}", e))?;
        snapshot.validate()?;
        Ok(snapshot)
    }

    /// A snapshot must describe a living player.
    pub fn validate(&self) -> Result<(), String> {
        if !self.max_health.is_finite() || self.max_health <= 0.0 {
            return Err("snapshot max_health must be positive".to_string());
        }
        if !self.current_health.is_finite() || self.current_health <= 0.0 {
            return Err("snapshot current_health must be positive".to_string());
        }
        Ok(())
    }

    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        std::fs::write(path, self.to_json()?)
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
    }

    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::from_json(&contents)
    }
}

/// Snapshot of the player, if there is exactly one.
pub fn export_player(world: &mut World) -> Option<PlayerSnapshot> {
    let mut query = world.query_filtered::<(&Health, &Progression), With<Player>>();
    let (health, progression) = query.get_single(world).ok()?;
    Some(PlayerSnapshot::capture(health, progression))
}

/// Restore a snapshot onto the player and announce the health change.
pub fn import_player(world: &mut World, snapshot: &PlayerSnapshot) -> Result<(), String> {
    snapshot.validate()?;
    let mut query =
        world.query_filtered::<(Entity, &mut Health, &mut Progression), With<Player>>();
    let (entity, mut health, mut progression) = query
        .get_single_mut(world)
        .map_err(|e| format!("No player to restore: {}", e))?;
    let before = health.current();
    snapshot.apply(&mut health, &mut progression);
    let changed = HealthChangedEvent {
        entity,
        current: health.current(),
        max: health.max(),
        delta: health.current() - before,
        cause: HealthChangeCause::Restore,
    };

    world.send_event(changed);
    info!(
        "Restored player at level {} with {:.0}/{:.0} health",
        snapshot.level, snapshot.current_health, snapshot.max_health
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_round_trip() {
        let mut health = Health::new(120.0, 0.0);
        health.take_damage(0.0, 30.0);
        let mut progression = Progression::new(10, 5);
        progression.gain_experience(12);

        let snapshot = PlayerSnapshot::capture(&health, &progression);
        let parsed = PlayerSnapshot::from_json(&snapshot.to_json().unwrap()).unwrap();
        assert_eq!(parsed, snapshot);
        assert_eq!(parsed.level, 2);
        assert_eq!(parsed.current_health, 90.0);
    }

    #[test]
    fn test_invalid_snapshot_rejected() {
        let json = r#"{"max_health":0.0,"current_health":0.0,"level":1,"experience":0,"experience_to_next_level":10}"#;
        assert!(PlayerSnapshot::from_json(json).is_err());
    }

    #[test]
    fn test_dead_snapshot_rejected() {
        let json = r#"{"max_health":100.0,"current_health":0.0,"level":3,"experience":2,"experience_to_next_level":25}"#;
        assert!(PlayerSnapshot::from_json(json).is_err());
    }
}
