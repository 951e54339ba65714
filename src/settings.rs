//! Simulation settings
//!
//! Tunables for the player, progression, offers, enemies and pickups, loaded
//! from `assets/config/settings.ron`. Missing fields fall back to defaults.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::sim::magic::MagicId;
use crate::sim::magic_config::DEFAULT_MAGICS_PATH;
use crate::sim::rounds::DEFAULT_ROUNDS_PATH;

pub const DEFAULT_SETTINGS_PATH: &str = "assets/config/settings.ron";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerSettings {
    pub max_health: f32,
    /// Damage immunity after each hit, in seconds
    pub invulnerability: f32,
    /// Units per second at speed multiplier 1
    pub move_speed: f32,
    /// Health restored per second
    pub regeneration: f32,
    pub radius: f32,
    pub dash_distance: f32,
    pub dash_duration: f32,
    /// Counted from the end of the dash
    pub dash_cooldown: f32,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            max_health: 100.0,
            invulnerability: 1.5,
            move_speed: 5.0,
            regeneration: 0.5,
            radius: 0.5,
            dash_distance: 3.0,
            dash_duration: 0.2,
            dash_cooldown: 1.0,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionSettings {
    pub first_threshold: u32,
    /// Threshold growth multiplied by the new level
    pub per_level_increment: u32,
    /// Offers shown per level-up
    pub offer_count: usize,
}

impl Default for ProgressionSettings {
    fn default() -> Self {
        Self {
            first_threshold: 10,
            per_level_increment: 5,
            offer_count: crate::sim::upgrades::DEFAULT_OFFER_COUNT,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemySettings {
    /// Enemies closer than this push each other apart
    pub separation_distance: f32,
    pub separation_weight: f32,
    /// Seconds a dead enemy stays before despawning
    pub death_grace: f32,
    pub hit_flash: f32,
}

impl Default for EnemySettings {
    fn default() -> Self {
        Self {
            separation_distance: 1.0,
            separation_weight: 1.5,
            death_grace: 2.0,
            hit_flash: 0.2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PotionSettings {
    /// Chance in 0..1 that a killed enemy drops a potion
    pub drop_chance: f32,
    pub heal_amount: f32,
    pub attract_distance: f32,
    pub attract_speed: f32,
    pub pickup_radius: f32,
}

impl Default for PotionSettings {
    fn default() -> Self {
        Self {
            drop_chance: 0.1,
            heal_amount: 20.0,
            attract_distance: 2.0,
            attract_speed: 5.0,
            pickup_radius: 0.5,
        }
    }
}

/// Every tunable of a run.
#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimSettings {
    /// Fixed ticks per second
    pub tick_rate: f64,
    pub player: PlayerSettings,
    pub progression: ProgressionSettings,
    pub enemies: EnemySettings,
    pub potions: PotionSettings,
    /// Magics in the spellbook at the start of a run
    pub starting_magics: Vec<MagicId>,
    pub magics_path: PathBuf,
    pub rounds_path: PathBuf,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            tick_rate: 60.0,
            player: PlayerSettings::default(),
            progression: ProgressionSettings::default(),
            enemies: EnemySettings::default(),
            potions: PotionSettings::default(),
            starting_magics: vec![MagicId::new("arcane_bolt")],
            magics_path: PathBuf::from(DEFAULT_MAGICS_PATH),
            rounds_path: PathBuf::from(DEFAULT_ROUNDS_PATH),
        }
    }
}

impl SimSettings {
    pub fn tick_seconds(&self) -> f32 {
        (1.0 / self.tick_rate) as f32
    }

    pub fn from_ron(contents: &str) -> Result<Self, String> {
        let settings: SimSettings =
            ron::from_str(contents).map_err(|e| format!("Failed to parse settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a RON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let settings = Self::from_ron(&contents)?;
        info!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.tick_rate <= 0.0 {
            return Err("tick_rate must be positive".to_string());
        }
        if self.player.max_health <= 0.0 {
            return Err("player.max_health must be positive".to_string());
        }
        if self.player.dash_duration <= 0.0 {
            return Err("player.dash_duration must be positive".to_string());
        }
        if self.progression.first_threshold == 0 {
            return Err("progression.first_threshold must be at least 1".to_string());
        }
        if !(0.0..=1.0).contains(&self.potions.drop_chance) {
            return Err("potions.drop_chance must be within 0..1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_settings_parse() {
        let settings = SimSettings::load_from_file(Path::new(DEFAULT_SETTINGS_PATH))
            .expect("shipped settings.ron should be valid");
        assert_eq!(settings.player.max_health, 100.0);
        assert_eq!(settings.progression.per_level_increment, 5);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let settings = SimSettings::from_ron("(tick_rate: 30.0, potions: (drop_chance: 0.5))").unwrap();
        assert_eq!(settings.tick_rate, 30.0);
        assert_eq!(settings.potions.drop_chance, 0.5);
        assert_eq!(settings.potions.heal_amount, 20.0);
        assert_eq!(settings.player, PlayerSettings::default());
    }

    #[test]
    fn test_invalid_drop_chance_rejected() {
        assert!(SimSettings::from_ron("(potions: (drop_chance: 1.5))").is_err());
    }

    #[test]
    fn test_missing_file_is_an_error() {
        let err = SimSettings::load_from_file(Path::new("does/not/exist.ron")).unwrap_err();
        assert!(err.contains("does/not/exist.ron"));
    }
}
