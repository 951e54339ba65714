//! Data-Driven Magic Configuration
//!
//! Magic definitions are loaded from `assets/config/magics.ron` instead of one
//! type per spell. Orbit, projectile and slash magics share the same
//! cooldown + damage + shape pattern; only the shape parameters differ.
//!
//! ## Usage
//! ```ignore
//! fn my_system(catalog: Res<MagicCatalog>) {
//!     let def = catalog.get(&MagicId::new("arcane_bolt")).unwrap();
//!     println!("Arcane Bolt cooldown: {}", def.base_cooldown);
//! }
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::magic::{MagicId, AREA_PER_LEVEL, COOLDOWN_PER_LEVEL, DAMAGE_PER_LEVEL};

pub const DEFAULT_MAGICS_PATH: &str = "assets/config/magics.ron";

fn default_max_level() -> u32 {
    5
}

/// Hit-test shape and per-shape parameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum MagicShape {
    /// Fired at the nearest enemy, spent on its first hit.
    Projectile {
        /// Travel speed in units/second
        speed: f32,
        /// Seconds before an unspent projectile disappears
        lifetime: f32,
        /// Collision radius of the projectile itself
        radius: f32,
        /// Targets farther than this are ignored
        detection_radius: f32,
    },
    /// A ball circling the caster at a radius equal to the magic's area.
    Orbit {
        /// Degrees per second
        angular_speed: f32,
        /// Collision radius of the ball
        ball_radius: f32,
        /// Offset of the orbit centre along +Y from the caster
        #[serde(default)]
        height: f32,
    },
    /// A volume around the caster, active for `duration`; each enemy is hit
    /// at most once per activation.
    Slash { duration: f32 },
}

/// One catalog entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MagicDefinition {
    pub id: MagicId,
    /// Display name
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_damage: f32,
    /// Base radius (slash/orbit) or damage-area scale (projectile)
    pub base_area: f32,
    /// Seconds between activations at level 1
    pub base_cooldown: f32,
    #[serde(default = "default_max_level")]
    pub max_level: u32,
    pub shape: MagicShape,
}

impl MagicDefinition {
    /// Text shown on a level-up offer.
    pub fn next_level_description(&self, current_level: u32) -> String {
        if current_level >= self.max_level {
            return "Max level".to_string();
        }
        format!(
            "Next level: damage +{:.0}%, area +{:.0}%, cooldown -{:.0}%",
            DAMAGE_PER_LEVEL * 100.0,
            AREA_PER_LEVEL * 100.0,
            COOLDOWN_PER_LEVEL * 100.0
        )
    }

    fn validate(&self) -> Result<(), String> {
        if self.max_level == 0 {
            return Err(format!("magic '{}' has max_level 0", self.id));
        }
        if self.base_cooldown <= 0.0 {
            return Err(format!("magic '{}' must have a positive base_cooldown", self.id));
        }
        if self.base_damage < 0.0 || self.base_area < 0.0 {
            return Err(format!("magic '{}' has a negative damage or area", self.id));
        }
        match self.shape {
            MagicShape::Projectile { speed, lifetime, detection_radius, .. } => {
                if speed <= 0.0 || lifetime <= 0.0 || detection_radius <= 0.0 {
                    return Err(format!(
                        "projectile magic '{}' needs positive speed, lifetime and detection_radius",
                        self.id
                    ));
                }
            }
            MagicShape::Orbit { ball_radius, .. } => {
                if ball_radius <= 0.0 {
                    return Err(format!("orbit magic '{}' needs a positive ball_radius", self.id));
                }
            }
            MagicShape::Slash { duration } => {
                if duration <= 0.0 {
                    return Err(format!("slash magic '{}' needs a positive duration", self.id));
                }
            }
        }
        Ok(())
    }
}

/// Root structure of magics.ron
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MagicsConfig {
    pub magics: Vec<MagicDefinition>,
}

/// Every magic the player can acquire, in catalog order.
#[derive(Resource, Debug, Clone)]
pub struct MagicCatalog {
    definitions: Vec<MagicDefinition>,
}

impl MagicCatalog {
    pub fn new(definitions: Vec<MagicDefinition>) -> Result<Self, String> {
        if definitions.is_empty() {
            return Err("magic catalog is empty".to_string());
        }
        let mut seen = HashSet::new();
        for def in &definitions {
            def.validate()?;
            if !seen.insert(def.id.clone()) {
                return Err(format!("duplicate magic id '{}'", def.id));
            }
        }
        Ok(Self { definitions })
    }

    pub fn from_ron(contents: &str) -> Result<Self, String> {
        let config: MagicsConfig =
            ron::from_str(contents).map_err(|e| format!("Failed to parse magics: {}", e))?;
        Self::new(config.magics)
    }

    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let catalog = Self::from_ron(&contents)
            .map_err(|e| format!("{} ({})", e, path.display()))?;
        info!("Loaded {} magic definitions from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn get(&self, id: &MagicId) -> Option<&MagicDefinition> {
        self.definitions.iter().find(|d| &d.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &MagicDefinition> {
        self.definitions.iter()
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}
