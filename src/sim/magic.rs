//! Magic Instances & Spellbook
//!
//! A magic instance is a leveled, cooldown-gated copy of a catalog definition
//! owned by the player. Effective numbers are derived from the level and the
//! owner's `StatProfile` on every read, never cached.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::cooldown::CooldownActivator;
use super::magic_config::MagicDefinition;
use super::stats::StatProfile;

/// Damage bonus per level above 1.
pub const DAMAGE_PER_LEVEL: f32 = 0.2;
/// Area bonus per level above 1.
pub const AREA_PER_LEVEL: f32 = 0.1;
/// Cooldown reduction per level above 1.
pub const COOLDOWN_PER_LEVEL: f32 = 0.05;
/// Smallest level factor the cooldown reduction can reach.
pub const MIN_COOLDOWN_FACTOR: f32 = 0.1;

/// Catalog key of a magic, e.g. `"arcane_bolt"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MagicId(pub String);

impl MagicId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MagicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MagicId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// An acquired magic. Lives for the whole run; only its level changes.
#[derive(Debug, Clone, PartialEq)]
pub struct MagicInstance {
    pub id: MagicId,
    level: u32,
    max_level: u32,
    pub cooldown: CooldownActivator,
}

impl MagicInstance {
    /// A level 1 instance, ready to fire immediately.
    pub fn new(definition: &MagicDefinition) -> Self {
        Self {
            id: definition.id.clone(),
            level: 1,
            max_level: definition.max_level.max(1),
            cooldown: CooldownActivator::new(),
        }
    }

    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn max_level(&self) -> u32 {
        self.max_level
    }

    pub fn is_max_level(&self) -> bool {
        self.level >= self.max_level
    }

    /// One-way level increment. Returns false at the cap.
    pub fn level_up(&mut self) -> bool {
        if self.is_max_level() {
            return false;
        }
        self.level += 1;
        true
    }

    fn steps(&self) -> f32 {
        (self.level.saturating_sub(1)) as f32
    }

    pub fn effective_damage(&self, definition: &MagicDefinition, stats: &StatProfile) -> f32 {
        definition.base_damage * (1.0 + self.steps() * DAMAGE_PER_LEVEL) * stats.damage()
    }

    pub fn effective_area(&self, definition: &MagicDefinition, stats: &StatProfile) -> f32 {
        definition.base_area * (1.0 + self.steps() * AREA_PER_LEVEL) * stats.area()
    }

    pub fn effective_cooldown(&self, definition: &MagicDefinition, stats: &StatProfile) -> f32 {
        let level_factor = (1.0 - self.steps() * COOLDOWN_PER_LEVEL).max(MIN_COOLDOWN_FACTOR);
        definition.base_cooldown * level_factor * stats.cooldown()
    }
}

/// The player's acquired magics, in acquisition order.
#[derive(Component, Debug, Clone, Default)]
pub struct Spellbook {
    magics: Vec<MagicInstance>,
}

impl Spellbook {
    pub fn contains(&self, id: &MagicId) -> bool {
        self.magics.iter().any(|m| &m.id == id)
    }

    pub fn get(&self, id: &MagicId) -> Option<&MagicInstance> {
        self.magics.iter().find(|m| &m.id == id)
    }

    pub fn get_mut(&mut self, id: &MagicId) -> Option<&mut MagicInstance> {
        self.magics.iter_mut().find(|m| &m.id == id)
    }

    /// Add a level 1 instance. Returns false if already acquired.
    pub fn acquire(&mut self, definition: &MagicDefinition) -> bool {
        if self.contains(&definition.id) {
            return false;
        }
        self.magics.push(MagicInstance::new(definition));
        true
    }

    /// Level up an acquired magic. Returns the new level.
    pub fn level_up(&mut self, id: &MagicId) -> Option<u32> {
        let magic = self.get_mut(id)?;
        magic.level_up().then(|| magic.level())
    }

    pub fn iter(&self) -> impl Iterator<Item = &MagicInstance> {
        self.magics.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut MagicInstance> {
        self.magics.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.magics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.magics.is_empty()
    }

    /// Sum of all levels: one per acquisition plus one per level-up.
    pub fn total_levels(&self) -> u32 {
        self.magics.iter().map(|m| m.level).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::magic_config::MagicShape;
    use crate::sim::stats::StatChannel;

    fn bolt() -> MagicDefinition {
        MagicDefinition {
            id: MagicId::new("bolt"),
            name: "Bolt".to_string(),
            description: String::new(),
            base_damage: 20.0,
            base_area: 1.0,
            base_cooldown: 2.0,
            max_level: 3,
            shape: MagicShape::Slash { duration: 0.15 },
        }
    }

    #[test]
    fn test_level_scaling() {
        let def = bolt();
        let stats = StatProfile::default();
        let mut magic = MagicInstance::new(&def);
        assert!(magic.level_up());
        assert!(magic.level_up());
        // level 3: +40% damage, +20% area, -10% cooldown
        assert!((magic.effective_damage(&def, &stats) - 28.0).abs() < 1e-4);
        assert!((magic.effective_area(&def, &stats) - 1.2).abs() < 1e-4);
        assert!((magic.effective_cooldown(&def, &stats) - 1.8).abs() < 1e-4);
    }

    #[test]
    fn test_level_capped() {
        let def = bolt();
        let mut magic = MagicInstance::new(&def);
        magic.level_up();
        magic.level_up();
        assert!(magic.is_max_level());
        assert!(!magic.level_up());
        assert_eq!(magic.level(), 3);
    }

    #[test]
    fn test_stat_profile_scales_effective_values() {
        let def = bolt();
        let mut stats = StatProfile::default();
        stats.set_buff(StatChannel::Damage, "might", 0.5);
        stats.set_buff(StatChannel::Cooldown, "haste", -0.5);
        let magic = MagicInstance::new(&def);
        assert!((magic.effective_damage(&def, &stats) - 30.0).abs() < 1e-4);
        assert!((magic.effective_cooldown(&def, &stats) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_spellbook_acquire_is_unique() {
        let def = bolt();
        let mut book = Spellbook::default();
        assert!(book.acquire(&def));
        assert!(!book.acquire(&def));
        assert_eq!(book.len(), 1);
        assert_eq!(book.level_up(&def.id), Some(2));
        assert_eq!(book.total_levels(), 2);
    }
}
