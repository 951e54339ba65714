//! Stat Aggregation
//!
//! Base multipliers plus named, replaceable buffs per stat channel.
//! Effective value = base + sum of active buffs, with a floor on the channels
//! where zero would freeze an entity (speed) or make a timer fire every tick
//! (cooldown). Damage and area have no floor so debuffs can push them to zero
//! or below.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::BTreeMap;

/// Minimum effective speed multiplier.
pub const SPEED_FLOOR: f32 = 0.1;
/// Minimum effective cooldown multiplier (90% reduction cap).
pub const COOLDOWN_FLOOR: f32 = 0.1;

/// An independently aggregated stat category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatChannel {
    Speed,
    Damage,
    Area,
    Cooldown,
}

impl StatChannel {
    pub const ALL: [StatChannel; 4] = [
        StatChannel::Speed,
        StatChannel::Damage,
        StatChannel::Area,
        StatChannel::Cooldown,
    ];

    fn index(self) -> usize {
        match self {
            StatChannel::Speed => 0,
            StatChannel::Damage => 1,
            StatChannel::Area => 2,
            StatChannel::Cooldown => 3,
        }
    }

    /// Lower clamp applied to the effective value, if any.
    pub fn floor(self) -> Option<f32> {
        match self {
            StatChannel::Speed => Some(SPEED_FLOOR),
            StatChannel::Cooldown => Some(COOLDOWN_FLOOR),
            StatChannel::Damage | StatChannel::Area => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            StatChannel::Speed => "speed",
            StatChannel::Damage => "damage",
            StatChannel::Area => "area",
            StatChannel::Cooldown => "cooldown",
        }
    }
}

/// Base stats plus active buffs for one entity.
///
/// Buffs are keyed by id per channel. Re-adding an id replaces its value, it
/// never stacks. Buff maps are ordered so sums are reproducible across runs.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct StatProfile {
    base: [f32; 4],
    buffs: [BTreeMap<String, f32>; 4],
}

impl Default for StatProfile {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0)
    }
}

impl StatProfile {
    pub fn new(speed: f32, damage: f32, area: f32, cooldown: f32) -> Self {
        Self {
            base: [speed, damage, area, cooldown],
            buffs: Default::default(),
        }
    }

    pub fn base(&self, channel: StatChannel) -> f32 {
        self.base[channel.index()]
    }

    /// Insert or replace the buff `id` on `channel`.
    pub fn set_buff(&mut self, channel: StatChannel, id: impl Into<String>, value: f32) {
        let id = id.into();
        debug!("Buff '{}' set on {} channel: {:+.2}", id, channel.name(), value);
        self.buffs[channel.index()].insert(id, value);
    }

    /// Remove `id` from every channel holding it.
    ///
    /// Returns the channels it was removed from; empty when the id was unknown.
    pub fn remove_buff(&mut self, id: &str) -> SmallVec<[StatChannel; 4]> {
        let mut removed = SmallVec::new();
        for channel in StatChannel::ALL {
            if self.buffs[channel.index()].remove(id).is_some() {
                debug!("Buff '{}' removed from {} channel", id, channel.name());
                removed.push(channel);
            }
        }
        removed
    }

    pub fn buff(&self, channel: StatChannel, id: &str) -> Option<f32> {
        self.buffs[channel.index()].get(id).copied()
    }

    pub fn buff_count(&self, channel: StatChannel) -> usize {
        self.buffs[channel.index()].len()
    }

    /// Base plus every active buff on the channel, clamped to the channel floor.
    pub fn effective(&self, channel: StatChannel) -> f32 {
        let total = self.base[channel.index()]
            + self.buffs[channel.index()].values().sum::<f32>();
        match channel.floor() {
            Some(floor) => total.max(floor),
            None => total,
        }
    }

    pub fn speed(&self) -> f32 {
        self.effective(StatChannel::Speed)
    }

    pub fn damage(&self) -> f32 {
        self.effective(StatChannel::Damage)
    }

    pub fn area(&self) -> f32 {
        self.effective(StatChannel::Area)
    }

    pub fn cooldown(&self) -> f32 {
        self.effective(StatChannel::Cooldown)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_is_base_plus_buffs() {
        let mut stats = StatProfile::default();
        stats.set_buff(StatChannel::Damage, "tome", 0.25);
        stats.set_buff(StatChannel::Damage, "ring", 0.5);
        assert!((stats.damage() - 1.75).abs() < 1e-6);
        assert!((stats.area() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_same_id_overwrites() {
        let mut stats = StatProfile::default();
        stats.set_buff(StatChannel::Speed, "boots", 0.2);
        stats.set_buff(StatChannel::Speed, "boots", 0.4);
        assert_eq!(stats.buff_count(StatChannel::Speed), 1);
        assert!((stats.speed() - 1.4).abs() < 1e-6);
    }

    #[test]
    fn test_speed_and_cooldown_are_floored() {
        let mut stats = StatProfile::default();
        stats.set_buff(StatChannel::Speed, "slow", -5.0);
        stats.set_buff(StatChannel::Cooldown, "haste", -5.0);
        assert_eq!(stats.speed(), SPEED_FLOOR);
        assert_eq!(stats.cooldown(), COOLDOWN_FLOOR);
    }

    #[test]
    fn test_damage_and_area_may_go_negative() {
        let mut stats = StatProfile::default();
        stats.set_buff(StatChannel::Damage, "curse", -1.5);
        stats.set_buff(StatChannel::Area, "shrink", -1.0);
        assert!((stats.damage() + 0.5).abs() < 1e-6);
        assert!(stats.area().abs() < 1e-6);
    }

    #[test]
    fn test_remove_reports_channels() {
        let mut stats = StatProfile::default();
        stats.set_buff(StatChannel::Area, "aura", 0.3);
        let removed = stats.remove_buff("aura");
        assert_eq!(removed.as_slice(), &[StatChannel::Area]);
        assert!((stats.area() - 1.0).abs() < 1e-6);

        assert!(stats.remove_buff("aura").is_empty());
        assert!(stats.remove_buff("never-added").is_empty());
    }
}
