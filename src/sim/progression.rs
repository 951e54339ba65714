//! Experience & Leveling
//!
//! Experience carries over between levels. Each level-up raises the threshold
//! by `new_level * per_level_increment`.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

#[derive(Component, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Progression {
    pub level: u32,
    pub experience: u32,
    pub experience_to_next_level: u32,
    pub per_level_increment: u32,
}

impl Default for Progression {
    fn default() -> Self {
        Self::new(10, 5)
    }
}

impl Progression {
    pub fn new(first_threshold: u32, per_level_increment: u32) -> Self {
        Self {
            level: 1,
            experience: 0,
            experience_to_next_level: first_threshold.max(1),
            per_level_increment,
        }
    }

    /// Add experience and resolve every level-up it pays for.
    ///
    /// Returns the levels reached, in order; empty when no threshold was crossed.
    pub fn gain_experience(&mut self, amount: u32) -> SmallVec<[u32; 4]> {
        let mut reached = SmallVec::new();
        self.experience = self.experience.saturating_add(amount);

        while self.experience >= self.experience_to_next_level {
            self.experience -= self.experience_to_next_level;
            self.level += 1;
            self.experience_to_next_level = self.next_threshold();
            reached.push(self.level);
        }

        reached
    }

    fn next_threshold(&self) -> u32 {
        self.experience_to_next_level
            .saturating_add(self.level.saturating_mul(self.per_level_increment))
            .max(1)
    }

    /// Progress toward the next level in 0..1.
    pub fn fraction(&self) -> f32 {
        self.experience as f32 / self.experience_to_next_level as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_level_up_carries_remainder() {
        let mut progression = Progression::new(10, 5);
        let reached = progression.gain_experience(25);
        assert_eq!(reached.as_slice(), &[2]);
        assert_eq!(progression.experience, 15);
        // 10 + 2 * 5
        assert_eq!(progression.experience_to_next_level, 20);
    }

    #[test]
    fn test_below_threshold_does_not_level() {
        let mut progression = Progression::new(10, 5);
        assert!(progression.gain_experience(9).is_empty());
        assert_eq!(progression.level, 1);
        assert_eq!(progression.experience, 9);
    }

    #[test]
    fn test_exact_threshold_levels_with_zero_remainder() {
        let mut progression = Progression::new(10, 5);
        assert_eq!(progression.gain_experience(10).len(), 1);
        assert_eq!(progression.experience, 0);
    }
}
