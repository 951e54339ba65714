//! Entity Health
//!
//! Shared damage/heal state machine for the player and enemies:
//! Alive -> (optional invulnerability window after a hit) -> Dead.
//! Dead is terminal.

use bevy::prelude::*;

/// Result of a single `take_damage` call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Dead, invulnerable, or a non-positive amount. Nothing changed.
    Ignored,
    /// Damage applied, entity still alive.
    Hit { dealt: f32 },
    /// Damage applied and the entity died. Returned at most once per entity.
    Killed { dealt: f32 },
}

impl DamageOutcome {
    pub fn dealt(&self) -> f32 {
        match self {
            DamageOutcome::Ignored => 0.0,
            DamageOutcome::Hit { dealt } | DamageOutcome::Killed { dealt } => *dealt,
        }
    }
}

#[derive(Component, Debug, Clone, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
    invulnerable_until: f32,
    /// Length of the window opened by each hit. Zero disables it.
    pub invulnerability_duration: f32,
    dead: bool,
}

impl Health {
    pub fn new(max: f32, invulnerability_duration: f32) -> Self {
        let max = max.max(0.0);
        Self {
            current: max,
            max,
            invulnerable_until: f32::NEG_INFINITY,
            invulnerability_duration: invulnerability_duration.max(0.0),
            dead: false,
        }
    }

    pub fn current(&self) -> f32 {
        self.current
    }

    pub fn max(&self) -> f32 {
        self.max
    }

    pub fn is_dead(&self) -> bool {
        self.dead
    }

    pub fn is_alive(&self) -> bool {
        !self.dead
    }

    pub fn is_invulnerable(&self, now: f32) -> bool {
        now < self.invulnerable_until
    }

    pub fn fraction(&self) -> f32 {
        if self.max > 0.0 {
            self.current / self.max
        } else {
            0.0
        }
    }

    pub fn take_damage(&mut self, now: f32, amount: f32) -> DamageOutcome {
        if self.dead || self.is_invulnerable(now) || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }

        let before = self.current;
        self.current = (self.current - amount).max(0.0);
        let dealt = before - self.current;

        if self.current <= 0.0 {
            self.dead = true;
            return DamageOutcome::Killed { dealt };
        }

        self.invulnerable_until = now + self.invulnerability_duration;
        DamageOutcome::Hit { dealt }
    }

    /// Returns the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if self.dead || amount <= 0.0 {
            return 0.0;
        }
        let before = self.current;
        self.current = (self.current + amount).min(self.max);
        self.current - before
    }

    pub fn restore_full(&mut self) -> f32 {
        if self.dead {
            return 0.0;
        }
        let before = self.current;
        self.current = self.max;
        self.current - before
    }

    /// Raise max health, keeping the current health percentage.
    pub fn increase_max(&mut self, amount: f32) {
        if amount <= 0.0 {
            return;
        }
        let fraction = self.fraction();
        self.max += amount;
        if !self.dead {
            self.current = fraction * self.max;
        }
    }

    /// Overwrite values from a persisted snapshot. Never revives the dead.
    pub fn restore_from(&mut self, current: f32, max: f32) {
        self.max = max.max(0.0);
        self.current = current.clamp(0.0, self.max);
        if self.current <= 0.0 {
            self.dead = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invulnerability_blocks_damage_entirely() {
        let mut health = Health::new(50.0, 1.5);
        assert_eq!(health.take_damage(0.0, 10.0), DamageOutcome::Hit { dealt: 10.0 });
        assert_eq!(health.take_damage(1.0, 10.0), DamageOutcome::Ignored);
        assert_eq!(health.current(), 40.0);

        // window has expired
        assert_eq!(health.take_damage(1.5, 10.0), DamageOutcome::Hit { dealt: 10.0 });
        assert_eq!(health.current(), 30.0);
    }

    #[test]
    fn test_death_reported_once() {
        let mut health = Health::new(20.0, 0.0);
        assert_eq!(health.take_damage(0.0, 50.0), DamageOutcome::Killed { dealt: 20.0 });
        assert!(health.is_dead());
        assert_eq!(health.current(), 0.0);
        assert_eq!(health.take_damage(5.0, 50.0), DamageOutcome::Ignored);
    }

    #[test]
    fn test_negative_magnitudes_are_ignored() {
        let mut health = Health::new(100.0, 0.0);
        health.take_damage(0.0, 30.0);
        assert_eq!(health.take_damage(1.0, -10.0), DamageOutcome::Ignored);
        assert_eq!(health.heal(-10.0), 0.0);
        assert_eq!(health.current(), 70.0);
    }

    #[test]
    fn test_heal_clamps_to_max_and_ignores_dead() {
        let mut health = Health::new(100.0, 0.0);
        health.take_damage(0.0, 10.0);
        assert_eq!(health.heal(25.0), 10.0);
        assert_eq!(health.current(), 100.0);

        health.take_damage(1.0, 100.0);
        assert_eq!(health.heal(25.0), 0.0);
        assert!(health.is_dead());
    }

    #[test]
    fn test_increase_max_keeps_percentage() {
        let mut health = Health::new(100.0, 0.0);
        health.take_damage(0.0, 50.0);
        health.increase_max(100.0);
        assert_eq!(health.max(), 200.0);
        assert_eq!(health.current(), 100.0);
    }

    #[test]
    fn test_bounds_hold_under_mixed_sequences() {
        let mut health = Health::new(80.0, 0.25);
        let amounts = [12.0, -3.0, 40.0, 7.5, 100.0, 0.0, 33.0, 2.0];
        for (i, amount) in amounts.iter().cycle().take(64).enumerate() {
            let now = i as f32 * 0.1;
            if i % 3 == 0 {
                health.heal(*amount);
            } else {
                health.take_damage(now, *amount);
            }
            assert!(health.current() >= 0.0);
            assert!(health.current() <= health.max());
        }
    }
}
