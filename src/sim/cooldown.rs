//! Cooldown gate shared by magic auto-casts, orbit hit throttling,
//! enemy contact damage and the dash.

/// "Ready at last activation + duration" timer.
///
/// The duration is passed on every check instead of being stored, so a
/// level-up or buff takes effect from the next check on without crediting
/// time that already elapsed.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CooldownActivator {
    last_activation: Option<f32>,
}

impl CooldownActivator {
    pub fn new() -> Self {
        Self::default()
    }

    /// A timer that counts as activated at `now`.
    pub fn activated_at(now: f32) -> Self {
        Self {
            last_activation: Some(now),
        }
    }

    pub fn last_activation(&self) -> Option<f32> {
        self.last_activation
    }

    pub fn is_ready(&self, now: f32, duration: f32) -> bool {
        match self.last_activation {
            None => true,
            Some(last) => now >= last + duration.max(0.0),
        }
    }

    /// Seconds until ready, zero when ready.
    pub fn remaining(&self, now: f32, duration: f32) -> f32 {
        match self.last_activation {
            None => 0.0,
            Some(last) => (last + duration.max(0.0) - now).max(0.0),
        }
    }

    /// Run `effect` and restart the timer if ready, otherwise do nothing.
    pub fn activate<T>(&mut self, now: f32, duration: f32, effect: impl FnOnce() -> T) -> Option<T> {
        if !self.is_ready(now, duration) {
            return None;
        }
        self.last_activation = Some(now);
        Some(effect())
    }

    /// Restart the timer without running anything.
    pub fn trigger(&mut self, now: f32) {
        self.last_activation = Some(now);
    }

    pub fn reset(&mut self) {
        self.last_activation = None;
    }
}
