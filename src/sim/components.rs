//! Components and resources shared by the simulation systems.
//!
//! Positions live in `Transform::translation` on the XY plane; `z` is unused.

use bevy::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::VecDeque;

use super::cooldown::CooldownActivator;
use super::magic::MagicId;
use super::upgrades::UpgradeOption;

// ============================================================================
// Entities
// ============================================================================

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Team {
    Player,
    Enemy,
}

#[derive(Component, Debug, Default)]
pub struct Player;

#[derive(Component, Debug, Clone)]
pub struct Enemy {
    pub archetype: String,
    /// Round that spawned this enemy; kills only count toward that round.
    pub round_number: u32,
}

#[derive(Component, Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity(pub Vec2);

/// Base movement speed in units per second, scaled by the speed multiplier.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MoveSpeed(pub f32);

/// Circle used for contact, projectile and pickup checks.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Collider {
    pub radius: f32,
}

/// Damage dealt to the player on touch, throttled per enemy.
#[derive(Component, Debug, Clone)]
pub struct ContactDamage {
    pub amount: f32,
    pub interval: f32,
    pub cooldown: CooldownActivator,
}

impl ContactDamage {
    pub fn new(amount: f32, interval: f32) -> Self {
        Self {
            amount,
            interval,
            cooldown: CooldownActivator::new(),
        }
    }
}

/// Experience granted to the killer.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExperienceReward(pub u32);

/// Enemies only chase a player within this distance.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct DetectionRange(pub f32);

/// Periodic heal in health per second.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Regeneration {
    pub per_second: f32,
}

/// Dead but not yet despawned. Excluded from targeting and movement.
#[derive(Component, Debug, Default)]
pub struct Dead;

/// Present while the hit flash plays.
#[derive(Component, Debug, Default)]
pub struct HitFlash;

/// Dash ability of the player.
#[derive(Component, Debug, Clone)]
pub struct DashAbility {
    pub distance: f32,
    pub duration: f32,
    pub cooldown_secs: f32,
    pub cooldown: CooldownActivator,
    /// Horizontal facing, used when a dash starts without move input
    pub facing: Vec2,
}

impl DashAbility {
    pub fn new(distance: f32, duration: f32, cooldown_secs: f32) -> Self {
        Self {
            distance,
            duration,
            cooldown_secs,
            cooldown: CooldownActivator::new(),
            facing: Vec2::X,
        }
    }

    pub fn speed(&self) -> f32 {
        self.distance / self.duration.max(f32::EPSILON)
    }
}

/// Present while a dash is in progress. Dashing entities cannot be touched.
#[derive(Component, Debug, Clone, Copy)]
pub struct Dashing {
    pub direction: Vec2,
}

// ============================================================================
// Magic entities
// ============================================================================

/// A fired projectile. Damage is snapshotted when cast.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub owner: Entity,
    pub magic: MagicId,
    pub damage: f32,
    pub radius: f32,
    pub expires_at: f32,
}

/// A ball circling its owner. One per orbit magic.
#[derive(Component, Debug, Clone)]
pub struct OrbitBall {
    pub owner: Entity,
    pub magic: MagicId,
    /// Current angle in degrees
    pub angle: f32,
    pub angular_speed: f32,
    pub ball_radius: f32,
    pub height: f32,
}

/// A short-lived volume around the caster.
#[derive(Component, Debug, Clone)]
pub struct SlashVolume {
    pub owner: Entity,
    pub magic: MagicId,
    pub damage: f32,
    pub radius: f32,
    pub expires_at: f32,
    /// Enemies already hit by this activation
    pub hit: SmallVec<[Entity; 8]>,
}

// ============================================================================
// Items
// ============================================================================

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct HealthPotion {
    pub heal_amount: f32,
}

// ============================================================================
// Resources
// ============================================================================

/// Seeded random number generator for deterministic runs.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    /// Create a new GameRng with a specific seed for deterministic behavior
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    /// Create a new GameRng with random entropy (non-deterministic)
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// Generate a random f32 in the given range
    pub fn random_range(&mut self, min: f32, max: f32) -> f32 {
        min + self.random_f32() * (max - min)
    }

    /// True with probability `chance`.
    pub fn chance(&mut self, chance: f32) -> bool {
        chance > 0.0 && self.random_f32() < chance
    }

    /// Random index below `len`. `len` must be non-zero.
    pub fn index(&mut self, len: usize) -> usize {
        self.rng.gen_range(0..len)
    }

    pub fn rng_mut(&mut self) -> &mut StdRng {
        &mut self.rng
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Controls the speed of the simulation
#[derive(Resource, Debug, Clone)]
pub struct SimulationSpeed {
    /// Speed multiplier (0.0 = paused, 1.0 = normal, 2.0 = double)
    pub multiplier: f32,
}

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

impl SimulationSpeed {
    pub fn pause(&mut self) {
        self.multiplier = 0.0;
    }

    pub fn normal_speed(&mut self) {
        self.multiplier = 1.0;
    }

    pub fn is_paused(&self) -> bool {
        self.multiplier == 0.0
    }
}

/// How the run is going. Time only advances while `Playing`.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunState {
    #[default]
    Playing,
    /// Waiting for an upgrade selection
    ChoosingUpgrade,
    GameOver,
    Victory,
}

impl RunState {
    pub fn is_finished(&self) -> bool {
        matches!(self, RunState::GameOver | RunState::Victory)
    }
}

/// Totals for the current run.
#[derive(Resource, Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunStats {
    pub elapsed: f32,
    pub enemies_killed: u32,
    pub highest_level: u32,
    pub rounds_completed: u32,
    pub damage_dealt: f32,
    pub damage_taken: f32,
    pub potions_collected: u32,
}

/// One level-up's worth of choices.
#[derive(Debug, Clone, PartialEq)]
pub struct OfferSet {
    pub level: u32,
    pub options: Vec<UpgradeOption>,
}

/// Level-ups waiting for a selection. Only the front one has offers; the
/// rest are generated after the previous selection is applied.
#[derive(Resource, Debug, Default)]
pub struct PendingOffers {
    pub queued_levels: VecDeque<u32>,
    pub current: Option<OfferSet>,
}

impl PendingOffers {
    pub fn is_empty(&self) -> bool {
        self.queued_levels.is_empty() && self.current.is_none()
    }

    pub fn len(&self) -> usize {
        self.queued_levels.len() + usize::from(self.current.is_some())
    }
}

/// Who picks upgrades when offers are presented.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum UpgradePolicy {
    /// Wait for an `UpgradeSelectedEvent`
    #[default]
    Manual,
    /// Always take the first offer
    FirstOffer,
    /// Pick uniformly with the game RNG
    Random,
}

/// Movement intent sampled once per frame.
#[derive(Resource, Debug, Clone, Copy, Default, PartialEq)]
pub struct InputIntent {
    pub move_vector: Vec2,
    pub dash: bool,
}

/// Horizontal position of an entity.
pub fn planar(transform: &Transform) -> Vec2 {
    transform.translation.truncate()
}
