//! Combat events
//!
//! Damage requests flow from the decision phase to the resolution phase; every
//! other event is a notification for presentation and logging. Readers never
//! feed back into the tick that produced an event.

use bevy::prelude::*;

use crate::sim::components::Team;
use crate::sim::magic::MagicId;
use crate::sim::rounds::RoundState;
use crate::sim::upgrades::UpgradeOption;

/// Request to damage `target`, applied in the resolution phase
#[derive(Event, Debug, Clone)]
pub struct DamageEvent {
    /// Owning entity (the player for magic, the enemy for contact damage)
    pub source: Entity,
    pub target: Entity,
    /// Amount before invulnerability and clamping
    pub amount: f32,
    /// Magic that caused the damage (None for contact damage)
    pub magic: Option<MagicId>,
}

/// Why a health value changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthChangeCause {
    Damage,
    Regeneration,
    Potion,
    LevelUp,
    Restore,
}

/// Fired whenever health actually changes
#[derive(Event, Debug, Clone)]
pub struct HealthChangedEvent {
    pub entity: Entity,
    pub current: f32,
    pub max: f32,
    /// Signed change: negative for damage
    pub delta: f32,
    pub cause: HealthChangeCause,
}

/// Fired exactly once per death
#[derive(Event, Debug, Clone)]
pub struct DeathEvent {
    pub victim: Entity,
    pub team: Team,
    /// Source of the killing blow
    pub killer: Option<Entity>,
    pub magic: Option<MagicId>,
}

#[derive(Event, Debug, Clone)]
pub struct ExperienceGainedEvent {
    pub entity: Entity,
    pub amount: u32,
    pub experience: u32,
    pub experience_to_next_level: u32,
}

/// One event per level reached
#[derive(Event, Debug, Clone)]
pub struct LevelUpEvent {
    pub entity: Entity,
    pub level: u32,
}

#[derive(Event, Debug, Clone)]
pub struct RoundStateChangedEvent {
    /// 1-based round number
    pub round: u32,
    pub state: RoundState,
}

/// A magic fired (projectile launched, slash opened, orbit ball struck)
#[derive(Event, Debug, Clone)]
pub struct MagicCastEvent {
    pub caster: Entity,
    pub magic: MagicId,
    pub target: Option<Entity>,
}

#[derive(Event, Debug, Clone)]
pub struct MagicAcquiredEvent {
    pub owner: Entity,
    pub magic: MagicId,
}

#[derive(Event, Debug, Clone)]
pub struct MagicLevelUpEvent {
    pub owner: Entity,
    pub magic: MagicId,
    pub level: u32,
}

/// Choices for one level-up, presented while the run waits
#[derive(Event, Debug, Clone)]
pub struct UpgradeOffersEvent {
    pub level: u32,
    pub options: Vec<UpgradeOption>,
}

/// Selection of an index into the current offers
#[derive(Event, Debug, Clone, Copy)]
pub struct UpgradeSelectedEvent {
    pub index: usize,
}

/// How a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum RunOutcome {
    /// Every round completed with the player alive
    Victory,
    /// The player died
    Defeat,
    /// An outer time limit stopped the run
    Timeout,
}

#[derive(Event, Debug, Clone)]
pub struct RunEndedEvent {
    pub outcome: RunOutcome,
    /// Simulation seconds at the end of the run
    pub elapsed: f32,
}
