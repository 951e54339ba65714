//! Survival simulation
//!
//! Everything that moves the run forward lives here. Pure game rules
//! (`stats`, `health`, `cooldown`, `progression`, `upgrades`, `rounds`) have
//! no ECS dependencies beyond a few types; the system modules wire them into
//! Bevy's `FixedUpdate` schedule in the phases described in [`systems`].
//!
//! ## Flow
//! 1. `setup_run` (Startup): spawn the player, start round 1
//! 2. Every fixed tick: clock, timers, decisions, resolution, integration
//! 3. A level-up queues an offer set; the clock holds until a selection arrives
//! 4. The run ends in victory (all rounds complete) or game over (player death)

pub mod combat_core;
pub mod components;
pub mod cooldown;
pub mod health;
pub mod input;
pub mod items;
pub mod magic;
pub mod magic_config;
pub mod movement;
pub mod progression;
pub mod projectiles;
pub mod rounds;
pub mod run_flow;
pub mod schedule;
pub mod snapshot;
pub mod spawning;
pub mod stats;
pub mod systems;
pub mod targeting;
pub mod upgrades;

use bevy::prelude::*;
use std::time::Duration;

use crate::combat::CombatPlugin;
use crate::settings::SimSettings;

use components::{
    GameRng, InputIntent, PendingOffers, RunState, RunStats, SimulationSpeed, UpgradePolicy,
};
use input::{sample_input, InputProvider};
use magic_config::MagicCatalog;
use rounds::RoundsConfig;
use schedule::{SimClock, SimSchedule};
use spawning::{EdgeSpawner, EnemySpawner, RoundDirector};

/// Run condition: true on ticks where simulation time moved.
pub fn clock_is_running(clock: Res<SimClock>) -> bool {
    clock.is_running()
}

/// Installs the simulation resources and systems.
#[derive(Clone)]
pub struct SimulationPlugin {
    pub settings: SimSettings,
    pub catalog: MagicCatalog,
    pub rounds: RoundsConfig,
    /// Seed for `GameRng`; entropy when absent
    pub seed: Option<u64>,
    pub policy: UpgradePolicy,
}

impl SimulationPlugin {
    /// Load the magic and round files the settings point at.
    pub fn load(settings: SimSettings) -> Result<Self, String> {
        let catalog = MagicCatalog::load_from_file(&settings.magics_path)?;
        let rounds = RoundsConfig::load_from_file(&settings.rounds_path)?;
        Ok(Self {
            settings,
            catalog,
            rounds,
            seed: None,
            policy: UpgradePolicy::default(),
        })
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_policy(mut self, policy: UpgradePolicy) -> Self {
        self.policy = policy;
        self
    }
}

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        let game_rng = match self.seed {
            Some(seed) => {
                info!("Using deterministic RNG with seed: {}", seed);
                GameRng::from_seed(seed)
            }
            None => {
                info!("Using non-deterministic RNG (no seed provided)");
                GameRng::from_entropy()
            }
        };
        let tick = self.settings.tick_seconds();

        app.insert_resource(self.settings.clone())
            .insert_resource(self.catalog.clone())
            .insert_resource(RoundDirector::new(self.rounds.clone()))
            .insert_resource(EnemySpawner::new(EdgeSpawner {
                radius: self.rounds.spawn_radius,
            }))
            .insert_resource(SimClock::new(tick))
            .insert_resource(Time::<Fixed>::from_duration(Duration::from_secs_f32(tick)))
            .insert_resource(game_rng)
            .insert_resource(self.policy)
            .init_resource::<SimSchedule>()
            .init_resource::<SimulationSpeed>()
            .init_resource::<RunState>()
            .init_resource::<RunStats>()
            .init_resource::<PendingOffers>()
            .init_resource::<InputIntent>()
            .init_resource::<InputProvider>();

        if !app.is_plugin_added::<CombatPlugin>() {
            app.add_plugins(CombatPlugin);
        }

        systems::configure_sim_system_ordering(app);
        systems::add_core_sim_systems(app, || true);

        app.add_systems(Startup, run_flow::setup_run)
            .add_systems(PreUpdate, sample_input);
    }
}
