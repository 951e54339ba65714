//! Simulation Systems API
//!
//! Stable entry point for the simulation systems. The headless runner and the
//! tests import from here rather than from the internal modules.
//!
//! ## System Phases
//!
//! Every `FixedUpdate` tick runs five ordered phases:
//!
//! 1. **Clock** - upgrade selection, offer presentation, clock advance (always runs)
//! 2. **Timers** - scheduled resumptions, regeneration, round ticking and spawning
//! 3. **Decision** - player intent, enemy steering, magic casting and hit tests,
//!    contact damage, potion pickup
//! 4. **Resolution** - damage application, deaths, rewards, level-ups, run end
//! 5. **Integration** - movement, orbit placement, potion attraction
//!
//! Phases 2 to 5 only run on ticks where the clock advanced, so a paused run or
//! a pending upgrade choice freezes the whole world.
//!
//! ## Usage
//!
//! ```ignore
//! use spellswarm::sim::systems;
//!
//! systems::configure_sim_system_ordering(&mut app);
//! systems::add_core_sim_systems(&mut app, || true);
//! ```

use bevy::prelude::*;

// === Phase 1: Clock ===
pub use super::run_flow::{advance_clock, apply_upgrade_selection, auto_select_upgrade, present_next_offers};

// === Phase 2: Timers ===
pub use super::combat_core::regenerate_health;
pub use super::run_flow::process_resumptions;
pub use super::spawning::tick_rounds;

// === Phase 3: Decision ===
pub use super::combat_core::contact_damage;
pub use super::items::collect_potions;
pub use super::movement::{apply_player_intent, steer_enemies};
pub use super::projectiles::{cast_magics, orbit_ball_hits, projectile_hits, slash_hits, sync_orbit_balls};

// === Phase 4: Resolution ===
pub use super::combat_core::{apply_damage, award_experience, handle_deaths};
pub use super::run_flow::check_run_end;

// === Phase 5: Integration ===
pub use super::items::attract_potions;
pub use super::movement::integrate_velocity;
pub use super::projectiles::place_orbit_balls;

// === Components and Resources ===
pub use super::components::{
    Collider, ContactDamage, Dashing, DashAbility, Dead, Enemy, GameRng, HealthPotion, InputIntent,
    OrbitBall, PendingOffers, Player, Projectile, RunState, RunStats, SimulationSpeed, SlashVolume,
    Team, UpgradePolicy, Velocity,
};

/// System set labels for simulation ordering.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimPhase {
    /// Phase 1: upgrade choice, offers, clock advance
    Clock,
    /// Phase 2: resumptions, regeneration, rounds
    Timers,
    /// Phase 3: intents, targeting, hit tests, damage requests
    Decision,
    /// Phase 4: damage, deaths, rewards
    Resolution,
    /// Phase 5: movement
    Integration,
}

/// Configures the ordering between simulation phases.
///
/// Call this once during app setup before adding simulation systems.
pub fn configure_sim_system_ordering(app: &mut App) {
    app.configure_sets(
        FixedUpdate,
        (
            SimPhase::Clock,
            SimPhase::Timers,
            SimPhase::Decision,
            SimPhase::Resolution,
            SimPhase::Integration,
        )
            .chain(),
    );
}

/// Adds the core simulation systems to the app.
///
/// # Arguments
/// * `app` - The Bevy App to add systems to
/// * `run_condition` - An outer run condition (`|| true` to always run)
pub fn add_core_sim_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone)
where
    M: 'static,
{
    // Phase 1: Clock
    app.add_systems(
        FixedUpdate,
        (
            auto_select_upgrade,
            apply_upgrade_selection,
            present_next_offers,
            advance_clock,
        )
            .chain()
            .in_set(SimPhase::Clock)
            .run_if(run_condition.clone()),
    );

    // Phase 2: Timers
    app.add_systems(
        FixedUpdate,
        (process_resumptions, regenerate_health, tick_rounds)
            .chain()
            .in_set(SimPhase::Timers)
            .run_if(run_condition.clone())
            .run_if(super::clock_is_running),
    );

    // Flush deferred commands between phases
    app.add_systems(
        FixedUpdate,
        apply_deferred
            .after(SimPhase::Timers)
            .before(SimPhase::Decision),
    );

    // Phase 3: Decision
    app.add_systems(
        FixedUpdate,
        (
            apply_player_intent,
            steer_enemies,
            sync_orbit_balls,
            cast_magics,
            orbit_ball_hits,
            projectile_hits,
            slash_hits,
            contact_damage,
            collect_potions,
        )
            .chain()
            .in_set(SimPhase::Decision)
            .run_if(run_condition.clone())
            .run_if(super::clock_is_running),
    );

    app.add_systems(
        FixedUpdate,
        apply_deferred
            .after(SimPhase::Decision)
            .before(SimPhase::Resolution),
    );

    // Phase 4: Resolution
    app.add_systems(
        FixedUpdate,
        (apply_damage, handle_deaths, award_experience, check_run_end)
            .chain()
            .in_set(SimPhase::Resolution)
            .run_if(run_condition.clone())
            .run_if(super::clock_is_running),
    );

    app.add_systems(
        FixedUpdate,
        apply_deferred
            .after(SimPhase::Resolution)
            .before(SimPhase::Integration),
    );

    // Phase 5: Integration
    app.add_systems(
        FixedUpdate,
        (integrate_velocity, place_orbit_balls, attract_potions)
            .chain()
            .in_set(SimPhase::Integration)
            .run_if(run_condition)
            .run_if(super::clock_is_running),
    );
}
