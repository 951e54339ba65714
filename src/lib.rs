//! Spellswarm - wave survival simulation core
//!
//! A fixed-timestep simulation of a top-down survival run: enemies arrive in
//! timed rounds, the player's magics cast on their own, experience buys level
//! ups and every level up offers a choice of new or stronger magics.
//!
//! This library exposes the simulation for the headless runner and for tests.
//! Presentation layers subscribe to the events in [`combat::events`].

pub mod cli;
pub mod combat;
pub mod headless;
pub mod settings;
pub mod sim;

// Re-export commonly used types
pub use combat::log::{CombatLog, CombatLogEventType};
pub use headless::HeadlessRunConfig;
pub use settings::SimSettings;
pub use sim::SimulationPlugin;
