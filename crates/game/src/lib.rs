//! Disaster Simulator core: level phases, hazards, structural collapse and
//! player survival, driven one fixed tick at a time.
//!
//! Hosts create a [`Simulation`], call [`Simulation::tick`] with the
//! frame's [`input::MovementIntent`], and drain [`SimEvent`]s to drive
//! rendering, UI and audio.

pub mod config;
pub mod destruction;
pub mod events;
pub mod hazards;
pub mod levels;
pub mod phase;
pub mod player;
pub mod safety;
pub mod scene;
pub mod sim;
pub mod state;
pub mod tasks;

pub use config::{ConfigError, SimConfig, Theme};
pub use events::{AudioCue, SimEvent, WorldEntity};
pub use hazards::HazardKind;
pub use sim::Simulation;
pub use state::Phase;
