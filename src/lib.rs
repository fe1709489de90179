//! Deterministic artificial-life simulation of genome-driven agents ("neds") moving,
//! feeding and mating on a bounded grid of food patches.
//!
//! A [`Simulation`] owns the whole world behind one lock. Drive it with
//! [`Simulation::step`] for single ticks or [`Simulation::run`] on a dedicated thread,
//! and observe it through [`Listener`]s and the query methods.

pub mod agent;
pub mod config;
pub mod direction;
pub mod engine;
pub mod events;
pub mod grid;
pub mod patch;
pub mod record;
pub mod rng;

pub use agent::{Agent, AgentId, Opcode, Sex};
pub use config::Config;
pub use direction::Direction;
pub use engine::{Reseed, Simulation, Stats};
pub use events::{EventBus, Listener, SimEvent};
pub use grid::{BoundaryPolicy, Coordinate, Dimensions};
pub use patch::{FoodRange, Patch};
pub use rng::RandomSource;
