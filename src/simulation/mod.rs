//! Simulation: decision making, behavior execution and the entity manager

pub mod brain;
pub mod events;
pub mod execute;
pub mod interaction;
pub mod manager;
pub mod perception;

pub use brain::{Behavior, Brain, Candidate, Target};
pub use events::{DeathCause, SimulationEvent};
pub use manager::{Command, EntityManager, ManagerSnapshot};
pub use perception::{Perceived, Perception};
