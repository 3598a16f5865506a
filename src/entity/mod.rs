pub mod agent;
pub mod arena;
pub mod emotion;
pub mod memory;
pub mod needs;
pub mod personality;
pub mod relationships;
pub mod species;

pub use agent::{Agent, Mind};
pub use arena::AgentArena;
pub use needs::{NeedType, Needs};
pub use personality::Personality;
pub use species::{AgentKind, AnimalKind, Race};
