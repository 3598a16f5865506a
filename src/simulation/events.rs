//! Records emitted by each manager update

use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Vec2};
use crate::entity::species::AgentKind;
use crate::simulation::brain::Behavior;
use crate::world::tile::ResourceKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DeathCause {
    Starvation,
    Dehydration,
    Killed { by: AgentId },
    /// Removed through `EntityManager::kill_at`
    Smitten,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SimulationEvent {
    Spawned {
        id: AgentId,
        kind: AgentKind,
        position: Vec2,
    },
    Died {
        id: AgentId,
        kind: AgentKind,
        cause: DeathCause,
    },
    BehaviorChanged {
        id: AgentId,
        from: Behavior,
        to: Behavior,
    },
    Attacked {
        attacker: AgentId,
        victim: AgentId,
        damage: f32,
    },
    Harvested {
        id: AgentId,
        resource: ResourceKind,
        amount: f32,
    },
    Built {
        id: AgentId,
        x: i32,
        y: i32,
    },
    Born {
        parent: AgentId,
        child: AgentId,
        kind: AgentKind,
    },
}

impl SimulationEvent {
    /// Agent the event is primarily about
    pub fn subject(&self) -> AgentId {
        match self {
            SimulationEvent::Spawned { id, .. }
            | SimulationEvent::Died { id, .. }
            | SimulationEvent::BehaviorChanged { id, .. }
            | SimulationEvent::Harvested { id, .. }
            | SimulationEvent::Built { id, .. } => *id,
            SimulationEvent::Attacked { attacker, .. } => *attacker,
            SimulationEvent::Born { child, .. } => *child,
        }
    }
}
