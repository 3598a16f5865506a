//! Agent state: body, species profile and (for creatures) a mind

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, FactionId, Vec2};
use crate::entity::emotion::EmotionState;
use crate::entity::memory::MemoryBank;
use crate::entity::needs::Needs;
use crate::entity::personality::Personality;
use crate::entity::relationships::Relationships;
use crate::entity::species::AgentKind;
use crate::simulation::brain::Brain;
use crate::simulation::events::DeathCause;

/// Inner life of a creature. Animals run on their species profile alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mind {
    pub needs: Needs,
    pub personality: Personality,
    pub emotion: EmotionState,
    pub memory: MemoryBank,
    pub relationships: Relationships,
}

impl Mind {
    pub fn new(personality: Personality, memory_capacity: usize) -> Self {
        Self {
            needs: Needs::default(),
            personality,
            emotion: EmotionState::default(),
            memory: MemoryBank::new(memory_capacity),
            relationships: Relationships::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub kind: AgentKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    /// World units per second
    pub speed: f32,
    pub faction: Option<FactionId>,
    pub mind: Option<Mind>,
    pub brain: Brain,
    /// Seconds alive
    pub age: f32,
    /// Gathered resource units
    pub carried: f32,
    /// Seconds until the next strike is allowed
    pub attack_cooldown: f32,
    /// Seconds until another birth is allowed
    pub reproduction_cooldown: f32,
    /// Most recent source of harm; becomes the cause of death
    pub last_harm: Option<DeathCause>,
}

impl Agent {
    /// Fresh agent at full health; creatures get a random personality
    pub fn new(
        id: AgentId,
        kind: AgentKind,
        position: Vec2,
        memory_capacity: usize,
        rng: &mut impl Rng,
    ) -> Self {
        let stats = kind.stats();
        let (mind, faction) = match kind {
            AgentKind::Creature(race) => (
                Some(Mind::new(Personality::random(rng), memory_capacity)),
                Some(FactionId(race as u32)),
            ),
            AgentKind::Animal(_) => (None, None),
        };

        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            hp: stats.max_hp,
            max_hp: stats.max_hp,
            speed: stats.speed,
            faction,
            mind,
            brain: Brain::default(),
            age: 0.0,
            carried: 0.0,
            attack_cooldown: 0.0,
            reproduction_cooldown: 0.0,
            last_harm: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn is_creature(&self) -> bool {
        self.kind.is_creature()
    }

    pub fn needs(&self) -> Option<&Needs> {
        self.mind.as_ref().map(|m| &m.needs)
    }

    pub fn personality(&self) -> Option<&Personality> {
        self.mind.as_ref().map(|m| &m.personality)
    }

    /// Radius this agent notices others within
    pub fn perception_radius(&self, creature_default: f32) -> f32 {
        self.kind
            .stats()
            .perception_radius
            .unwrap_or(creature_default)
    }

    /// Action effectiveness multiplier from unmet needs
    pub fn stat_penalty(&self) -> f32 {
        self.needs().map(|n| n.stat_penalty()).unwrap_or(1.0)
    }

    pub fn health_fraction(&self) -> f32 {
        if self.max_hp > 0.0 {
            (self.hp / self.max_hp).clamp(0.0, 1.0)
        } else {
            0.0
        }
    }

    /// Apply damage, remembering who (or what) dealt it
    pub fn take_damage(&mut self, amount: f32, cause: DeathCause) {
        self.hp = (self.hp - amount.max(0.0)).max(0.0);
        self.last_harm = Some(cause);
    }
}
