//! Save and load a whole world as JSON
//!
//! Agents are written as flat records: needs, personality, emotion, memories
//! and relationships sit directly on each record instead of nested in a mind.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{AgentId, FactionId, Tick, Vec2};
use crate::entity::agent::{Agent, Mind};
use crate::entity::arena::ArenaLayout;
use crate::entity::emotion::EmotionState;
use crate::entity::memory::{Memory, MemoryBank};
use crate::entity::needs::{NeedType, Needs, NEED_MAX};
use crate::entity::personality::Personality;
use crate::entity::relationships::{Relationships, AFFINITY_MAX, AFFINITY_MIN};
use crate::entity::species::AgentKind;
use crate::simulation::brain::Brain;
use crate::simulation::events::DeathCause;
use crate::simulation::manager::{EntityManager, ManagerSnapshot, RngState};
use crate::world::map::WorldMap;

/// Bumped whenever the record layout changes
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentRecord {
    pub id: AgentId,
    pub kind: AgentKind,
    pub position: Vec2,
    pub velocity: Vec2,
    pub hp: f32,
    pub max_hp: f32,
    pub speed: f32,
    pub faction: Option<FactionId>,
    pub brain: Brain,
    pub age: f32,
    pub carried: f32,
    pub attack_cooldown: f32,
    pub reproduction_cooldown: f32,
    pub last_harm: Option<DeathCause>,
    // Mind, absent for animals
    pub needs: Option<Needs>,
    pub personality: Option<Personality>,
    pub emotion: Option<EmotionState>,
    pub memory_capacity: usize,
    /// Oldest first
    pub memories: Vec<Memory>,
    pub relationships: Vec<(AgentId, f32)>,
}

impl From<&Agent> for AgentRecord {
    fn from(agent: &Agent) -> Self {
        let mind = agent.mind.as_ref();
        Self {
            id: agent.id,
            kind: agent.kind,
            position: agent.position,
            velocity: agent.velocity,
            hp: agent.hp,
            max_hp: agent.max_hp,
            speed: agent.speed,
            faction: agent.faction,
            brain: agent.brain.clone(),
            age: agent.age,
            carried: agent.carried,
            attack_cooldown: agent.attack_cooldown,
            reproduction_cooldown: agent.reproduction_cooldown,
            last_harm: agent.last_harm,
            needs: mind.map(|m| m.needs.clone()),
            personality: mind.map(|m| m.personality),
            emotion: mind.map(|m| m.emotion),
            memory_capacity: mind.map(|m| m.memory.capacity()).unwrap_or(0),
            memories: mind
                .map(|m| m.memory.iter().cloned().collect())
                .unwrap_or_default(),
            relationships: mind.map(|m| m.relationships.entries()).unwrap_or_default(),
        }
    }
}

/// `lo <= value <= hi`; NaN never passes
fn within(value: f32, lo: f32, hi: f32) -> bool {
    value >= lo && value <= hi
}

impl AgentRecord {
    /// Reject values a running simulation never produces: out-of-range
    /// needs, traits, intensities or affinities, and broken body or brain state
    pub fn validate(&self) -> Result<()> {
        let invalid = |what: &str| {
            SimError::InvalidSnapshot(format!("agent {} has an out-of-range {}", self.id, what))
        };

        if !self.position.is_finite() || !self.velocity.is_finite() {
            return Err(invalid("position"));
        }
        if !within(self.max_hp, f32::MIN_POSITIVE, f32::MAX) || !within(self.hp, 0.0, self.max_hp) {
            return Err(invalid("hp"));
        }
        let body = [
            self.speed,
            self.age,
            self.carried,
            self.attack_cooldown,
            self.reproduction_cooldown,
        ];
        if !body.iter().all(|v| within(*v, 0.0, f32::MAX)) {
            return Err(invalid("speed, age, load or cooldown"));
        }
        if !self.brain.is_consistent() {
            return Err(invalid("brain timer or target"));
        }

        if let Some(needs) = &self.needs {
            if !NeedType::BY_IMPORTANCE
                .iter()
                .all(|n| within(needs.get(*n), 0.0, NEED_MAX))
            {
                return Err(invalid("need"));
            }
        }
        if let Some(p) = &self.personality {
            let traits = [
                p.openness(),
                p.conscientiousness(),
                p.extraversion(),
                p.agreeableness(),
                p.neuroticism(),
            ];
            if !traits.iter().all(|t| within(*t, 0.0, 1.0)) {
                return Err(invalid("personality trait"));
            }
        }
        if let Some(emotion) = &self.emotion {
            if !within(emotion.intensity(), 0.0, 1.0) {
                return Err(invalid("emotion intensity"));
            }
        }
        if self
            .memories
            .iter()
            .any(|m| !within(m.intensity, 0.0, 1.0) || !m.position.is_finite())
        {
            return Err(invalid("memory"));
        }
        if self
            .relationships
            .iter()
            .any(|(_, a)| !within(*a, AFFINITY_MIN, AFFINITY_MAX))
        {
            return Err(invalid("affinity"));
        }
        Ok(())
    }

    pub fn into_agent(self) -> Result<Agent> {
        self.validate()?;
        let mind = match (self.needs, self.personality) {
            (Some(needs), Some(personality)) => {
                let mut relationships = Relationships::new();
                for (other, affinity) in self.relationships {
                    relationships.adjust(other, affinity);
                }
                Some(Mind {
                    needs,
                    personality,
                    emotion: self.emotion.unwrap_or_default(),
                    memory: MemoryBank::from_entries(self.memory_capacity, self.memories),
                    relationships,
                })
            }
            (None, None) => None,
            _ => {
                return Err(SimError::InvalidSnapshot(format!(
                    "agent {} has a partial mind",
                    self.id
                )))
            }
        };
        if mind.is_some() != self.kind.is_creature() {
            return Err(SimError::InvalidSnapshot(format!(
                "agent {} ({}) has the wrong kind of mind",
                self.id, self.kind
            )));
        }

        Ok(Agent {
            id: self.id,
            kind: self.kind,
            position: self.position,
            velocity: self.velocity,
            hp: self.hp,
            max_hp: self.max_hp,
            speed: self.speed,
            faction: self.faction,
            mind,
            brain: self.brain,
            age: self.age,
            carried: self.carried,
            attack_cooldown: self.attack_cooldown,
            reproduction_cooldown: self.reproduction_cooldown,
            last_harm: self.last_harm,
        })
    }
}

/// Everything needed to resume a run: map, config and every agent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    pub version: u32,
    pub config: SimulationConfig,
    pub map: WorldMap,
    pub tick: Tick,
    pub elapsed: f64,
    pub rng: RngState,
    pub layout: ArenaLayout,
    pub agents: Vec<AgentRecord>,
}

impl WorldSnapshot {
    pub fn capture(map: &WorldMap, manager: &EntityManager) -> Self {
        let snapshot = manager.snapshot();
        Self {
            version: FORMAT_VERSION,
            config: manager.config().clone(),
            map: map.clone(),
            tick: snapshot.tick,
            elapsed: snapshot.elapsed,
            rng: snapshot.rng,
            layout: snapshot.layout,
            agents: snapshot.agents.iter().map(AgentRecord::from).collect(),
        }
    }

    /// Rebuild the map and a manager that continues exactly where the capture left off
    pub fn restore(self) -> Result<(WorldMap, EntityManager)> {
        if self.version != FORMAT_VERSION {
            return Err(SimError::InvalidSnapshot(format!(
                "unsupported format version {} (expected {})",
                self.version, FORMAT_VERSION
            )));
        }
        validate_map(&self.map)?;
        let agents = self
            .agents
            .into_iter()
            .map(AgentRecord::into_agent)
            .collect::<Result<Vec<_>>>()?;
        let manager = EntityManager::restore(
            self.config,
            ManagerSnapshot {
                tick: self.tick,
                elapsed: self.elapsed,
                rng: self.rng,
                layout: self.layout,
                agents,
            },
        )?;
        Ok((self.map, manager))
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_json()?)?;
        tracing::info!("Saved {} agents to {}", self.agents.len(), path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }
}

/// Tile scalars in [0, 1] and resource amounts within their kind's maximum
fn validate_map(map: &WorldMap) -> Result<()> {
    for (x, y, tile) in map.tiles().iter() {
        let climate = [tile.elevation, tile.moisture, tile.temperature];
        let resource_ok = match tile.resource {
            Some(kind) => within(tile.resource_amount, 0.0, kind.max_amount()),
            None => tile.resource_amount == 0.0,
        };
        if !resource_ok || !climate.iter().all(|v| within(*v, 0.0, 1.0)) {
            return Err(SimError::InvalidSnapshot(format!(
                "tile ({}, {}) is out of range",
                x, y
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::memory::MemoryKind;
    use crate::entity::species::{AnimalKind, Race};
    use crate::spatial::grid::Grid;
    use serde_json::json;

    fn populated() -> (WorldMap, EntityManager) {
        let map = WorldMap::from_tiles(3, Grid::new(12, 12));
        let mut manager = EntityManager::new(SimulationConfig::default(), 11).unwrap();
        manager
            .spawn(AgentKind::Creature(Race::Elf), 2.5, 2.5, &map)
            .unwrap();
        manager
            .spawn(AgentKind::Animal(AnimalKind::Fox), 8.5, 8.5, &map)
            .unwrap();
        // Leaves a freed slot with a bumped generation behind
        manager.kill_at(8.5, 8.5, 0.5);
        manager
            .spawn(AgentKind::Animal(AnimalKind::Rabbit), 6.5, 3.5, &map)
            .unwrap();
        (map, manager)
    }

    #[test]
    fn test_record_flattens_mind() {
        let (_, manager) = populated();
        let elf = manager.iter().find(|a| a.is_creature()).unwrap();
        let record = AgentRecord::from(elf);
        assert!(record.needs.is_some());
        assert_eq!(record.memory_capacity, 50);

        let rabbit = manager.iter().find(|a| !a.is_creature()).unwrap();
        let record = AgentRecord::from(rabbit);
        assert!(record.needs.is_none());
        assert!(record.memories.is_empty());
    }

    #[test]
    fn test_record_roundtrip_keeps_memories_and_affinity() {
        let (_, mut manager) = populated();
        let mut map = WorldMap::from_tiles(3, Grid::new(12, 12));
        manager.update(0.1, &mut map);
        let mut elf = manager.iter().find(|a| a.is_creature()).unwrap().clone();
        {
            let mind = elf.mind.as_mut().unwrap();
            mind.memory
                .record(Memory::new(MemoryKind::Shelter, Vec2::new(1.0, 1.0), 0.5, 4));
            mind.relationships.adjust(AgentId::new(40, 2), -60.0);
        }

        let back = AgentRecord::from(&elf).into_agent().unwrap();
        assert_eq!(back, elf);
    }

    #[test]
    fn test_partial_mind_is_rejected() {
        let (_, manager) = populated();
        let elf = manager.iter().find(|a| a.is_creature()).unwrap();
        let mut record = AgentRecord::from(elf);
        record.personality = None;
        assert!(matches!(
            record.into_agent(),
            Err(SimError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_json_roundtrip_restores_handles() {
        let (map, manager) = populated();
        let json = WorldSnapshot::capture(&map, &manager).to_json().unwrap();
        let (restored_map, restored) = WorldSnapshot::from_json(&json).unwrap().restore().unwrap();

        assert_eq!(restored_map.tiles(), map.tiles());
        assert_eq!(restored.ids(), manager.ids());
        assert_eq!(restored.snapshot(), manager.snapshot());
    }

    fn tampered(edit: impl FnOnce(&mut serde_json::Value)) -> Result<WorldSnapshot> {
        let (map, manager) = populated();
        let json = WorldSnapshot::capture(&map, &manager).to_json().unwrap();
        let mut value: serde_json::Value = serde_json::from_str(&json).unwrap();
        edit(&mut value);
        WorldSnapshot::from_json(&value.to_string())
    }

    fn creature_record(value: &mut serde_json::Value) -> &mut serde_json::Value {
        value["agents"]
            .as_array_mut()
            .unwrap()
            .iter_mut()
            .find(|a| !a["needs"].is_null())
            .unwrap()
    }

    #[test]
    fn test_out_of_range_mind_is_rejected() {
        let edits: [fn(&mut serde_json::Value); 3] = [
            |v| creature_record(v)["needs"]["hunger"] = json!(500.0),
            |v| creature_record(v)["personality"]["neuroticism"] = json!(7.0),
            |v| creature_record(v)["emotion"]["intensity"] = json!(-2.0),
        ];
        for edit in edits {
            let snapshot = tampered(edit).unwrap();
            assert!(matches!(snapshot.restore(), Err(SimError::InvalidSnapshot(_))));
        }
    }

    #[test]
    fn test_broken_body_is_rejected() {
        let edits: [fn(&mut serde_json::Value); 3] = [
            |v| creature_record(v)["hp"] = json!(1.0e6),
            |v| creature_record(v)["attack_cooldown"] = json!(-5.0),
            |v| creature_record(v)["brain"]["elapsed"] = json!(-1.0),
        ];
        for edit in edits {
            let snapshot = tampered(edit).unwrap();
            assert!(matches!(snapshot.restore(), Err(SimError::InvalidSnapshot(_))));
        }
    }

    #[test]
    fn test_overfull_tile_is_rejected() {
        let snapshot = tampered(|v| {
            let tile = &mut v["map"]["tiles"]["data"][0];
            tile["resource"] = "Berries".into();
            tile["resource_amount"] = json!(500.0);
        })
        .unwrap();
        assert!(matches!(snapshot.restore(), Err(SimError::InvalidSnapshot(_))));
    }

    #[test]
    fn test_short_tile_grid_fails_to_parse() {
        let result = tampered(|v| {
            v["map"]["tiles"]["data"].as_array_mut().unwrap().truncate(3);
        });
        assert!(matches!(result, Err(SimError::SerdeError(_))));
    }

    #[test]
    fn test_version_mismatch() {
        let (map, manager) = populated();
        let mut snapshot = WorldSnapshot::capture(&map, &manager);
        snapshot.version = 99;
        assert!(matches!(snapshot.restore(), Err(SimError::InvalidSnapshot(_))));
    }
}
