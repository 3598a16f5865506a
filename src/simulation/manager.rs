//! Entity manager: sole owner of the agents and their spatial index
//!
//! Every mutation path (spawn, tick, removal, command, restore) goes through
//! this type, so the arena and the index cannot drift apart.
//!
//! Tick order:
//! 1. Clamp `dt`, advance the tick counter
//! 2. Perception for every agent against the settled index (parallel above threshold)
//! 3. Sequential sweep in slot order: step the agent, then reindex it
//! 4. Predator alarm over the settled index
//! 5. Commit queued effects (damage, affinity, birth requests)
//! 6. Remove the dead from arena and index together
//! 7. Apply births under the population cap
//! 8. Regrow renewable resources

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::{Result, SimError};
use crate::core::types::{AgentId, Tick, Vec2};
use crate::entity::agent::Agent;
use crate::entity::arena::{AgentArena, ArenaLayout};
use crate::entity::species::AgentKind;
use crate::simulation::brain::{Behavior, Candidate, Target, COMMAND_DURATION, COMMAND_PRIORITY};
use crate::simulation::events::{DeathCause, SimulationEvent};
use crate::simulation::execute::{step_agent, StepContext};
use crate::simulation::interaction::{apply_effects, predator_alarm};
use crate::simulation::perception::{perceive, Perception};
use crate::spatial::sparse_hash::SparseHashGrid;
use crate::world::map::WorldMap;

/// Ticks between population summaries at info level
const CENSUS_INTERVAL: Tick = 1000;

/// Discrete orders from outside the simulation, applied between ticks
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Command {
    MoveTo(Vec2),
    Build(Vec2),
    Work(Vec2),
    Follow(AgentId),
    Guard(Vec2),
}

/// Exact position of the manager's random stream
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RngState {
    pub seed: [u8; 32],
    pub stream: u64,
    /// Word position split into high and low halves
    pub word_pos: [u64; 2],
}

impl RngState {
    pub fn capture(rng: &ChaCha8Rng) -> Self {
        let pos = rng.get_word_pos();
        Self {
            seed: rng.get_seed(),
            stream: rng.get_stream(),
            word_pos: [(pos >> 64) as u64, pos as u64],
        }
    }

    pub fn resume(&self) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::from_seed(self.seed);
        rng.set_stream(self.stream);
        rng.set_word_pos(((self.word_pos[0] as u128) << 64) | self.word_pos[1] as u128);
        rng
    }
}

/// Everything needed to resume a manager exactly where it stopped
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManagerSnapshot {
    pub tick: Tick,
    pub elapsed: f64,
    pub rng: RngState,
    pub layout: ArenaLayout,
    pub agents: Vec<Agent>,
}

pub struct EntityManager {
    config: SimulationConfig,
    arena: AgentArena,
    index: SparseHashGrid,
    rng: ChaCha8Rng,
    tick: Tick,
    elapsed: f64,
    /// Events raised between ticks, handed out by the next `update`
    pending: Vec<SimulationEvent>,
}

impl EntityManager {
    pub fn new(config: SimulationConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let index = SparseHashGrid::new(config.grid_cell_size);
        Ok(Self {
            arena: AgentArena::with_capacity(config.population_cap.min(4096)),
            index,
            rng: ChaCha8Rng::seed_from_u64(seed),
            tick: 0,
            elapsed: 0.0,
            pending: Vec::new(),
            config,
        })
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tick(&self) -> Tick {
        self.tick
    }

    /// Simulated seconds so far
    pub fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.arena.iter()
    }

    pub fn ids(&self) -> Vec<AgentId> {
        self.arena.ids()
    }

    /// Read-only view of the spatial index
    pub fn index(&self) -> &SparseHashGrid {
        &self.index
    }

    /// Place a new agent; `None` if the tile is not walkable or the cap is reached
    pub fn spawn(&mut self, kind: AgentKind, x: f32, y: f32, map: &WorldMap) -> Option<AgentId> {
        let position = Vec2::new(x, y);
        let id = self.insert_agent(kind, position, map)?;
        self.pending.push(SimulationEvent::Spawned { id, kind, position });
        Some(id)
    }

    fn insert_agent(&mut self, kind: AgentKind, position: Vec2, map: &WorldMap) -> Option<AgentId> {
        if self.arena.len() >= self.config.population_cap || !map.is_walkable_at(position) {
            return None;
        }
        let memory_capacity = self.config.memory_capacity;
        let rng = &mut self.rng;
        let id = self
            .arena
            .insert_with(|id| Agent::new(id, kind, position, memory_capacity, rng));
        self.index.insert(id, position);
        tracing::debug!("Spawned {} {} at ({:.1}, {:.1})", kind, id, position.x, position.y);
        Some(id)
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        self.arena.get(id)
    }

    /// Like `get`, but a missing agent is an error
    pub fn agent_checked(&self, id: AgentId) -> Result<&Agent> {
        self.arena.get(id).ok_or(SimError::AgentNotFound(id))
    }

    /// Agents within `radius` of `(x, y)`, nearest first (ties by id)
    pub fn find_nearby(&self, x: f32, y: f32, radius: f32) -> Vec<&Agent> {
        self.find_nearby_where(x, y, radius, |_| true)
    }

    pub fn find_nearby_where(
        &self,
        x: f32,
        y: f32,
        radius: f32,
        filter: impl Fn(&Agent) -> bool,
    ) -> Vec<&Agent> {
        let center = Vec2::new(x, y);
        let mut found: Vec<(f32, &Agent)> = self
            .index
            .query(center, radius)
            .into_iter()
            .filter_map(|id| self.arena.get(id))
            .filter(|a| filter(*a))
            .map(|a| (a.position.distance_sq(&center), a))
            .collect();
        found.sort_by(|(da, a), (db, b)| da.total_cmp(db).then(a.id.cmp(&b.id)));
        found.into_iter().map(|(_, a)| a).collect()
    }

    /// Remove every agent within `radius` of `(x, y)` immediately
    pub fn kill_at(&mut self, x: f32, y: f32, radius: f32) -> Vec<AgentId> {
        let mut victims = self.index.query(Vec2::new(x, y), radius);
        victims.sort();
        for id in &victims {
            if let Some(agent) = self.remove_agent(*id) {
                self.pending.push(SimulationEvent::Died {
                    id: *id,
                    kind: agent.kind,
                    cause: DeathCause::Smitten,
                });
            }
        }
        victims
    }

    /// Live agents, optionally only of one kind
    pub fn count(&self, kind: Option<AgentKind>) -> usize {
        match kind {
            Some(kind) => self.arena.iter().filter(|a| a.kind == kind).count(),
            None => self.arena.len(),
        }
    }

    /// Override an agent's behavior until the order completes or times out
    pub fn command(&mut self, id: AgentId, command: Command) -> Result<()> {
        let (behavior, target) = match command {
            Command::MoveTo(point) => (Behavior::Wander, Target::Point(point)),
            Command::Build(point) => (Behavior::Build, Target::Point(point)),
            Command::Work(point) => (Behavior::Work, Target::Point(point)),
            Command::Guard(point) => (Behavior::Guard, Target::Point(point)),
            Command::Follow(leader) => {
                if leader == id {
                    return Err(SimError::InvalidCommand(format!("{} cannot follow itself", id)));
                }
                if !self.arena.contains(leader) {
                    return Err(SimError::AgentNotFound(leader));
                }
                (Behavior::Follow, Target::Agent(leader))
            }
        };

        let agent = self.arena.get_mut(id).ok_or(SimError::AgentNotFound(id))?;
        if matches!(behavior, Behavior::Build | Behavior::Work) && !agent.is_creature() {
            return Err(SimError::InvalidCommand(format!(
                "{} {} cannot {:?}",
                agent.kind, id, behavior
            )));
        }

        let previous = agent.brain.behavior();
        agent.brain.adopt_for(
            Candidate::new(behavior, COMMAND_PRIORITY, target),
            COMMAND_DURATION,
        );
        tracing::debug!("{} commanded: {:?}", id, command);
        if previous != behavior {
            self.pending.push(SimulationEvent::BehaviorChanged {
                id,
                from: previous,
                to: behavior,
            });
        }
        Ok(())
    }

    /// Advance the simulation by `dt` seconds (capped at `max_delta_seconds`)
    pub fn update(&mut self, dt: f32, map: &mut WorldMap) -> Vec<SimulationEvent> {
        let mut events = std::mem::take(&mut self.pending);
        if !(dt > 0.0) {
            return events;
        }
        let dt = dt.min(self.config.max_delta_seconds);
        self.tick += 1;
        self.elapsed += dt as f64;

        let ids = self.arena.ids();
        let perceptions = self.perceive_all(&ids);

        let mut effects = Vec::new();
        for (id, perception) in ids.iter().zip(&perceptions) {
            let Some(agent) = self.arena.get_mut(*id) else {
                continue;
            };
            let ctx = StepContext {
                config: &self.config,
                perception,
                tick: self.tick,
                dt,
            };
            step_agent(agent, map, &ctx, &mut self.rng, &mut effects, &mut events);
            let position = agent.position;
            self.index.update(*id, position);
        }

        let alarmed = predator_alarm(
            &mut self.arena,
            &self.index,
            self.config.predator_alarm_radius,
            self.config.perception_radius,
            &mut events,
        );
        let births = apply_effects(&mut self.arena, effects, &self.config, self.tick, &mut events);

        let deaths = self.remove_dead(&mut events);

        let mut born = 0;
        for birth in births {
            let Some(child) = self.insert_agent(birth.kind, birth.position, map) else {
                continue;
            };
            born += 1;
            events.push(SimulationEvent::Born {
                parent: birth.parent,
                child,
                kind: birth.kind,
            });
        }

        map.regenerate_resources(dt, self.config.resource_regen_rate);

        tracing::trace!(
            "Tick {}: {} agents, {} born, {} died, {} alarmed, {} events",
            self.tick,
            self.arena.len(),
            born,
            deaths,
            alarmed,
            events.len()
        );
        if self.tick % CENSUS_INTERVAL == 0 {
            tracing::info!(
                "Tick {} ({:.0}s): population {}",
                self.tick,
                self.elapsed,
                self.arena.len()
            );
        }
        events
    }

    /// Perception for each id against the index as it stood before the sweep
    fn perceive_all(&self, ids: &[AgentId]) -> Vec<Perception> {
        let arena = &self.arena;
        let index = &self.index;
        let radius = self.config.perception_radius;
        let threshold = self.config.enemy_affinity_threshold;
        let look = |id: &AgentId| {
            arena
                .get(*id)
                .map(|agent| perceive(agent, arena, index, radius, threshold))
                .unwrap_or_default()
        };

        if ids.len() >= self.config.parallel_threshold {
            ids.par_iter().map(look).collect()
        } else {
            ids.iter().map(look).collect()
        }
    }

    fn remove_dead(&mut self, events: &mut Vec<SimulationEvent>) -> usize {
        let dead: Vec<AgentId> = self
            .arena
            .iter()
            .filter(|a| !a.is_alive())
            .map(|a| a.id)
            .collect();

        for id in &dead {
            let Some(agent) = self.remove_agent(*id) else {
                continue;
            };
            let cause = agent.last_harm.unwrap_or(DeathCause::Starvation);
            tracing::debug!("{} {} died: {:?}", agent.kind, id, cause);
            events.push(SimulationEvent::Died {
                id: *id,
                kind: agent.kind,
                cause,
            });
        }
        dead.len()
    }

    /// Remove from arena and index in one step
    fn remove_agent(&mut self, id: AgentId) -> Option<Agent> {
        let agent = self.arena.remove(id)?;
        self.index.remove(id);
        Some(agent)
    }

    pub fn snapshot(&self) -> ManagerSnapshot {
        ManagerSnapshot {
            tick: self.tick,
            elapsed: self.elapsed,
            rng: RngState::capture(&self.rng),
            layout: self.arena.layout(),
            agents: self.arena.iter().cloned().collect(),
        }
    }

    /// Rebuild a manager from a snapshot; handles and the random stream resume unchanged
    pub fn restore(config: SimulationConfig, snapshot: ManagerSnapshot) -> Result<Self> {
        config.validate()?;
        let arena = AgentArena::from_parts(snapshot.layout, snapshot.agents).ok_or_else(|| {
            SimError::InvalidSnapshot("agent handles do not match the arena layout".into())
        })?;
        if arena.len() > config.population_cap {
            return Err(SimError::InvalidSnapshot(format!(
                "{} agents exceed the population cap of {}",
                arena.len(),
                config.population_cap
            )));
        }

        let mut index = SparseHashGrid::new(config.grid_cell_size);
        index.rebuild(arena.iter().map(|a| (a.id, a.position)));
        tracing::info!(
            "Restored {} agents at tick {}",
            arena.len(),
            snapshot.tick
        );

        Ok(Self {
            config,
            arena,
            index,
            rng: snapshot.rng.resume(),
            tick: snapshot.tick,
            elapsed: snapshot.elapsed,
            pending: Vec::new(),
        })
    }
}
