//! Perception: what each agent notices this tick
//!
//! Built from the spatial index before anyone moves, so every agent decides
//! against the same neighbor snapshot.

use ordered_float::OrderedFloat;

use crate::core::types::{AgentId, Vec2};
use crate::entity::agent::Agent;
use crate::entity::arena::AgentArena;
use crate::entity::species::{AgentKind, Hostility};
use crate::spatial::sparse_hash::SparseHashGrid;

/// Aggressive animals only count as (or react to) threats this close
pub const AGGRESSION_RADIUS: f32 = 4.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Perceived {
    pub id: AgentId,
    pub kind: AgentKind,
    pub position: Vec2,
    pub distance: f32,
    pub hp: f32,
    /// Something to flee from or fight
    pub threat: bool,
    /// Something the observer hunts
    pub prey: bool,
    /// Same race (creatures) or same kind (animals), and not a threat
    pub kin: bool,
}

/// Neighbors sorted by distance, then id
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Perception {
    pub neighbors: Vec<Perceived>,
}

impl Perception {
    pub fn from_neighbors(mut neighbors: Vec<Perceived>) -> Self {
        neighbors.sort_by_key(|p| (OrderedFloat(p.distance), p.id));
        Self { neighbors }
    }

    pub fn get(&self, id: AgentId) -> Option<&Perceived> {
        self.neighbors.iter().find(|p| p.id == id)
    }

    pub fn has_threat(&self) -> bool {
        self.neighbors.iter().any(|p| p.threat)
    }

    pub fn nearest_threat(&self) -> Option<&Perceived> {
        self.neighbors.iter().find(|p| p.threat)
    }

    pub fn nearest_prey(&self) -> Option<&Perceived> {
        self.neighbors.iter().find(|p| p.prey)
    }

    pub fn nearest_kin(&self) -> Option<&Perceived> {
        self.neighbors.iter().find(|p| p.kin)
    }

    pub fn threat_count(&self) -> usize {
        self.neighbors.iter().filter(|p| p.threat).count()
    }
}

/// Whether `observer` should treat `other` as a threat
pub fn is_threat(observer: &Agent, other: &Agent, distance: f32, enemy_threshold: f32) -> bool {
    if other.kind.hunts(observer.kind) {
        return true;
    }
    let aggressive_nearby =
        |a: &Agent| a.kind.hostility() == Some(Hostility::Aggressive) && distance <= AGGRESSION_RADIUS;

    match (observer.kind, other.kind) {
        (AgentKind::Creature(mine), AgentKind::Creature(theirs)) => {
            mine.is_rival(theirs)
                || observer
                    .mind
                    .as_ref()
                    .map(|m| m.relationships.is_enemy(other.id, enemy_threshold))
                    .unwrap_or(false)
        }
        (AgentKind::Creature(_), AgentKind::Animal(_)) => aggressive_nearby(other),
        (AgentKind::Animal(_), _) => match observer.kind.hostility() {
            Some(Hostility::Skittish) => other.is_creature(),
            Some(Hostility::Aggressive) => other.is_creature() && distance <= AGGRESSION_RADIUS,
            _ => false,
        },
    }
}

/// Snapshot of everything `observer` notices within its perception radius
pub fn perceive(
    observer: &Agent,
    arena: &AgentArena,
    index: &SparseHashGrid,
    creature_radius: f32,
    enemy_threshold: f32,
) -> Perception {
    let radius = observer.perception_radius(creature_radius);
    let neighbors = index
        .query(observer.position, radius)
        .into_iter()
        .filter(|id| *id != observer.id)
        .filter_map(|id| arena.get(id))
        .filter(|other| other.is_alive())
        .map(|other| {
            let distance = observer.position.distance(&other.position);
            let threat = is_threat(observer, other, distance, enemy_threshold);
            Perceived {
                id: other.id,
                kind: other.kind,
                position: other.position,
                distance,
                hp: other.hp,
                threat,
                prey: observer.kind.hunts(other.kind),
                kin: !threat && is_kin(observer.kind, other.kind),
            }
        })
        .collect();
    Perception::from_neighbors(neighbors)
}

fn is_kin(a: AgentKind, b: AgentKind) -> bool {
    a == b
}
