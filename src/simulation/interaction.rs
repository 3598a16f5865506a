//! Cross-agent effects, resolved after every agent has moved
//!
//! Behavior execution never touches another agent directly. It queues an
//! [`Effect`], and the manager commits the queue once the sweep and reindex
//! are done, so each agent acts on the same snapshot.

use crate::core::config::SimulationConfig;
use crate::core::types::{AgentId, Tick, Vec2};
use crate::entity::arena::AgentArena;
use crate::entity::emotion::Emotion;
use crate::entity::memory::{Memory, MemoryKind};
use crate::entity::needs::NeedType;
use crate::entity::species::{AgentKind, Hostility};
use crate::simulation::brain::{Behavior, Candidate, Target, FLEE_PRIORITY};
use crate::simulation::events::{DeathCause, SimulationEvent};
use crate::spatial::sparse_hash::SparseHashGrid;

/// Lets a strike land on a target that stepped slightly out of range this tick
const RANGE_SLACK: f32 = 1.5;
/// Hunger restored per max-hp point of an animal a creature kills
const KILL_FOOD_FACTOR: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Damage {
        attacker: AgentId,
        victim: AgentId,
        amount: f32,
    },
    Befriend {
        from: AgentId,
        to: AgentId,
        amount: f32,
    },
    Birth {
        parent: AgentId,
        kind: AgentKind,
        position: Vec2,
    },
}

/// A birth waiting for the tick boundary
#[derive(Debug, Clone, PartialEq)]
pub struct PendingBirth {
    pub parent: AgentId,
    pub kind: AgentKind,
    pub position: Vec2,
}

/// Send passive and skittish animals near a predator running.
///
/// An animal is only alarmed by a predator it can perceive, so `radius` is
/// capped per animal by its own perception radius. Alarms are collected
/// against the settled index first, then applied. Returns how many animals
/// were alarmed.
pub fn predator_alarm(
    arena: &mut AgentArena,
    index: &SparseHashGrid,
    radius: f32,
    creature_radius: f32,
    events: &mut Vec<SimulationEvent>,
) -> usize {
    let mut alarms: Vec<(AgentId, AgentId)> = Vec::new();

    for predator in arena.iter().filter(|a| a.is_alive() && a.kind.is_predator()) {
        let mut nearby = index.query(predator.position, radius);
        nearby.sort();
        for id in nearby {
            let Some(other) = arena.get(id) else {
                continue;
            };
            let calm = matches!(
                other.kind.hostility(),
                Some(Hostility::Passive) | Some(Hostility::Skittish)
            );
            let in_sight = other.position.distance(&predator.position)
                <= other.perception_radius(creature_radius);
            if calm
                && in_sight
                && other.is_alive()
                && other.brain.behavior() != Behavior::Flee
                && !alarms.iter().any(|(prey, _)| *prey == id)
            {
                alarms.push((id, predator.id));
            }
        }
    }

    for (prey, predator) in &alarms {
        if let Some(agent) = arena.get_mut(*prey) {
            let previous = agent.brain.behavior();
            agent.brain.adopt(Candidate::new(
                Behavior::Flee,
                FLEE_PRIORITY,
                Target::Agent(*predator),
            ));
            if previous != Behavior::Flee {
                events.push(SimulationEvent::BehaviorChanged {
                    id: *prey,
                    from: previous,
                    to: Behavior::Flee,
                });
            }
        }
    }
    alarms.len()
}

/// Commit queued effects in order. Births are returned for the manager to
/// apply after the dead are removed.
pub fn apply_effects(
    arena: &mut AgentArena,
    effects: Vec<Effect>,
    config: &SimulationConfig,
    tick: Tick,
    events: &mut Vec<SimulationEvent>,
) -> Vec<PendingBirth> {
    let mut births = Vec::new();

    for effect in effects {
        match effect {
            Effect::Damage {
                attacker,
                victim,
                amount,
            } => {
                if let Some(damage) = resolve_strike(arena, attacker, victim, amount, config, tick) {
                    events.push(SimulationEvent::Attacked {
                        attacker,
                        victim,
                        damage,
                    });
                }
            }
            Effect::Befriend { from, to, amount } => {
                if !arena.get(from).map(|a| a.is_alive()).unwrap_or(false) {
                    continue;
                }
                if let Some(mind) = arena.get_mut(to).and_then(|a| a.mind.as_mut()) {
                    mind.relationships.adjust(from, amount);
                }
            }
            Effect::Birth {
                parent,
                kind,
                position,
            } => births.push(PendingBirth {
                parent,
                kind,
                position,
            }),
        }
    }

    births
}

/// Apply one strike; `None` if either side is gone or out of reach
fn resolve_strike(
    arena: &mut AgentArena,
    attacker: AgentId,
    victim: AgentId,
    amount: f32,
    config: &SimulationConfig,
    tick: Tick,
) -> Option<f32> {
    let (attacker_kind, attacker_pos, reach) = {
        let a = arena.get(attacker).filter(|a| a.is_alive())?;
        (a.kind, a.position, a.kind.stats().attack_range * RANGE_SLACK)
    };

    let target = arena.get_mut(victim).filter(|v| v.is_alive())?;
    if target.position.distance(&attacker_pos) > reach {
        return None;
    }

    target.take_damage(amount, DeathCause::Killed { by: attacker });
    let killed = !target.is_alive();
    let victim_kind = target.kind;
    let victim_max_hp = target.max_hp;

    if let Some(mind) = target.mind.as_mut() {
        mind.relationships
            .adjust(attacker, -config.attack_affinity_penalty);
        mind.memory.record(
            Memory::new(MemoryKind::Danger, attacker_pos, 1.0, tick).with_entity(attacker),
        );
        mind.emotion.set(Emotion::Angry, 0.6);
    }

    if killed {
        tracing::debug!("{} killed {} ({})", attacker, victim, victim_kind);
        if attacker_kind.is_creature() && victim_kind.is_animal() {
            if let Some(mind) = arena.get_mut(attacker).and_then(|a| a.mind.as_mut()) {
                mind.needs
                    .satisfy(NeedType::Hunger, victim_max_hp * KILL_FOOD_FACTOR);
            }
        }
    }

    Some(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::agent::Agent;
    use crate::entity::species::{AnimalKind, Race};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup(kinds: &[(AgentKind, Vec2)]) -> (AgentArena, SparseHashGrid, Vec<AgentId>) {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut arena = AgentArena::new();
        let mut index = SparseHashGrid::new(8.0);
        let mut ids = Vec::new();
        for (kind, pos) in kinds {
            let id = arena.insert_with(|id| Agent::new(id, *kind, *pos, 10, &mut rng));
            index.insert(id, *pos);
            ids.push(id);
        }
        (arena, index, ids)
    }

    #[test]
    fn test_predator_alarms_calm_animals_only() {
        let (mut arena, index, ids) = setup(&[
            (AgentKind::Animal(AnimalKind::Wolf), Vec2::new(0.0, 0.0)),
            (AgentKind::Animal(AnimalKind::Sheep), Vec2::new(3.0, 0.0)),
            (AgentKind::Animal(AnimalKind::Boar), Vec2::new(0.0, 3.0)),
            (AgentKind::Animal(AnimalKind::Deer), Vec2::new(30.0, 0.0)),
        ]);
        let mut events = Vec::new();
        let alarmed = predator_alarm(&mut arena, &index, 8.0, 12.0, &mut events);

        assert_eq!(alarmed, 1);
        let sheep = arena.get(ids[1]).unwrap();
        assert_eq!(sheep.brain.behavior(), Behavior::Flee);
        assert_eq!(sheep.brain.target(), Target::Agent(ids[0]));
        assert_ne!(arena.get(ids[2]).unwrap().brain.behavior(), Behavior::Flee);
        assert_ne!(arena.get(ids[3]).unwrap().brain.behavior(), Behavior::Flee);
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn test_alarm_skips_prey_that_cannot_see_the_predator() {
        // Inside the alarm radius but past a sheep's perception radius of 6
        let (mut arena, index, ids) = setup(&[
            (AgentKind::Animal(AnimalKind::Wolf), Vec2::new(20.5, 30.5)),
            (AgentKind::Animal(AnimalKind::Sheep), Vec2::new(27.5, 30.5)),
        ]);
        let mut events = Vec::new();
        let alarmed = predator_alarm(&mut arena, &index, 8.0, 12.0, &mut events);

        assert_eq!(alarmed, 0);
        assert_ne!(arena.get(ids[1]).unwrap().brain.behavior(), Behavior::Flee);
        assert!(events.is_empty());
    }

    #[test]
    fn test_strike_damages_and_sours_relationship() {
        let (mut arena, _, ids) = setup(&[
            (AgentKind::Creature(Race::Orc), Vec2::new(0.0, 0.0)),
            (AgentKind::Creature(Race::Human), Vec2::new(1.0, 0.0)),
        ]);
        let config = SimulationConfig::default();
        let mut events = Vec::new();
        let before = arena.get(ids[1]).unwrap().hp;

        apply_effects(
            &mut arena,
            vec![Effect::Damage {
                attacker: ids[0],
                victim: ids[1],
                amount: 10.0,
            }],
            &config,
            5,
            &mut events,
        );

        let human = arena.get(ids[1]).unwrap();
        assert_eq!(human.hp, before - 10.0);
        let mind = human.mind.as_ref().unwrap();
        assert_eq!(mind.relationships.get(ids[0]), -config.attack_affinity_penalty);
        assert!(mind.memory.has_kind(MemoryKind::Danger));
        assert_eq!(
            events,
            vec![SimulationEvent::Attacked {
                attacker: ids[0],
                victim: ids[1],
                damage: 10.0
            }]
        );
    }

    #[test]
    fn test_out_of_reach_strike_misses() {
        let (mut arena, _, ids) = setup(&[
            (AgentKind::Creature(Race::Orc), Vec2::new(0.0, 0.0)),
            (AgentKind::Creature(Race::Human), Vec2::new(10.0, 0.0)),
        ]);
        let mut events = Vec::new();
        apply_effects(
            &mut arena,
            vec![Effect::Damage {
                attacker: ids[0],
                victim: ids[1],
                amount: 10.0,
            }],
            &SimulationConfig::default(),
            0,
            &mut events,
        );
        assert!(events.is_empty());
        assert_eq!(arena.get(ids[1]).unwrap().hp, arena.get(ids[1]).unwrap().max_hp);
    }

    #[test]
    fn test_creature_kill_feeds_killer() {
        let (mut arena, _, ids) = setup(&[
            (AgentKind::Creature(Race::Human), Vec2::new(0.0, 0.0)),
            (AgentKind::Animal(AnimalKind::Rabbit), Vec2::new(1.0, 0.0)),
        ]);
        arena.get_mut(ids[0]).unwrap().mind.as_mut().unwrap().needs.hunger = 10.0;
        let mut events = Vec::new();
        apply_effects(
            &mut arena,
            vec![Effect::Damage {
                attacker: ids[0],
                victim: ids[1],
                amount: 50.0,
            }],
            &SimulationConfig::default(),
            0,
            &mut events,
        );

        let rabbit = arena.get(ids[1]).unwrap();
        assert!(!rabbit.is_alive());
        assert_eq!(rabbit.last_harm, Some(DeathCause::Killed { by: ids[0] }));
        let hunger = arena.get(ids[0]).unwrap().needs().unwrap().hunger;
        assert!((hunger - 17.5).abs() < 1e-4);
    }

    #[test]
    fn test_births_are_deferred() {
        let (mut arena, _, ids) = setup(&[(AgentKind::Animal(AnimalKind::Sheep), Vec2::ZERO)]);
        let births = apply_effects(
            &mut arena,
            vec![Effect::Birth {
                parent: ids[0],
                kind: AgentKind::Animal(AnimalKind::Sheep),
                position: Vec2::ZERO,
            }],
            &SimulationConfig::default(),
            0,
            &mut Vec::new(),
        );
        assert_eq!(births.len(), 1);
        assert_eq!(arena.len(), 1);
    }
}
