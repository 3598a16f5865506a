//! Behavior execution: the per-agent half of a tick
//!
//! Needs and emotions advance, the brain re-thinks if something demands it, and
//! the current behavior is carried out. Anything that touches another agent is
//! queued as an [`Effect`] instead of applied.

use rand::Rng;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};

use crate::core::config::SimulationConfig;
use crate::core::types::{Tick, Vec2};
use crate::entity::agent::Agent;
use crate::entity::memory::{Memory, MemoryKind};
use crate::entity::needs::NeedType;
use crate::simulation::brain::{
    random_point, think, think_animal, Behavior, Candidate, Target, ThinkContext,
};
use crate::simulation::events::{DeathCause, SimulationEvent};
use crate::simulation::interaction::Effect;
use crate::simulation::perception::Perception;
use crate::world::map::WorldMap;
use crate::world::tile::TileType;

/// Straight ahead first, then progressively wider swerves
const DEFLECTIONS: [f32; 5] = [0.0, FRAC_PI_4, -FRAC_PI_4, FRAC_PI_2, -FRAC_PI_2];
/// A need counts as satisfied at this level
const SATED: f32 = 95.0;
const TALK_DISTANCE: f32 = 2.0;
const FOLLOW_DISTANCE: f32 = 2.5;
const GUARD_RADIUS: f32 = 3.0;
const FLEE_LOOKAHEAD: f32 = 5.0;
const CARRY_CAPACITY: f32 = 25.0;
const KIN_BREEDING_DISTANCE: f32 = 3.0;
/// Forgetting radius around a remembered source found empty
const STALE_SOURCE_RADIUS: f32 = 1.5;

/// Read-only inputs for one agent's step
pub struct StepContext<'a> {
    pub config: &'a SimulationConfig,
    pub perception: &'a Perception,
    pub tick: Tick,
    pub dt: f32,
}

/// Where a movement step left the agent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Arrived,
    Moving,
    Blocked,
}

/// Advance one agent by `ctx.dt`
pub fn step_agent(
    agent: &mut Agent,
    map: &mut WorldMap,
    ctx: &StepContext,
    rng: &mut impl Rng,
    effects: &mut Vec<Effect>,
    events: &mut Vec<SimulationEvent>,
) {
    let dt = ctx.dt;
    agent.age += dt;
    agent.attack_cooldown = (agent.attack_cooldown - dt).max(0.0);
    agent.reproduction_cooldown = (agent.reproduction_cooldown - dt).max(0.0);

    update_mind(agent, ctx);
    if !agent.is_alive() {
        agent.velocity = Vec2::ZERO;
        return;
    }

    let threat_present = ctx.perception.has_threat();
    if agent
        .brain
        .needs_rethink(threat_present, agent.mind.as_ref().map(|m| &m.needs))
    {
        let choice = decide(agent, ctx, rng);
        switch_behavior(agent, choice, events);
    }
    agent.brain.advance(dt);

    execute(agent, map, ctx, rng, effects, events);
}

/// Needs decay, safety response to threats, emotion decay and starvation
fn update_mind(agent: &mut Agent, ctx: &StepContext) {
    let config = ctx.config;
    let dt = ctx.dt;
    let Some(mind) = agent.mind.as_mut() else {
        return;
    };

    mind.needs
        .update(dt, &config.need_rates, config.need_decay_multiplier);
    if ctx.perception.has_threat() {
        mind.needs
            .deplete(NeedType::Safety, config.threat_safety_drain * dt);
    } else {
        mind.needs
            .satisfy(NeedType::Safety, config.safety_recovery_rate * dt);
    }
    mind.emotion.decay(dt, config.emotion_decay_rate);

    let starving = mind.needs.hunger <= 0.0;
    let parched = mind.needs.thirst <= 0.0;
    if starving {
        agent.take_damage(config.starvation_damage * dt, DeathCause::Starvation);
    }
    if parched {
        agent.take_damage(config.starvation_damage * dt, DeathCause::Dehydration);
    }
}

fn decide(agent: &Agent, ctx: &StepContext, rng: &mut impl Rng) -> Candidate {
    match agent.mind.as_ref() {
        Some(mind) => think(
            &ThinkContext {
                position: agent.position,
                needs: &mind.needs,
                personality: &mind.personality,
                memory: &mind.memory,
                perception: ctx.perception,
                wander_radius: ctx.config.wander_radius,
                explore_radius: ctx.config.explore_radius,
            },
            rng,
        ),
        None => think_animal(
            agent.kind,
            agent.position,
            ctx.perception,
            ctx.config.wander_radius,
            rng,
        ),
    }
}

/// Adopt `choice`, setting its emotion and reporting a change of behavior
pub fn switch_behavior(agent: &mut Agent, choice: Candidate, events: &mut Vec<SimulationEvent>) {
    let previous = agent.brain.behavior();
    agent.brain.adopt(choice);

    if let (Some(mind), Some((emotion, intensity))) =
        (agent.mind.as_mut(), choice.behavior.emotion())
    {
        mind.emotion.set(emotion, intensity);
    }

    if previous != choice.behavior {
        tracing::trace!("{} {:?} -> {:?}", agent.id, previous, choice.behavior);
        events.push(SimulationEvent::BehaviorChanged {
            id: agent.id,
            from: previous,
            to: choice.behavior,
        });
    }
}

fn execute(
    agent: &mut Agent,
    map: &mut WorldMap,
    ctx: &StepContext,
    rng: &mut impl Rng,
    effects: &mut Vec<Effect>,
    events: &mut Vec<SimulationEvent>,
) {
    match agent.brain.behavior() {
        Behavior::Idle => {
            agent.velocity = Vec2::ZERO;
            satisfy(agent, NeedType::Comfort, ctx.config.comfort_rate * ctx.dt);
            try_breed_animal(agent, ctx, rng, effects);
        }
        Behavior::Wander | Behavior::Explore => {
            match agent.brain.target() {
                Target::Point(goal) => {
                    if move_toward(agent, goal, 1.0, map, ctx) != Movement::Moving {
                        agent.brain.finish();
                    }
                }
                _ => agent.brain.finish(),
            }
            try_breed_animal(agent, ctx, rng, effects);
        }
        Behavior::SeekFood => seek_food(agent, map, ctx, rng, events),
        Behavior::SeekWater => seek_water(agent, map, ctx, rng, events),
        Behavior::Rest => {
            agent.velocity = Vec2::ZERO;
            satisfy(agent, NeedType::Energy, ctx.config.rest_rate * ctx.dt);
            satisfy(agent, NeedType::Comfort, ctx.config.comfort_rate * ctx.dt);
            if need(agent, NeedType::Energy) >= SATED {
                agent.brain.finish();
            }
        }
        Behavior::Socialize => socialize(agent, map, ctx, rng, effects, events),
        Behavior::Flee => flee(agent, map, ctx),
        Behavior::Attack => attack(agent, map, ctx, effects),
        Behavior::Gather => gather(agent, map, ctx, rng, events),
        Behavior::Work => work(agent, map, ctx, events),
        Behavior::Build => build(agent, map, ctx, events),
        Behavior::Follow => {
            let Target::Agent(leader) = agent.brain.target() else {
                halt(agent);
                return;
            };
            match ctx.perception.get(leader) {
                Some(p) if p.distance > FOLLOW_DISTANCE => {
                    let goal = p.position;
                    move_toward(agent, goal, 1.0, map, ctx);
                }
                Some(_) => agent.velocity = Vec2::ZERO,
                None => halt(agent),
            }
        }
        Behavior::Guard => {
            let Target::Point(post) = agent.brain.target() else {
                halt(agent);
                return;
            };
            if agent.position.distance(&post) > GUARD_RADIUS {
                move_toward(agent, post, 1.0, map, ctx);
            } else {
                agent.velocity = Vec2::ZERO;
            }
        }
    }
}

/// Step toward `goal`, swerving up to 90 degrees around unwalkable tiles
pub fn move_toward(
    agent: &mut Agent,
    goal: Vec2,
    speed_multiplier: f32,
    map: &WorldMap,
    ctx: &StepContext,
) -> Movement {
    let offset = goal - agent.position;
    let distance = offset.length();
    if distance <= ctx.config.arrival_distance {
        agent.velocity = Vec2::ZERO;
        return Movement::Arrived;
    }
    if ctx.dt <= 0.0 {
        return Movement::Moving;
    }

    let step = (agent.speed * agent.stat_penalty() * speed_multiplier * ctx.dt).min(distance);
    let heading = offset.normalize();
    for angle in DEFLECTIONS {
        let direction = heading.rotate(angle);
        let next = agent.position + direction * step;
        if map.is_walkable_at(next) {
            agent.velocity = direction * (step / ctx.dt);
            agent.position = next;
            return Movement::Moving;
        }
    }

    agent.velocity = Vec2::ZERO;
    Movement::Blocked
}

fn seek_food(
    agent: &mut Agent,
    map: &mut WorldMap,
    ctx: &StepContext,
    rng: &mut impl Rng,
    events: &mut Vec<SimulationEvent>,
) {
    if agent.mind.is_none() {
        agent.brain.finish();
        return;
    }

    let goal = match agent.brain.target() {
        Target::Point(p) if map.tile_at(p).map(|t| t.has_food()).unwrap_or(false) => p,
        target => {
            if let Target::Point(stale) = target {
                forget(agent, MemoryKind::FoodSource, stale);
            }
            let radius = agent.perception_radius(ctx.config.perception_radius);
            match map.find_food(agent.position, radius) {
                Some((x, y)) => {
                    let spot = Vec2::tile_center(x, y);
                    remember(agent, MemoryKind::FoodSource, spot, 0.6, ctx.tick);
                    agent.brain.retarget(Target::Point(spot));
                    spot
                }
                None => {
                    wander_instead(agent, ctx, rng, events);
                    return;
                }
            }
        }
    };

    match move_toward(agent, goal, 1.0, map, ctx) {
        Movement::Arrived => {
            let (x, y) = goal.tile();
            let resource = map.get_tile(x, y).and_then(|t| t.resource);
            let bite = ctx.config.harvest_rate * agent.stat_penalty() * ctx.dt;
            let taken = map.harvest_resource(x, y, bite);
            if let (Some(resource), true) = (resource, taken > 0.0) {
                satisfy(agent, NeedType::Hunger, taken * ctx.config.food_value);
                events.push(SimulationEvent::Harvested {
                    id: agent.id,
                    resource,
                    amount: taken,
                });
            }
            if need(agent, NeedType::Hunger) >= SATED {
                agent.brain.finish();
            }
        }
        Movement::Moving => {}
        Movement::Blocked => agent.brain.finish(),
    }
}

fn seek_water(
    agent: &mut Agent,
    map: &WorldMap,
    ctx: &StepContext,
    rng: &mut impl Rng,
    events: &mut Vec<SimulationEvent>,
) {
    if agent.mind.is_none() {
        agent.brain.finish();
        return;
    }

    if map.water_adjacent(agent.position) {
        agent.velocity = Vec2::ZERO;
        satisfy(agent, NeedType::Thirst, ctx.config.drink_rate * ctx.dt);
        let here = agent.position;
        remember(agent, MemoryKind::WaterSource, here, 0.6, ctx.tick);
        if need(agent, NeedType::Thirst) >= SATED {
            agent.brain.finish();
        }
        return;
    }

    let goal = match agent.brain.target() {
        Target::Point(p) if map.water_adjacent(p) => p,
        target => {
            if let Target::Point(stale) = target {
                forget(agent, MemoryKind::WaterSource, stale);
            }
            let radius = agent.perception_radius(ctx.config.perception_radius);
            match map.find_water(agent.position, radius) {
                Some((x, y)) => {
                    let spot = Vec2::tile_center(x, y);
                    agent.brain.retarget(Target::Point(spot));
                    spot
                }
                None => {
                    wander_instead(agent, ctx, rng, events);
                    return;
                }
            }
        }
    };

    if move_toward(agent, goal, 1.0, map, ctx) == Movement::Blocked {
        agent.brain.finish();
    }
}

fn socialize(
    agent: &mut Agent,
    map: &WorldMap,
    ctx: &StepContext,
    rng: &mut impl Rng,
    effects: &mut Vec<Effect>,
    events: &mut Vec<SimulationEvent>,
) {
    let companion = match agent.brain.target() {
        Target::Agent(id) => ctx.perception.get(id).filter(|p| p.kin),
        _ => None,
    }
    .or_else(|| ctx.perception.nearest_kin());

    let Some(companion) = companion else {
        wander_instead(agent, ctx, rng, events);
        return;
    };
    agent.brain.retarget(Target::Agent(companion.id));

    if companion.distance > TALK_DISTANCE {
        move_toward(agent, companion.position, 1.0, map, ctx);
        return;
    }

    agent.velocity = Vec2::ZERO;
    let gain = ctx.config.social_affinity_gain * ctx.dt;
    satisfy(agent, NeedType::Social, ctx.config.social_rate * ctx.dt);
    if let Some(mind) = agent.mind.as_mut() {
        mind.relationships.adjust(companion.id, gain);
    }
    effects.push(Effect::Befriend {
        from: agent.id,
        to: companion.id,
        amount: gain,
    });

    let well_fed = agent
        .mind
        .as_ref()
        .map(|m| m.needs.hunger > 50.0 && m.needs.thirst > 50.0)
        .unwrap_or(false);
    if well_fed
        && agent.reproduction_cooldown <= 0.0
        && rng.gen::<f32>() < ctx.config.reproduction_chance * ctx.dt
    {
        agent.reproduction_cooldown = ctx.config.reproduction_cooldown;
        effects.push(Effect::Birth {
            parent: agent.id,
            kind: agent.kind,
            position: agent.position,
        });
    }

    if need(agent, NeedType::Social) >= SATED {
        agent.brain.finish();
    }
}

fn flee(agent: &mut Agent, map: &WorldMap, ctx: &StepContext) {
    let Target::Agent(threat) = agent.brain.target() else {
        halt(agent);
        return;
    };
    let Some(seen) = ctx.perception.get(threat) else {
        // Out of sight: escaped
        halt(agent);
        return;
    };

    let threat_pos = seen.position;
    if let Some(mind) = agent.mind.as_mut() {
        mind.memory.record(
            Memory::new(MemoryKind::Danger, threat_pos, 0.8, ctx.tick).with_entity(threat),
        );
    }

    let mut away = (agent.position - threat_pos).normalize();
    if away == Vec2::ZERO {
        away = Vec2::new(1.0, 0.0);
    }
    let goal = agent.position + away * FLEE_LOOKAHEAD;
    move_toward(agent, goal, ctx.config.flee_speed_multiplier, map, ctx);
}

fn attack(agent: &mut Agent, map: &WorldMap, ctx: &StepContext, effects: &mut Vec<Effect>) {
    let Target::Agent(victim) = agent.brain.target() else {
        halt(agent);
        return;
    };
    let Some(seen) = ctx.perception.get(victim) else {
        halt(agent);
        return;
    };
    let stats = agent.kind.stats();
    if stats.attack_damage <= 0.0 {
        halt(agent);
        return;
    }

    if seen.distance > stats.attack_range {
        let goal = seen.position;
        move_toward(agent, goal, 1.0, map, ctx);
        return;
    }

    agent.velocity = Vec2::ZERO;
    if agent.attack_cooldown <= 0.0 {
        agent.attack_cooldown = ctx.config.attack_cooldown;
        effects.push(Effect::Damage {
            attacker: agent.id,
            victim,
            amount: stats.attack_damage * agent.stat_penalty(),
        });
    }
}

fn gather(
    agent: &mut Agent,
    map: &mut WorldMap,
    ctx: &StepContext,
    rng: &mut impl Rng,
    events: &mut Vec<SimulationEvent>,
) {
    let goal = match agent.brain.target() {
        Target::Point(p) if map.tile_at(p).map(|t| t.has_resource()).unwrap_or(false) => p,
        _ => {
            let radius = agent.perception_radius(ctx.config.perception_radius);
            match map.find_resource(agent.position, radius, |k| !k.is_food()) {
                Some((x, y)) => {
                    let spot = Vec2::tile_center(x, y);
                    agent.brain.retarget(Target::Point(spot));
                    spot
                }
                None => {
                    wander_instead(agent, ctx, rng, events);
                    return;
                }
            }
        }
    };

    match move_toward(agent, goal, 1.0, map, ctx) {
        Movement::Arrived => {
            let taken = harvest_into_pack(agent, map, goal, ctx, events);
            if taken <= 0.0 || agent.carried >= CARRY_CAPACITY {
                agent.brain.finish();
            }
        }
        Movement::Moving => {}
        Movement::Blocked => agent.brain.finish(),
    }
}

fn work(agent: &mut Agent, map: &mut WorldMap, ctx: &StepContext, events: &mut Vec<SimulationEvent>) {
    let Target::Point(site) = agent.brain.target() else {
        agent.brain.finish();
        return;
    };
    match move_toward(agent, site, 1.0, map, ctx) {
        Movement::Arrived => {
            harvest_into_pack(agent, map, site, ctx, events);
        }
        Movement::Moving => {}
        Movement::Blocked => agent.brain.finish(),
    }
}

fn build(agent: &mut Agent, map: &mut WorldMap, ctx: &StepContext, events: &mut Vec<SimulationEvent>) {
    let Target::Point(site) = agent.brain.target() else {
        agent.brain.finish();
        return;
    };
    match move_toward(agent, site, 1.0, map, ctx) {
        Movement::Arrived => {
            let (x, y) = site.tile();
            let buildable = map
                .get_tile(x, y)
                .map(|t| t.tile_type.is_walkable() && t.tile_type != TileType::Farmland)
                .unwrap_or(false);
            if buildable
                && map.set_tile(x, y, TileType::Farmland).is_ok()
                && map.claim_tile(x, y, agent.faction).is_ok()
            {
                events.push(SimulationEvent::Built { id: agent.id, x, y });
            }
            agent.brain.finish();
        }
        Movement::Moving => {}
        Movement::Blocked => agent.brain.finish(),
    }
}

/// Harvest the tile under `site` into the agent's pack; returns the amount taken
fn harvest_into_pack(
    agent: &mut Agent,
    map: &mut WorldMap,
    site: Vec2,
    ctx: &StepContext,
    events: &mut Vec<SimulationEvent>,
) -> f32 {
    let (x, y) = site.tile();
    let Some(resource) = map.get_tile(x, y).and_then(|t| t.resource) else {
        return 0.0;
    };
    let room = (CARRY_CAPACITY - agent.carried).max(0.0);
    let amount = (ctx.config.harvest_rate * agent.stat_penalty() * ctx.dt).min(room);
    let taken = map.harvest_resource(x, y, amount);
    if taken > 0.0 {
        agent.carried += taken;
        events.push(SimulationEvent::Harvested {
            id: agent.id,
            resource,
            amount: taken,
        });
    }
    taken
}

/// Healthy animals next to one of their own kind occasionally breed
fn try_breed_animal(agent: &mut Agent, ctx: &StepContext, rng: &mut impl Rng, effects: &mut Vec<Effect>) {
    if agent.mind.is_some()
        || agent.reproduction_cooldown > 0.0
        || agent.health_fraction() < 0.8
    {
        return;
    }
    let near_kin = ctx
        .perception
        .nearest_kin()
        .map(|p| p.distance <= KIN_BREEDING_DISTANCE)
        .unwrap_or(false);
    if near_kin && rng.gen::<f32>() < ctx.config.reproduction_chance * ctx.dt {
        agent.reproduction_cooldown = ctx.config.reproduction_cooldown;
        effects.push(Effect::Birth {
            parent: agent.id,
            kind: agent.kind,
            position: agent.position,
        });
    }
}

/// Nothing to go after: drift somewhere nearby and think again later
fn wander_instead(
    agent: &mut Agent,
    ctx: &StepContext,
    rng: &mut impl Rng,
    events: &mut Vec<SimulationEvent>,
) {
    let destination = random_point(agent.position, ctx.config.wander_radius, rng);
    switch_behavior(
        agent,
        Candidate::new(Behavior::Wander, 2.0, Target::Point(destination)),
        events,
    );
}

fn satisfy(agent: &mut Agent, need: NeedType, amount: f32) {
    if let Some(mind) = agent.mind.as_mut() {
        mind.needs.satisfy(need, amount);
    }
}

/// Give up the current behavior and stand still
fn halt(agent: &mut Agent) {
    agent.velocity = Vec2::ZERO;
    agent.brain.finish();
}

fn need(agent: &Agent, need: NeedType) -> f32 {
    agent.needs().map(|n| n.get(need)).unwrap_or(100.0)
}

fn remember(agent: &mut Agent, kind: MemoryKind, position: Vec2, intensity: f32, tick: Tick) {
    if let Some(mind) = agent.mind.as_mut() {
        mind.memory.record(Memory::new(kind, position, intensity, tick));
    }
}

fn forget(agent: &mut Agent, kind: MemoryKind, position: Vec2) {
    if let Some(mind) = agent.mind.as_mut() {
        mind.memory.forget_near(kind, position, STALE_SOURCE_RADIUS);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::AgentId;
    use crate::entity::species::{AgentKind, AnimalKind, Race};
    use crate::simulation::perception::Perceived;
    use crate::spatial::grid::Grid;
    use crate::world::tile::{Biome, ResourceKind, Tile};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn flat_map(size: usize) -> WorldMap {
        WorldMap::from_tiles(0, Grid::new(size, size))
    }

    fn human_at(pos: Vec2) -> Agent {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        Agent::new(
            AgentId::new(0, 0),
            AgentKind::Creature(Race::Human),
            pos,
            20,
            &mut rng,
        )
    }

    fn ctx<'a>(config: &'a SimulationConfig, perception: &'a Perception, dt: f32) -> StepContext<'a> {
        StepContext {
            config,
            perception,
            tick: 1,
            dt,
        }
    }

    #[test]
    fn test_move_toward_deflects_around_water() {
        let mut map = flat_map(10);
        // Wall of water directly east
        map.set_tile(5, 5, TileType::DeepWater).unwrap();
        let config = SimulationConfig::default();
        let perception = Perception::default();
        let mut agent = human_at(Vec2::new(4.5, 5.5));

        let moved = move_toward(&mut agent, Vec2::new(8.5, 5.5), 1.0, &map, &ctx(&config, &perception, 0.5));
        assert_eq!(moved, Movement::Moving);
        assert!(map.is_walkable_at(agent.position));
        assert_ne!(agent.position.y, 5.5);
    }

    #[test]
    fn test_move_toward_blocked_when_surrounded() {
        let mut map = flat_map(5);
        for (x, y) in [(1, 1), (2, 1), (3, 1), (1, 2), (3, 2), (1, 3), (2, 3), (3, 3)] {
            map.set_tile(x, y, TileType::DeepWater).unwrap();
        }
        let config = SimulationConfig::default();
        let perception = Perception::default();
        let mut agent = human_at(Vec2::new(2.5, 2.5));
        let moved = move_toward(&mut agent, Vec2::new(4.5, 2.5), 1.0, &map, &ctx(&config, &perception, 0.5));
        assert_eq!(moved, Movement::Blocked);
        assert_eq!(agent.position, Vec2::new(2.5, 2.5));
    }

    #[test]
    fn test_hungry_creature_eats_nearby_berries() {
        let mut cells = vec![Tile::default(); 100];
        cells[5 * 10 + 5] = Tile {
            resource: Some(ResourceKind::Berries),
            resource_amount: 20.0,
            biome: Biome::Grassland,
            ..Tile::default()
        };
        let mut map = WorldMap::from_tiles(0, Grid::from_cells(10, 10, cells).unwrap());
        let config = SimulationConfig::default();
        let perception = Perception::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agent = human_at(Vec2::new(5.2, 5.4));
        agent.mind.as_mut().unwrap().needs.hunger = 10.0;
        agent.brain.adopt(Candidate::new(Behavior::SeekFood, 70.0, Target::None));

        let mut effects = Vec::new();
        let mut events = Vec::new();
        execute(&mut agent, &mut map, &ctx(&config, &perception, 0.25), &mut rng, &mut effects, &mut events);

        let hunger = agent.needs().unwrap().hunger;
        assert!(hunger > 10.0);
        assert!(map.get_tile(5, 5).unwrap().resource_amount < 20.0);
        assert!(matches!(events[0], SimulationEvent::Harvested { .. }));
        assert!(agent
            .mind
            .as_ref()
            .unwrap()
            .memory
            .has_kind(MemoryKind::FoodSource));
    }

    #[test]
    fn test_no_food_falls_back_to_wander() {
        let mut map = flat_map(10);
        let config = SimulationConfig::default();
        let perception = Perception::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agent = human_at(Vec2::new(5.5, 5.5));
        agent.brain.adopt(Candidate::new(Behavior::SeekFood, 70.0, Target::None));

        let mut events = Vec::new();
        execute(&mut agent, &mut map, &ctx(&config, &perception, 0.25), &mut rng, &mut Vec::new(), &mut events);
        assert_eq!(agent.brain.behavior(), Behavior::Wander);
        assert!(matches!(agent.brain.target(), Target::Point(_)));
        assert_eq!(
            events,
            vec![SimulationEvent::BehaviorChanged {
                id: agent.id,
                from: Behavior::SeekFood,
                to: Behavior::Wander
            }]
        );
    }

    #[test]
    fn test_drinks_next_to_water() {
        let mut map = flat_map(6);
        map.set_tile(3, 2, TileType::ShallowWater).unwrap();
        let config = SimulationConfig::default();
        let perception = Perception::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agent = human_at(Vec2::new(2.5, 2.5));
        agent.mind.as_mut().unwrap().needs.thirst = 10.0;
        agent.brain.adopt(Candidate::new(Behavior::SeekWater, 70.0, Target::None));

        execute(&mut agent, &mut map, &ctx(&config, &perception, 1.0), &mut rng, &mut Vec::new(), &mut Vec::new());
        assert_eq!(agent.needs().unwrap().thirst, 35.0);
        assert!(agent
            .mind
            .as_ref()
            .unwrap()
            .memory
            .has_kind(MemoryKind::WaterSource));
    }

    #[test]
    fn test_attack_in_range_queues_damage_and_cools_down() {
        let mut map = flat_map(10);
        let config = SimulationConfig::default();
        let victim = AgentId::new(4, 0);
        let perception = Perception::from_neighbors(vec![Perceived {
            id: victim,
            kind: AgentKind::Creature(Race::Orc),
            position: Vec2::new(3.0, 2.5),
            distance: 0.5,
            hp: 100.0,
            threat: true,
            prey: false,
            kin: false,
        }]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agent = human_at(Vec2::new(2.5, 2.5));
        agent.brain.adopt(Candidate::new(Behavior::Attack, 92.0, Target::Agent(victim)));

        let mut effects = Vec::new();
        let step = ctx(&config, &perception, 0.1);
        execute(&mut agent, &mut map, &step, &mut rng, &mut effects, &mut Vec::new());
        execute(&mut agent, &mut map, &step, &mut rng, &mut effects, &mut Vec::new());
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::Damage { amount, .. } if amount == 10.0));
    }

    #[test]
    fn test_flee_moves_away_and_remembers_danger() {
        let mut map = flat_map(20);
        let config = SimulationConfig::default();
        let threat = AgentId::new(7, 0);
        let perception = Perception::from_neighbors(vec![Perceived {
            id: threat,
            kind: AgentKind::Animal(AnimalKind::Wolf),
            position: Vec2::new(8.0, 10.0),
            distance: 2.0,
            hp: 55.0,
            threat: true,
            prey: false,
            kin: false,
        }]);
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agent = human_at(Vec2::new(10.0, 10.0));
        agent.brain.adopt(Candidate::new(Behavior::Flee, 95.0, Target::Agent(threat)));

        execute(&mut agent, &mut map, &ctx(&config, &perception, 0.5), &mut rng, &mut Vec::new(), &mut Vec::new());
        assert!(agent.position.x > 10.0);
        let danger = agent
            .mind
            .as_ref()
            .unwrap()
            .memory
            .recall_nearest(MemoryKind::Danger, agent.position)
            .cloned()
            .unwrap();
        assert_eq!(danger.entity, Some(threat));
    }

    #[test]
    fn test_flee_from_unseen_threat_stops_moving() {
        let mut map = flat_map(20);
        let config = SimulationConfig::default();
        let perception = Perception::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agent = human_at(Vec2::new(10.0, 10.0));
        agent.velocity = Vec2::new(0.6, -1.3);
        agent
            .brain
            .adopt(Candidate::new(Behavior::Flee, 95.0, Target::Agent(AgentId::new(7, 0))));

        execute(&mut agent, &mut map, &ctx(&config, &perception, 0.5), &mut rng, &mut Vec::new(), &mut Vec::new());
        assert_eq!(agent.velocity, Vec2::ZERO);
        assert_eq!(agent.position, Vec2::new(10.0, 10.0));
        assert!(agent.brain.needs_rethink(false, None));
    }

    #[test]
    fn test_build_turns_tile_to_farmland() {
        let mut map = flat_map(10);
        let config = SimulationConfig::default();
        let perception = Perception::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agent = human_at(Vec2::new(4.5, 4.5));
        agent.brain.adopt(Candidate::new(Behavior::Build, 50.0, Target::Point(Vec2::new(4.5, 4.5))));

        let mut events = Vec::new();
        execute(&mut agent, &mut map, &ctx(&config, &perception, 0.1), &mut rng, &mut Vec::new(), &mut events);
        let tile = map.get_tile(4, 4).unwrap();
        assert_eq!(tile.tile_type, TileType::Farmland);
        assert_eq!(tile.owner, agent.faction);
        assert_eq!(events, vec![SimulationEvent::Built { id: agent.id, x: 4, y: 4 }]);
    }

    #[test]
    fn test_starvation_damages() {
        let mut map = flat_map(4);
        let config = SimulationConfig::default();
        let perception = Perception::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut agent = human_at(Vec2::new(1.5, 1.5));
        agent.mind.as_mut().unwrap().needs.hunger = 0.0;

        step_agent(
            &mut agent,
            &mut map,
            &ctx(&config, &perception, 1.0),
            &mut rng,
            &mut Vec::new(),
            &mut Vec::new(),
        );
        assert!(agent.hp < agent.max_hp);
        assert_eq!(agent.last_harm, Some(DeathCause::Starvation));
    }
}
