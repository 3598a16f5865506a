//! Utility-based decision engine
//!
//! `think` gathers every applicable (behavior, priority, target) candidate in a
//! fixed order and picks the highest priority, with ties going to whichever
//! candidate was declared first. Execution of the chosen behavior lives in
//! `execute`; `Brain` only tracks what was chosen and when to choose again.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::types::{AgentId, Vec2};
use crate::entity::emotion::Emotion;
use crate::entity::memory::{MemoryBank, MemoryKind};
use crate::entity::needs::{NeedType, Needs, CRITICAL_THRESHOLD};
use crate::entity::personality::Personality;
use crate::entity::species::{AgentKind, Hostility};
use crate::simulation::perception::Perception;

pub const FLEE_PRIORITY: f32 = 95.0;
pub const ATTACK_PRIORITY: f32 = 92.0;
/// Critical-need priority is `NEED_BASELINE - value`
pub const NEED_BASELINE: f32 = 80.0;
/// Needs below this produce a critical-need candidate
pub const NEED_TRIGGER: f32 = 30.0;
pub const COMMAND_PRIORITY: f32 = 50.0;
/// Seconds a commanded behavior holds before the brain re-evaluates
pub const COMMAND_DURATION: f32 = 60.0;

const TRAIT_GATE: f32 = 0.6;
const WANDER_CHANCE: f32 = 0.7;
const HUNT_CHANCE: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Behavior {
    Idle,
    Wander,
    SeekFood,
    SeekWater,
    Rest,
    Socialize,
    Flee,
    Attack,
    Work,
    Build,
    Gather,
    Explore,
    Follow,
    Guard,
}

impl Behavior {
    /// Seconds before the behavior times out and the brain thinks again
    pub fn duration(&self) -> f32 {
        match self {
            Behavior::Idle => 2.0,
            Behavior::Wander => 5.0,
            Behavior::SeekFood | Behavior::SeekWater => 12.0,
            Behavior::Rest => 8.0,
            Behavior::Socialize => 6.0,
            Behavior::Flee => 4.0,
            Behavior::Attack => 6.0,
            Behavior::Work => 15.0,
            Behavior::Build => 10.0,
            Behavior::Gather => 10.0,
            Behavior::Explore => 15.0,
            Behavior::Follow | Behavior::Guard => 20.0,
        }
    }

    /// Whether doing this restores `need`
    pub fn addresses(&self, need: NeedType) -> bool {
        matches!(
            (self, need),
            (Behavior::SeekFood, NeedType::Hunger)
                | (Behavior::SeekWater, NeedType::Thirst)
                | (Behavior::Rest, NeedType::Energy)
                | (Behavior::Rest, NeedType::Comfort)
                | (Behavior::Idle, NeedType::Comfort)
                | (Behavior::Socialize, NeedType::Social)
                | (Behavior::Flee, NeedType::Safety)
        )
    }

    pub fn is_threat_response(&self) -> bool {
        matches!(self, Behavior::Flee | Behavior::Attack)
    }

    /// Emotion set when the behavior is adopted
    pub fn emotion(&self) -> Option<(Emotion, f32)> {
        match self {
            Behavior::Flee => Some((Emotion::Scared, 0.8)),
            Behavior::Attack => Some((Emotion::Angry, 0.7)),
            Behavior::Explore => Some((Emotion::Excited, 0.4)),
            Behavior::Socialize => Some((Emotion::Happy, 0.4)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub enum Target {
    #[default]
    None,
    Point(Vec2),
    Agent(AgentId),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub behavior: Behavior,
    pub priority: f32,
    pub target: Target,
}

impl Candidate {
    pub fn new(behavior: Behavior, priority: f32, target: Target) -> Self {
        Self {
            behavior,
            priority,
            target,
        }
    }
}

/// Highest priority wins; equal priorities keep the earlier candidate
pub fn select(candidates: &[Candidate]) -> Option<Candidate> {
    let mut best: Option<&Candidate> = None;
    for candidate in candidates {
        if best.map_or(true, |b| candidate.priority > b.priority) {
            best = Some(candidate);
        }
    }
    best.copied()
}

/// Everything a creature's decision reads
pub struct ThinkContext<'a> {
    pub position: Vec2,
    pub needs: &'a Needs,
    pub personality: &'a Personality,
    pub memory: &'a MemoryBank,
    pub perception: &'a Perception,
    pub wander_radius: f32,
    pub explore_radius: f32,
}

/// Every candidate a creature considers this think, in evaluation order
pub fn creature_candidates(ctx: &ThinkContext, rng: &mut impl Rng) -> Vec<Candidate> {
    let mut candidates = Vec::with_capacity(8);
    let needs = ctx.needs;
    let traits = ctx.personality;

    // 1. Threat response: fight or flight against the nearest threat
    if let Some(threat) = ctx.perception.nearest_threat() {
        let target = Target::Agent(threat.id);
        if rng.gen::<f32>() < traits.flee_probability() {
            candidates.push(Candidate::new(Behavior::Flee, FLEE_PRIORITY, target));
        } else {
            candidates.push(Candidate::new(Behavior::Attack, ATTACK_PRIORITY, target));
        }
    }

    // 2. Critical needs; lower value means higher priority
    let remembered = |kind: MemoryKind| {
        ctx.memory
            .recall_nearest(kind, ctx.position)
            .map(|m| Target::Point(m.position))
            .unwrap_or_default()
    };
    if needs.hunger < NEED_TRIGGER {
        candidates.push(Candidate::new(
            Behavior::SeekFood,
            NEED_BASELINE - needs.hunger,
            remembered(MemoryKind::FoodSource),
        ));
    }
    if needs.thirst < NEED_TRIGGER {
        candidates.push(Candidate::new(
            Behavior::SeekWater,
            NEED_BASELINE - needs.thirst,
            remembered(MemoryKind::WaterSource),
        ));
    }
    if needs.energy < NEED_TRIGGER {
        candidates.push(Candidate::new(
            Behavior::Rest,
            NEED_BASELINE - needs.energy,
            Target::None,
        ));
    }
    let companion = ctx
        .perception
        .nearest_kin()
        .map(|p| Target::Agent(p.id))
        .unwrap_or_default();
    if needs.social < NEED_TRIGGER && traits.extraversion() > 0.4 {
        candidates.push(Candidate::new(
            Behavior::Socialize,
            NEED_BASELINE - needs.social,
            companion,
        ));
    }

    // 3. Personality-driven discretionary behaviors
    if traits.openness() > TRAIT_GATE && rng.gen::<f32>() < traits.openness() * 0.5 {
        let destination = random_point(ctx.position, ctx.explore_radius, rng);
        candidates.push(Candidate::new(
            Behavior::Explore,
            discretionary_priority(traits.openness()),
            Target::Point(destination),
        ));
    }
    if traits.conscientiousness() > TRAIT_GATE
        && rng.gen::<f32>() < traits.conscientiousness() * 0.4
    {
        candidates.push(Candidate::new(
            Behavior::Gather,
            discretionary_priority(traits.conscientiousness()),
            Target::None,
        ));
    }
    if traits.extraversion() > TRAIT_GATE
        && needs.social < 70.0
        && rng.gen::<f32>() < traits.extraversion() * 0.5
    {
        candidates.push(Candidate::new(
            Behavior::Socialize,
            discretionary_priority(traits.extraversion()),
            companion,
        ));
    }

    // 4. Defaults; idle guarantees a non-empty list
    if rng.gen::<f32>() < WANDER_CHANCE {
        let destination = random_point(ctx.position, ctx.wander_radius, rng);
        candidates.push(Candidate::new(
            Behavior::Wander,
            2.0 + traits.openness() * 3.0,
            Target::Point(destination),
        ));
    }
    candidates.push(Candidate::new(Behavior::Idle, 1.0, Target::None));

    candidates
}

/// Pick a behavior for a creature
pub fn think(ctx: &ThinkContext, rng: &mut impl Rng) -> Candidate {
    let candidates = creature_candidates(ctx, rng);
    select(&candidates).unwrap_or(Candidate::new(Behavior::Idle, 1.0, Target::None))
}

/// Pick a behavior for an animal from its hostility profile
pub fn think_animal(
    kind: AgentKind,
    position: Vec2,
    perception: &Perception,
    wander_radius: f32,
    rng: &mut impl Rng,
) -> Candidate {
    let mut candidates = Vec::with_capacity(4);

    match kind.hostility() {
        Some(Hostility::Predator) => {
            if let Some(threat) = perception.nearest_threat() {
                candidates.push(Candidate::new(
                    Behavior::Flee,
                    FLEE_PRIORITY,
                    Target::Agent(threat.id),
                ));
            }
            if let Some(prey) = perception.nearest_prey() {
                if rng.gen::<f32>() < HUNT_CHANCE {
                    candidates.push(Candidate::new(
                        Behavior::Attack,
                        70.0,
                        Target::Agent(prey.id),
                    ));
                }
            }
        }
        Some(Hostility::Aggressive) => {
            if let Some(threat) = perception.nearest_threat() {
                candidates.push(Candidate::new(
                    Behavior::Attack,
                    ATTACK_PRIORITY,
                    Target::Agent(threat.id),
                ));
            }
        }
        Some(Hostility::Passive) | Some(Hostility::Skittish) => {
            if let Some(threat) = perception.nearest_threat() {
                candidates.push(Candidate::new(
                    Behavior::Flee,
                    FLEE_PRIORITY,
                    Target::Agent(threat.id),
                ));
            }
        }
        None => {}
    }

    if rng.gen::<f32>() < WANDER_CHANCE {
        let destination = random_point(position, wander_radius, rng);
        candidates.push(Candidate::new(
            Behavior::Wander,
            3.0,
            Target::Point(destination),
        ));
    }
    candidates.push(Candidate::new(Behavior::Idle, 1.0, Target::None));

    select(&candidates).unwrap_or(Candidate::new(Behavior::Idle, 1.0, Target::None))
}

#[inline]
fn discretionary_priority(trait_value: f32) -> f32 {
    15.0 + trait_value * 20.0
}

/// Uniform direction, distance in `[radius / 2, radius]`
pub fn random_point(origin: Vec2, radius: f32, rng: &mut impl Rng) -> Vec2 {
    let radius = radius.max(0.0);
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    let distance = if radius > 0.0 {
        rng.gen_range(radius * 0.5..=radius)
    } else {
        0.0
    };
    origin + Vec2::new(angle.cos(), angle.sin()) * distance
}

/// Current behavior plus the bookkeeping that decides when to think again
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brain {
    behavior: Behavior,
    target: Target,
    priority: f32,
    elapsed: f32,
    duration: f32,
    /// Needs that were critical at the last check
    critical_mask: u8,
    rethink: bool,
}

impl Default for Brain {
    fn default() -> Self {
        Self {
            behavior: Behavior::Idle,
            target: Target::None,
            priority: 0.0,
            elapsed: 0.0,
            duration: 0.0,
            critical_mask: 0,
            rethink: true,
        }
    }
}

impl Brain {
    pub fn behavior(&self) -> Behavior {
        self.behavior
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn priority(&self) -> f32 {
        self.priority
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn duration(&self) -> f32 {
        self.duration
    }

    /// Switch to a freshly chosen candidate, restarting the timer
    pub fn adopt(&mut self, candidate: Candidate) {
        self.adopt_for(candidate, candidate.behavior.duration());
    }

    pub fn adopt_for(&mut self, candidate: Candidate, duration: f32) {
        self.behavior = candidate.behavior;
        self.target = candidate.target;
        self.priority = candidate.priority;
        self.elapsed = 0.0;
        self.duration = duration.max(0.0);
        self.rethink = false;
    }

    /// Keep the behavior but aim it somewhere else
    pub fn retarget(&mut self, target: Target) {
        self.target = target;
    }

    pub fn advance(&mut self, dt: f32) {
        self.elapsed += dt.max(0.0);
    }

    /// Timer, priority and point target are finite, and the timer is not negative
    pub fn is_consistent(&self) -> bool {
        let target_ok = match self.target {
            Target::Point(p) => p.is_finite(),
            _ => true,
        };
        target_ok
            && self.priority.is_finite()
            && self.elapsed.is_finite()
            && self.elapsed >= 0.0
            && self.duration.is_finite()
            && self.duration >= 0.0
    }

    /// Mark the behavior finished (or infeasible)
    pub fn finish(&mut self) {
        self.rethink = true;
    }

    /// Whether the agent must think before acting this tick.
    ///
    /// True when:
    /// 1. the behavior finished or its timer expired
    /// 2. a threat is present and the agent is not already fleeing or attacking
    /// 3. a need newly went critical and the current behavior does not address it
    pub fn needs_rethink(&mut self, threat_present: bool, needs: Option<&Needs>) -> bool {
        let mask = needs
            .map(|n| n.below_mask(CRITICAL_THRESHOLD))
            .unwrap_or(0);
        let newly_critical = mask & !self.critical_mask;
        self.critical_mask = mask;

        if self.rethink || self.elapsed >= self.duration {
            return true;
        }
        if threat_present && !self.behavior.is_threat_response() {
            return true;
        }
        NeedType::BY_IMPORTANCE
            .iter()
            .any(|n| newly_critical & n.mask() != 0 && !self.behavior.addresses(*n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::species::{AnimalKind, Race};
    use crate::simulation::perception::Perceived;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn threat_at(x: f32) -> Perceived {
        Perceived {
            id: AgentId::new(9, 0),
            kind: AgentKind::Creature(Race::Orc),
            position: Vec2::new(x, 0.0),
            distance: x.abs(),
            hp: 100.0,
            threat: true,
            prey: false,
            kin: false,
        }
    }

    fn ctx<'a>(
        needs: &'a Needs,
        personality: &'a Personality,
        memory: &'a MemoryBank,
        perception: &'a Perception,
    ) -> ThinkContext<'a> {
        ThinkContext {
            position: Vec2::ZERO,
            needs,
            personality,
            memory,
            perception,
            wander_radius: 6.0,
            explore_radius: 20.0,
        }
    }

    #[test]
    fn test_select_ties_go_to_first() {
        let candidates = [
            Candidate::new(Behavior::Rest, 50.0, Target::None),
            Candidate::new(Behavior::SeekFood, 50.0, Target::None),
            Candidate::new(Behavior::Idle, 1.0, Target::None),
        ];
        assert_eq!(select(&candidates).unwrap().behavior, Behavior::Rest);
        assert!(select(&[]).is_none());
    }

    #[test]
    fn test_hungry_agent_seeks_food() {
        let needs = Needs {
            hunger: 15.0,
            thirst: 80.0,
            energy: 80.0,
            social: 80.0,
            comfort: 80.0,
            safety: 80.0,
        };
        let personality = Personality::default();
        let memory = MemoryBank::new(10);
        let perception = Perception::default();
        let mut rng = ChaCha8Rng::seed_from_u64(42);

        let choice = think(&ctx(&needs, &personality, &memory, &perception), &mut rng);
        assert_eq!(choice.behavior, Behavior::SeekFood);
        assert!(choice.priority >= 65.0);
        assert_eq!(choice.target, Target::None);
    }

    #[test]
    fn test_remembered_food_becomes_target() {
        let mut needs = Needs::default();
        needs.hunger = 10.0;
        let personality = Personality::default();
        let mut memory = MemoryBank::new(10);
        memory.record(crate::entity::memory::Memory::new(
            MemoryKind::FoodSource,
            Vec2::new(4.0, 4.0),
            0.5,
            1,
        ));
        let perception = Perception::default();
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let choice = think(&ctx(&needs, &personality, &memory, &perception), &mut rng);
        assert_eq!(choice.target, Target::Point(Vec2::new(4.0, 4.0)));
    }

    #[test]
    fn test_threat_outranks_needs() {
        let mut needs = Needs::default();
        needs.thirst = 1.0;
        let personality = Personality::default();
        let memory = MemoryBank::new(10);
        let perception = Perception::from_neighbors(vec![threat_at(3.0)]);
        let mut rng = ChaCha8Rng::seed_from_u64(7);

        let choice = think(&ctx(&needs, &personality, &memory, &perception), &mut rng);
        assert!(choice.behavior.is_threat_response());
        assert_eq!(choice.target, Target::Agent(AgentId::new(9, 0)));
    }

    #[test]
    fn test_decision_is_deterministic() {
        let needs = Needs::default();
        let personality = Personality::new(0.9, 0.9, 0.9, 0.5, 0.5);
        let memory = MemoryBank::new(10);
        let perception = Perception::from_neighbors(vec![threat_at(5.0)]);

        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            think(&ctx(&needs, &personality, &memory, &perception), &mut rng)
        };
        for seed in 0..20 {
            assert_eq!(run(seed), run(seed));
        }
    }

    #[test]
    fn test_candidate_list_never_empty() {
        let needs = Needs::default();
        let personality = Personality::new(0.0, 0.0, 0.0, 0.0, 0.0);
        let memory = MemoryBank::new(10);
        let perception = Perception::default();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        for _ in 0..50 {
            let list = creature_candidates(&ctx(&needs, &personality, &memory, &perception), &mut rng);
            assert_eq!(list.last().unwrap().behavior, Behavior::Idle);
        }
    }

    #[test]
    fn test_discretionary_priorities_in_band() {
        let needs = Needs {
            social: 50.0,
            ..Needs::default()
        };
        let personality = Personality::new(1.0, 1.0, 1.0, 0.5, 0.5);
        let memory = MemoryBank::new(10);
        let perception = Perception::default();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        for _ in 0..100 {
            for c in creature_candidates(&ctx(&needs, &personality, &memory, &perception), &mut rng) {
                if matches!(c.behavior, Behavior::Explore | Behavior::Gather | Behavior::Socialize) {
                    assert!((15.0..=35.0).contains(&c.priority));
                }
            }
        }
    }

    #[test]
    fn test_prey_animal_flees_predator() {
        let wolf = Perceived {
            id: AgentId::new(2, 0),
            kind: AgentKind::Animal(AnimalKind::Wolf),
            position: Vec2::new(2.0, 0.0),
            distance: 2.0,
            hp: 55.0,
            threat: true,
            prey: false,
            kin: false,
        };
        let perception = Perception::from_neighbors(vec![wolf]);
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let choice = think_animal(
            AgentKind::Animal(AnimalKind::Sheep),
            Vec2::ZERO,
            &perception,
            6.0,
            &mut rng,
        );
        assert_eq!(choice.behavior, Behavior::Flee);
    }

    #[test]
    fn test_rethink_triggers() {
        let mut brain = Brain::default();
        assert!(brain.needs_rethink(false, None));

        brain.adopt(Candidate::new(Behavior::Wander, 3.0, Target::None));
        let mut needs = Needs::default();
        assert!(!brain.needs_rethink(false, Some(&needs)));

        // Threat while wandering
        assert!(brain.needs_rethink(true, Some(&needs)));

        // Newly critical thirst not addressed by wandering
        needs.thirst = 5.0;
        assert!(brain.needs_rethink(false, Some(&needs)));
        // Already seen as critical: no repeat trigger
        assert!(!brain.needs_rethink(false, Some(&needs)));

        // Timer expiry
        brain.advance(10.0);
        assert!(brain.needs_rethink(false, Some(&needs)));
    }

    #[test]
    fn test_critical_need_already_addressed_keeps_behavior() {
        let mut brain = Brain::default();
        brain.adopt(Candidate::new(Behavior::SeekWater, 70.0, Target::None));
        let mut needs = Needs::default();
        brain.needs_rethink(false, Some(&needs));
        needs.thirst = 5.0;
        assert!(!brain.needs_rethink(false, Some(&needs)));
    }
}
