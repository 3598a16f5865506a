//! Closed species table: creature races, animal kinds and their base stats

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Race {
    Human,
    Elf,
    Dwarf,
    Orc,
    Goblin,
}

impl Race {
    pub const ALL: [Race; 5] = [Race::Human, Race::Elf, Race::Dwarf, Race::Orc, Race::Goblin];

    /// Orcs and goblins are hostile to humans, elves and dwarves, and vice versa
    pub fn is_rival(&self, other: Race) -> bool {
        let horde = |r: Race| matches!(r, Race::Orc | Race::Goblin);
        horde(*self) != horde(other)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnimalKind {
    Rabbit,
    Deer,
    Sheep,
    Boar,
    Fox,
    Wolf,
    Bear,
}

impl AnimalKind {
    pub const ALL: [AnimalKind; 7] = [
        AnimalKind::Rabbit,
        AnimalKind::Deer,
        AnimalKind::Sheep,
        AnimalKind::Boar,
        AnimalKind::Fox,
        AnimalKind::Wolf,
        AnimalKind::Bear,
    ];
}

/// How an animal reacts to others
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Hostility {
    /// Ignores creatures, flees predators
    Passive,
    /// Flees predators and creatures alike
    Skittish,
    /// Charges creatures that come close
    Aggressive,
    /// Hunts the kinds in its prey list
    Predator,
}

/// What an agent is
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AgentKind {
    Creature(Race),
    Animal(AnimalKind),
}

impl AgentKind {
    pub fn is_creature(&self) -> bool {
        matches!(self, AgentKind::Creature(_))
    }

    pub fn is_animal(&self) -> bool {
        matches!(self, AgentKind::Animal(_))
    }

    pub fn race(&self) -> Option<Race> {
        match self {
            AgentKind::Creature(r) => Some(*r),
            AgentKind::Animal(_) => None,
        }
    }

    pub fn animal(&self) -> Option<AnimalKind> {
        match self {
            AgentKind::Animal(a) => Some(*a),
            AgentKind::Creature(_) => None,
        }
    }

    /// Animals have a hostility profile; creatures decide per encounter
    pub fn hostility(&self) -> Option<Hostility> {
        self.stats().hostility
    }

    pub fn is_predator(&self) -> bool {
        self.hostility() == Some(Hostility::Predator)
    }

    /// Whether this kind naturally goes after `other`
    pub fn hunts(&self, other: AgentKind) -> bool {
        let stats = self.stats();
        match other {
            AgentKind::Creature(_) => stats.hunts_creatures,
            AgentKind::Animal(a) => stats.prey.contains(&a),
        }
    }

    pub fn stats(&self) -> SpeciesStats {
        match self {
            AgentKind::Creature(race) => creature_stats(*race),
            AgentKind::Animal(kind) => animal_stats(*kind),
        }
    }
}

impl std::fmt::Display for AgentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AgentKind::Creature(r) => write!(f, "{:?}", r),
            AgentKind::Animal(a) => write!(f, "{:?}", a),
        }
    }
}

/// Base stats looked up from [`AgentKind`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeciesStats {
    pub max_hp: f32,
    /// World units per second
    pub speed: f32,
    pub attack_damage: f32,
    pub attack_range: f32,
    /// `None` means the configured creature perception radius
    pub perception_radius: Option<f32>,
    pub hostility: Option<Hostility>,
    pub prey: &'static [AnimalKind],
    pub hunts_creatures: bool,
}

fn creature_stats(race: Race) -> SpeciesStats {
    let (max_hp, speed, attack_damage) = match race {
        Race::Human => (100.0, 2.0, 10.0),
        Race::Elf => (90.0, 2.4, 9.0),
        Race::Dwarf => (120.0, 1.6, 12.0),
        Race::Orc => (130.0, 1.9, 14.0),
        Race::Goblin => (70.0, 2.5, 7.0),
    };
    SpeciesStats {
        max_hp,
        speed,
        attack_damage,
        attack_range: 1.5,
        perception_radius: None,
        hostility: None,
        prey: &[],
        hunts_creatures: false,
    }
}

fn animal_stats(kind: AnimalKind) -> SpeciesStats {
    use AnimalKind::*;
    match kind {
        Rabbit => SpeciesStats {
            max_hp: 15.0,
            speed: 3.0,
            attack_damage: 0.0,
            attack_range: 0.0,
            perception_radius: Some(8.0),
            hostility: Some(Hostility::Skittish),
            prey: &[],
            hunts_creatures: false,
        },
        Deer => SpeciesStats {
            max_hp: 40.0,
            speed: 3.2,
            attack_damage: 2.0,
            attack_range: 1.0,
            perception_radius: Some(12.0),
            hostility: Some(Hostility::Skittish),
            prey: &[],
            hunts_creatures: false,
        },
        Sheep => SpeciesStats {
            max_hp: 35.0,
            speed: 1.4,
            attack_damage: 0.0,
            attack_range: 0.0,
            perception_radius: Some(6.0),
            hostility: Some(Hostility::Passive),
            prey: &[],
            hunts_creatures: false,
        },
        Boar => SpeciesStats {
            max_hp: 60.0,
            speed: 2.2,
            attack_damage: 8.0,
            attack_range: 1.2,
            perception_radius: Some(6.0),
            hostility: Some(Hostility::Aggressive),
            prey: &[],
            hunts_creatures: false,
        },
        Fox => SpeciesStats {
            max_hp: 25.0,
            speed: 2.8,
            attack_damage: 5.0,
            attack_range: 1.0,
            perception_radius: Some(10.0),
            hostility: Some(Hostility::Predator),
            prey: &[Rabbit],
            hunts_creatures: false,
        },
        Wolf => SpeciesStats {
            max_hp: 55.0,
            speed: 2.9,
            attack_damage: 11.0,
            attack_range: 1.3,
            perception_radius: Some(14.0),
            hostility: Some(Hostility::Predator),
            prey: &[Rabbit, Deer, Sheep],
            hunts_creatures: true,
        },
        Bear => SpeciesStats {
            max_hp: 150.0,
            speed: 2.1,
            attack_damage: 18.0,
            attack_range: 1.6,
            perception_radius: Some(10.0),
            hostility: Some(Hostility::Predator),
            prey: &[Deer, Sheep, Boar],
            hunts_creatures: true,
        },
    }
}
