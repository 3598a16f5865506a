//! Per-agent affinity toward other agents

use ahash::AHashMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::core::types::AgentId;

pub const AFFINITY_MIN: f32 = -100.0;
pub const AFFINITY_MAX: f32 = 100.0;

/// Affinity in [-100, 100]; unknown agents read as 0
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Relationships {
    affinity: AHashMap<AgentId, f32>,
}

impl Relationships {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.affinity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.affinity.is_empty()
    }

    pub fn get(&self, other: AgentId) -> f32 {
        self.affinity.get(&other).copied().unwrap_or(0.0)
    }

    pub fn knows(&self, other: AgentId) -> bool {
        self.affinity.contains_key(&other)
    }

    /// Shift affinity by `delta`, creating the entry on first contact
    pub fn adjust(&mut self, other: AgentId, delta: f32) -> f32 {
        let entry = self.affinity.entry(other).or_insert(0.0);
        *entry = (*entry + delta).clamp(AFFINITY_MIN, AFFINITY_MAX);
        *entry
    }

    pub fn is_enemy(&self, other: AgentId, threshold: f32) -> bool {
        self.get(other) < threshold
    }

    /// Highest positive affinity; ties go to the lower id
    pub fn closest_friend(&self) -> Option<(AgentId, f32)> {
        self.affinity
            .iter()
            .filter(|(_, a)| **a > 0.0)
            .map(|(id, a)| (*id, *a))
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
    }

    pub fn forget(&mut self, other: AgentId) {
        self.affinity.remove(&other);
    }

    /// Entries sorted by id
    pub fn entries(&self) -> Vec<(AgentId, f32)> {
        let mut out: Vec<_> = self.affinity.iter().map(|(id, a)| (*id, *a)).collect();
        out.sort_by_key(|(id, _)| *id);
        out
    }
}

impl Serialize for Relationships {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.entries().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Relationships {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let entries = Vec::<(AgentId, f32)>::deserialize(deserializer)?;
        Ok(Self {
            affinity: entries
                .into_iter()
                .map(|(id, a)| (id, a.clamp(AFFINITY_MIN, AFFINITY_MAX)))
                .collect(),
        })
    }
}
