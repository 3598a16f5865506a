//! Bounded episodic memory of places and encounters

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::core::types::{AgentId, Tick, Vec2};

/// Two memories of the same kind closer than this are the same place
const SAME_PLACE_DISTANCE: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MemoryKind {
    Danger,
    FoodSource,
    WaterSource,
    Friend,
    Trauma,
    Shelter,
}

/// A single timestamped recollection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memory {
    pub kind: MemoryKind,
    pub position: Vec2,
    /// Agent involved, if any
    pub entity: Option<AgentId>,
    /// How impactful (0.0 to 1.0)
    pub intensity: f32,
    pub timestamp: Tick,
}

impl Memory {
    pub fn new(kind: MemoryKind, position: Vec2, intensity: f32, timestamp: Tick) -> Self {
        Self {
            kind,
            position,
            entity: None,
            intensity: intensity.clamp(0.0, 1.0),
            timestamp,
        }
    }

    pub fn with_entity(mut self, entity: AgentId) -> Self {
        self.entity = Some(entity);
        self
    }
}

/// Ring buffer of memories; the oldest is dropped once `capacity` is reached
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryBank {
    capacity: usize,
    entries: VecDeque<Memory>,
}

impl MemoryBank {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Rebuild from saved entries, oldest first, keeping the newest `capacity`
    pub fn from_entries(capacity: usize, entries: impl IntoIterator<Item = Memory>) -> Self {
        let mut bank = Self::new(capacity);
        for memory in entries {
            if bank.entries.len() == bank.capacity {
                bank.entries.pop_front();
            }
            bank.entries.push_back(memory);
        }
        bank
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Memory> {
        self.entries.iter()
    }

    /// Store a memory. Revisiting a remembered place of the same kind (and
    /// entity) refreshes that memory instead of adding a duplicate.
    pub fn record(&mut self, memory: Memory) {
        if let Some(pos) = self.entries.iter().position(|m| {
            m.kind == memory.kind
                && m.entity == memory.entity
                && m.position.distance(&memory.position) < SAME_PLACE_DISTANCE
        }) {
            if let Some(existing) = self.entries.remove(pos) {
                let merged = Memory {
                    intensity: existing.intensity.max(memory.intensity),
                    ..memory
                };
                self.entries.push_back(merged);
            }
            return;
        }

        while self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(memory);
    }

    /// Closest memory of `kind` to `from`; ties go to the most recent
    pub fn recall_nearest(&self, kind: MemoryKind, from: Vec2) -> Option<&Memory> {
        let mut best: Option<(&Memory, f32)> = None;
        for memory in self.entries.iter().rev().filter(|m| m.kind == kind) {
            let d = memory.position.distance_sq(&from);
            if best.map_or(true, |(_, bd)| d < bd) {
                best = Some((memory, d));
            }
        }
        best.map(|(m, _)| m)
    }

    pub fn has_kind(&self, kind: MemoryKind) -> bool {
        self.entries.iter().any(|m| m.kind == kind)
    }

    /// Drop memories of `kind` within `radius` of `position` (e.g. a food
    /// source found empty). Returns how many were removed.
    pub fn forget_near(&mut self, kind: MemoryKind, position: Vec2, radius: f32) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|m| !(m.kind == kind && m.position.distance(&position) <= radius));
        before - self.entries.len()
    }

    /// Most recent `n` memories, newest first
    pub fn recent(&self, n: usize) -> impl Iterator<Item = &Memory> {
        self.entries.iter().rev().take(n)
    }
}
