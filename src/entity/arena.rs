//! Generational slot arena owning every live agent
//!
//! Freed slots are recycled through a free list; each slot's generation is
//! bumped on removal so stale `AgentId`s stop resolving.

use serde::{Deserialize, Serialize};

use crate::core::types::AgentId;
use crate::entity::agent::Agent;

#[derive(Debug, Clone, Default)]
pub struct AgentArena {
    slots: Vec<Option<Agent>>,
    generations: Vec<u32>,
    free_list: Vec<u32>,
    len: usize,
}

/// Slot bookkeeping needed to rebuild an arena with identical handles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArenaLayout {
    pub generations: Vec<u32>,
    pub free_list: Vec<u32>,
}

impl AgentArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            generations: Vec::with_capacity(capacity),
            free_list: Vec::new(),
            len: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Handle the next insert will receive
    pub fn next_id(&self) -> AgentId {
        match self.free_list.last() {
            Some(&index) => AgentId::new(index, self.generations[index as usize]),
            None => AgentId::new(self.slots.len() as u32, 0),
        }
    }

    /// Insert an agent built from its handle
    pub fn insert_with(&mut self, build: impl FnOnce(AgentId) -> Agent) -> AgentId {
        let id = self.next_id();
        let agent = build(id);
        let index = id.index as usize;

        if index < self.slots.len() {
            self.free_list.pop();
            self.slots[index] = Some(agent);
        } else {
            self.slots.push(Some(agent));
            self.generations.push(0);
        }
        self.len += 1;
        id
    }

    pub fn remove(&mut self, id: AgentId) -> Option<Agent> {
        if !self.contains(id) {
            return None;
        }
        let index = id.index as usize;
        let agent = self.slots[index].take();
        self.generations[index] = self.generations[index].wrapping_add(1);
        self.free_list.push(id.index);
        self.len -= 1;
        agent
    }

    pub fn contains(&self, id: AgentId) -> bool {
        let index = id.index as usize;
        index < self.slots.len()
            && self.generations[index] == id.generation
            && self.slots[index].is_some()
    }

    pub fn get(&self, id: AgentId) -> Option<&Agent> {
        if !self.contains(id) {
            return None;
        }
        self.slots[id.index as usize].as_ref()
    }

    pub fn get_mut(&mut self, id: AgentId) -> Option<&mut Agent> {
        if !self.contains(id) {
            return None;
        }
        self.slots[id.index as usize].as_mut()
    }

    /// Live agents in slot order
    pub fn iter(&self) -> impl Iterator<Item = &Agent> {
        self.slots.iter().filter_map(|s| s.as_ref())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Agent> {
        self.slots.iter_mut().filter_map(|s| s.as_mut())
    }

    /// Live handles in slot order
    pub fn ids(&self) -> Vec<AgentId> {
        self.iter().map(|a| a.id).collect()
    }

    pub fn layout(&self) -> ArenaLayout {
        ArenaLayout {
            generations: self.generations.clone(),
            free_list: self.free_list.clone(),
        }
    }

    /// Rebuild from a layout and the agents that lived in it.
    ///
    /// Returns `None` if an agent's handle does not fit the layout.
    pub fn from_parts(layout: ArenaLayout, agents: Vec<Agent>) -> Option<Self> {
        let mut slots: Vec<Option<Agent>> = vec![None; layout.generations.len()];
        let mut len = 0;
        for agent in agents {
            let index = agent.id.index as usize;
            if index >= slots.len()
                || layout.generations[index] != agent.id.generation
                || slots[index].is_some()
                || layout.free_list.contains(&agent.id.index)
            {
                return None;
            }
            slots[index] = Some(agent);
            len += 1;
        }

        // Every empty slot must be reachable from the free list
        let empty = slots.iter().filter(|s| s.is_none()).count();
        if empty != layout.free_list.len()
            || layout
                .free_list
                .iter()
                .any(|i| (*i as usize) >= slots.len())
        {
            return None;
        }

        Some(Self {
            slots,
            generations: layout.generations,
            free_list: layout.free_list,
            len,
        })
    }
}
