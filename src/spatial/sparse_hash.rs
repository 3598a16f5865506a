//! Sparse hash grid for efficient spatial queries
//!
//! Cells are keyed by `floor(pos / cell_size)` and only exist while occupied.
//! Each key's recorded cells make removal O(1) in the number of cells it
//! touched, independent of the total population.

use ahash::AHashMap;
use std::hash::Hash;

use crate::core::types::{AgentId, Vec2};

pub type CellKey = (i32, i32);

#[derive(Debug, Clone)]
struct Placement {
    cells: Vec<CellKey>,
    position: Vec2,
}

/// Uniform grid index from world positions to keys
#[derive(Debug, Clone)]
pub struct SparseHashGrid<K = AgentId> {
    cell_size: f32,
    cells: AHashMap<CellKey, Vec<K>>,
    placements: AHashMap<K, Placement>,
}

impl<K: Copy + Eq + Hash + Ord> SparseHashGrid<K> {
    /// `cell_size` must be positive
    pub fn new(cell_size: f32) -> Self {
        assert!(cell_size > 0.0, "cell_size must be positive, got {cell_size}");
        Self {
            cell_size,
            cells: AHashMap::new(),
            placements: AHashMap::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    #[inline]
    pub fn cell_of(&self, pos: Vec2) -> CellKey {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    pub fn len(&self) -> usize {
        self.placements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placements.is_empty()
    }

    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }

    pub fn contains(&self, key: K) -> bool {
        self.placements.contains_key(&key)
    }

    /// Position recorded at the last insert
    pub fn position(&self, key: K) -> Option<Vec2> {
        self.placements.get(&key).map(|p| p.position)
    }

    pub fn clear(&mut self) {
        self.cells.clear();
        self.placements.clear();
    }

    /// Place `key` at `pos`. A key that is already indexed is moved, so it
    /// never occupies more than one cell.
    pub fn insert(&mut self, key: K, pos: Vec2) {
        self.remove(key);
        let cell_key = self.cell_of(pos);
        self.cells.entry(cell_key).or_default().push(key);
        self.placements.insert(
            key,
            Placement {
                cells: vec![cell_key],
                position: pos,
            },
        );
    }

    /// Remove `key` from every cell it was recorded in. Returns false if the
    /// key was not indexed.
    pub fn remove(&mut self, key: K) -> bool {
        let Some(placement) = self.placements.remove(&key) else {
            return false;
        };
        for cell_key in placement.cells {
            if let Some(cell) = self.cells.get_mut(&cell_key) {
                cell.retain(|k| *k != key);
                if cell.is_empty() {
                    self.cells.remove(&cell_key);
                }
            }
        }
        true
    }

    /// Re-index after a move
    pub fn update(&mut self, key: K, pos: Vec2) {
        self.insert(key, pos);
    }

    /// Keys within Euclidean `radius` of `center`.
    ///
    /// Cells overlapping the bounding square are the broad phase; each
    /// candidate is then confirmed against its exact position.
    pub fn query(&self, center: Vec2, radius: f32) -> Vec<K> {
        if radius < 0.0 || radius.is_nan() {
            return Vec::new();
        }
        let radius_sq = radius * radius;
        let min = Vec2::new(center.x - radius, center.y - radius);
        let max = Vec2::new(center.x + radius, center.y + radius);

        self.candidates(min, max)
            .into_iter()
            .filter(|key| {
                self.placements
                    .get(key)
                    .map(|p| p.position.distance_sq(&center) <= radius_sq)
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Keys whose position lies inside the inclusive rectangle `[min, max]`
    pub fn query_rect(&self, min: Vec2, max: Vec2) -> Vec<K> {
        if min.x > max.x || min.y > max.y {
            return Vec::new();
        }
        self.candidates(min, max)
            .into_iter()
            .filter(|key| {
                self.placements
                    .get(key)
                    .map(|p| {
                        let pos = p.position;
                        pos.x >= min.x && pos.x <= max.x && pos.y >= min.y && pos.y <= max.y
                    })
                    .unwrap_or(false)
            })
            .collect()
    }

    /// Members of every occupied cell overlapping `[min, max]`.
    ///
    /// Walks the cell range directly when it is smaller than the occupied set,
    /// otherwise scans occupied cells (sorted, so the order is stable).
    fn candidates(&self, min: Vec2, max: Vec2) -> Vec<K> {
        let (min_cx, min_cy) = self.cell_of(min);
        let (max_cx, max_cy) = self.cell_of(max);
        let span_x = (max_cx as i64 - min_cx as i64 + 1) as u64;
        let span_y = (max_cy as i64 - min_cy as i64 + 1) as u64;
        let range_cells = span_x.saturating_mul(span_y);

        let mut out = Vec::new();
        if range_cells <= self.cells.len() as u64 {
            for cy in min_cy..=max_cy {
                for cx in min_cx..=max_cx {
                    if let Some(cell) = self.cells.get(&(cx, cy)) {
                        out.extend_from_slice(cell);
                    }
                }
            }
        } else {
            let mut keys: Vec<&CellKey> = self
                .cells
                .keys()
                .filter(|(cx, cy)| *cx >= min_cx && *cx <= max_cx && *cy >= min_cy && *cy <= max_cy)
                .collect();
            keys.sort_by_key(|(cx, cy)| (*cy, *cx));
            for key in keys {
                if let Some(cell) = self.cells.get(key) {
                    out.extend_from_slice(cell);
                }
            }
        }
        out
    }

    /// Rebuild from scratch
    pub fn rebuild(&mut self, entries: impl Iterator<Item = (K, Vec2)>) {
        self.clear();
        for (key, pos) in entries {
            self.insert(key, pos);
        }
    }
}
