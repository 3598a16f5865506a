//! World map: the tile query and mutation surface
//!
//! Agents, god tools and renderers all go through this type. Every mutation
//! widens the dirty rectangle so an external renderer knows what to redraw.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{Result, SimError};
use crate::core::types::{FactionId, Vec2};
use crate::spatial::grid::Grid;
use crate::world::terrain::{classify, fertility};
use crate::world::tile::{ResourceKind, Tile, TileType};

/// Inclusive rectangle of tile coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileRect {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl TileRect {
    pub fn point(x: i32, y: i32) -> Self {
        Self {
            min_x: x,
            min_y: y,
            max_x: x,
            max_y: y,
        }
    }

    pub fn union(&self, other: &TileRect) -> TileRect {
        TileRect {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorldMap {
    seed: u32,
    tiles: Grid<Tile>,
    #[serde(skip)]
    dirty: Option<TileRect>,
}

impl WorldMap {
    pub fn from_tiles(seed: u32, tiles: Grid<Tile>) -> Self {
        Self {
            seed,
            tiles,
            dirty: None,
        }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    pub fn width(&self) -> usize {
        self.tiles.width()
    }

    pub fn height(&self) -> usize {
        self.tiles.height()
    }

    pub fn tiles(&self) -> &Grid<Tile> {
        &self.tiles
    }

    pub fn get_tile(&self, x: i32, y: i32) -> Option<&Tile> {
        self.tiles.get(x, y)
    }

    pub fn tile_at(&self, pos: Vec2) -> Option<&Tile> {
        let (x, y) = pos.tile();
        self.tiles.get(x, y)
    }

    pub fn in_bounds(&self, pos: Vec2) -> bool {
        pos.x >= 0.0
            && pos.y >= 0.0
            && pos.x < self.width() as f32
            && pos.y < self.height() as f32
    }

    /// Out-of-bounds tiles are never walkable
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.tiles
            .get(x, y)
            .map(|t| t.tile_type.is_walkable())
            .unwrap_or(false)
    }

    pub fn is_walkable_at(&self, pos: Vec2) -> bool {
        let (x, y) = pos.tile();
        self.is_walkable(x, y)
    }

    /// Replace a tile's type and biome, leaving its other fields untouched
    pub fn set_tile(&mut self, x: i32, y: i32, tile_type: TileType) -> Result<()> {
        let tile = self
            .tiles
            .get_mut(x, y)
            .ok_or(SimError::OutOfBounds { x, y })?;
        tile.tile_type = tile_type;
        tile.biome = tile_type.biome();
        self.mark_dirty(TileRect::point(x, y));
        tracing::debug!("Tile ({}, {}) set to {:?}", x, y, tile_type);
        Ok(())
    }

    pub fn claim_tile(&mut self, x: i32, y: i32, owner: Option<FactionId>) -> Result<()> {
        let tile = self
            .tiles
            .get_mut(x, y)
            .ok_or(SimError::OutOfBounds { x, y })?;
        tile.owner = owner;
        self.mark_dirty(TileRect::point(x, y));
        Ok(())
    }

    /// Take up to `amount` from the tile's resource.
    ///
    /// Never returns more than the tile held; out-of-bounds or empty tiles
    /// yield 0.
    pub fn harvest_resource(&mut self, x: i32, y: i32, amount: f32) -> f32 {
        let Some(tile) = self.tiles.get_mut(x, y) else {
            return 0.0;
        };
        let (taken, changed) = tile.harvest(amount);
        if changed {
            tracing::debug!("Tile ({}, {}) depleted to {:?}", x, y, tile.tile_type);
            self.mark_dirty(TileRect::point(x, y));
        }
        taken
    }

    /// Raise (or lower, with negative `delta`) elevation within `radius` tiles
    /// of `(cx, cy)`, weighted by `1 - (d / radius)^2`.
    ///
    /// Affected tiles are reclassified from their new elevation with moisture
    /// and temperature preserved. Returns the number of tiles touched.
    pub fn raise_elevation(&mut self, cx: i32, cy: i32, radius: f32, delta: f32) -> usize {
        if !(radius > 0.0) {
            return 0;
        }
        // Radius square clipped to the grid, in i64 so huge radii cannot overflow
        let r = radius.min(1.0e12).ceil() as i64;
        let clip = |c: i32, len: usize| {
            let lo = (i64::from(c) - r).max(0);
            let hi = (i64::from(c) + r).min(len as i64 - 1);
            (lo as i32, hi as i32)
        };
        let (x0, x1) = clip(cx, self.tiles.width());
        let (y0, y1) = clip(cy, self.tiles.height());
        let mut touched = 0;
        let mut region: Option<TileRect> = None;

        for y in y0..=y1 {
            for x in x0..=x1 {
                let Some(tile) = self.tiles.get_mut(x, y) else {
                    continue;
                };
                let dx = (i64::from(x) - i64::from(cx)) as f32;
                let dy = (i64::from(y) - i64::from(cy)) as f32;
                let d = (dx * dx + dy * dy).sqrt() / radius;
                if d > 1.0 {
                    continue;
                }

                let weight = 1.0 - d * d;
                tile.elevation = (tile.elevation + delta * weight).clamp(0.0, 1.0);

                let next = classify(tile.elevation, tile.moisture, tile.temperature);
                if next != tile.tile_type {
                    tile.tile_type = next;
                    tile.biome = next.biome();
                    tile.fertility = fertility(next, tile.moisture, tile.temperature);
                    if let Some(kind) = tile.resource {
                        if !tile.biome.can_host(kind) {
                            tile.resource = None;
                            tile.resource_amount = 0.0;
                        }
                    }
                }

                touched += 1;
                let rect = TileRect::point(x, y);
                region = Some(region.map_or(rect, |r| r.union(&rect)));
            }
        }

        if let Some(rect) = region {
            self.mark_dirty(rect);
        }
        tracing::debug!(
            "Terraformed {} tiles around ({}, {}) by {:+.3}",
            touched,
            cx,
            cy,
            delta
        );
        touched
    }

    /// Regrow renewable resources by `rate` of their maximum per second
    pub fn regenerate_resources(&mut self, dt: f32, rate: f32) {
        if dt <= 0.0 || rate <= 0.0 {
            return;
        }
        for (_, _, tile) in self.tiles.iter_mut() {
            if let Some(kind) = tile.resource {
                if kind.is_renewable() {
                    let max = kind.max_amount();
                    tile.resource_amount = (tile.resource_amount + max * rate * dt).min(max);
                }
            }
        }
    }

    /// Nearest tile within `radius` of `center` (by tile-center distance)
    /// satisfying `predicate`. Ties resolve to the first tile in row-major order.
    pub fn find_nearest(
        &self,
        center: Vec2,
        radius: f32,
        predicate: impl Fn(&Tile) -> bool,
    ) -> Option<(i32, i32)> {
        if radius < 0.0 {
            return None;
        }
        let (cx, cy) = center.tile();
        let r = radius.ceil() as i32;
        let (min_x, min_y) = self.tiles.clamp(cx - r, cy - r);
        let (max_x, max_y) = self.tiles.clamp(cx + r, cy + r);
        let radius_sq = radius * radius;

        let mut best: Option<((i32, i32), f32)> = None;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let Some(tile) = self.tiles.get(x, y) else {
                    continue;
                };
                if !predicate(tile) {
                    continue;
                }
                let d = Vec2::tile_center(x, y).distance_sq(&center);
                if d <= radius_sq && best.map_or(true, |(_, bd)| d < bd) {
                    best = Some(((x, y), d));
                }
            }
        }
        best.map(|(pos, _)| pos)
    }

    /// Nearest tile holding a resource accepted by `filter`
    pub fn find_resource(
        &self,
        center: Vec2,
        radius: f32,
        filter: impl Fn(ResourceKind) -> bool,
    ) -> Option<(i32, i32)> {
        self.find_nearest(center, radius, |t| {
            t.has_resource() && t.resource.map(&filter).unwrap_or(false)
        })
    }

    pub fn find_food(&self, center: Vec2, radius: f32) -> Option<(i32, i32)> {
        self.find_resource(center, radius, |k| k.is_food())
    }

    pub fn find_water(&self, center: Vec2, radius: f32) -> Option<(i32, i32)> {
        self.find_nearest(center, radius, |t| t.tile_type.is_drinkable())
    }

    /// Whether `pos` is within reach of a drinkable tile (own tile or one of the
    /// eight neighbors)
    pub fn water_adjacent(&self, pos: Vec2) -> bool {
        let (x, y) = pos.tile();
        (-1..=1).any(|dy| {
            (-1..=1).any(|dx| {
                self.tiles
                    .get(x + dx, y + dy)
                    .map(|t| t.tile_type.is_drinkable())
                    .unwrap_or(false)
            })
        })
    }

    /// Random walkable tile center, trying at most `attempts` times
    pub fn random_walkable_position(&self, rng: &mut impl Rng, attempts: usize) -> Option<Vec2> {
        for _ in 0..attempts {
            let x = rng.gen_range(0..self.width()) as i32;
            let y = rng.gen_range(0..self.height()) as i32;
            if self.is_walkable(x, y) {
                return Some(Vec2::tile_center(x, y));
            }
        }
        None
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.is_some()
    }

    /// Region mutated since the last call, clearing the flag
    pub fn take_dirty(&mut self) -> Option<TileRect> {
        self.dirty.take()
    }

    fn mark_dirty(&mut self, rect: TileRect) {
        self.dirty = Some(self.dirty.map_or(rect, |d| d.union(&rect)));
    }
}
