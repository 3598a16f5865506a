//! Tile, terrain kind, biome and resource definitions

use serde::{Deserialize, Serialize};

use crate::core::types::FactionId;

/// Terrain kind of a single world cell
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TileType {
    DeepWater,
    ShallowWater,
    Sand,
    Grass,
    Dirt,
    Savanna,
    Desert,
    Forest,
    DenseForest,
    Swamp,
    Tundra,
    Snow,
    Ice,
    Stone,
    Mountain,
    Farmland,
}

impl TileType {
    pub const ALL: [TileType; 16] = [
        TileType::DeepWater,
        TileType::ShallowWater,
        TileType::Sand,
        TileType::Grass,
        TileType::Dirt,
        TileType::Savanna,
        TileType::Desert,
        TileType::Forest,
        TileType::DenseForest,
        TileType::Swamp,
        TileType::Tundra,
        TileType::Snow,
        TileType::Ice,
        TileType::Stone,
        TileType::Mountain,
        TileType::Farmland,
    ];

    /// Biome for this tile kind (pure lookup)
    pub fn biome(&self) -> Biome {
        match self {
            TileType::DeepWater | TileType::ShallowWater => Biome::Ocean,
            TileType::Sand => Biome::Beach,
            TileType::Grass | TileType::Dirt | TileType::Farmland => Biome::Grassland,
            TileType::Savanna => Biome::Savanna,
            TileType::Desert => Biome::Desert,
            TileType::Forest => Biome::Forest,
            TileType::DenseForest => Biome::Rainforest,
            TileType::Swamp => Biome::Wetland,
            TileType::Tundra => Biome::Tundra,
            TileType::Snow | TileType::Ice => Biome::Arctic,
            TileType::Stone | TileType::Mountain => Biome::Alpine,
        }
    }

    pub fn is_water(&self) -> bool {
        matches!(self, TileType::DeepWater | TileType::ShallowWater)
    }

    pub fn is_walkable(&self) -> bool {
        !matches!(
            self,
            TileType::DeepWater | TileType::ShallowWater | TileType::Mountain
        )
    }

    /// Tiles an agent can drink from while standing next to them
    pub fn is_drinkable(&self) -> bool {
        matches!(self, TileType::ShallowWater | TileType::Swamp)
    }

    /// Base fertility before moisture and temperature scaling
    pub fn base_fertility(&self) -> f32 {
        match self {
            TileType::Farmland => 1.0,
            TileType::Grass => 0.8,
            TileType::Forest => 0.7,
            TileType::DenseForest => 0.6,
            TileType::Dirt => 0.6,
            TileType::Swamp => 0.5,
            TileType::Savanna => 0.5,
            TileType::Tundra => 0.2,
            TileType::Sand => 0.1,
            TileType::Desert | TileType::Stone => 0.05,
            _ => 0.0,
        }
    }

    /// What this tile becomes once `kind` is harvested to exhaustion
    pub fn depleted_successor(&self, kind: ResourceKind) -> Option<TileType> {
        match (self, kind) {
            (TileType::Forest, ResourceKind::Timber) => Some(TileType::Grass),
            (TileType::DenseForest, ResourceKind::Timber) => Some(TileType::Forest),
            (TileType::Stone, ResourceKind::Stone) => Some(TileType::Dirt),
            _ => None,
        }
    }
}

/// Coarse ecological classification derived from [`TileType`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Biome {
    Ocean,
    Beach,
    Grassland,
    Savanna,
    Desert,
    Forest,
    Rainforest,
    Wetland,
    Tundra,
    Arctic,
    Alpine,
}

impl Biome {
    /// Resource candidates and their base spawn chance, in roll order
    pub fn resource_candidates(&self) -> &'static [(ResourceKind, f32)] {
        match self {
            Biome::Ocean => &[(ResourceKind::Fish, 0.12)],
            Biome::Beach => &[(ResourceKind::Clay, 0.06), (ResourceKind::Fish, 0.03)],
            Biome::Grassland => &[(ResourceKind::Berries, 0.08), (ResourceKind::Herbs, 0.04)],
            Biome::Savanna => &[(ResourceKind::Berries, 0.05), (ResourceKind::Timber, 0.03)],
            Biome::Desert => &[(ResourceKind::Stone, 0.05), (ResourceKind::Gems, 0.01)],
            Biome::Forest => &[
                (ResourceKind::Timber, 0.30),
                (ResourceKind::Berries, 0.10),
                (ResourceKind::Herbs, 0.05),
            ],
            Biome::Rainforest => &[
                (ResourceKind::Timber, 0.40),
                (ResourceKind::Berries, 0.15),
                (ResourceKind::Herbs, 0.10),
            ],
            Biome::Wetland => &[
                (ResourceKind::Herbs, 0.10),
                (ResourceKind::Clay, 0.08),
                (ResourceKind::Berries, 0.05),
            ],
            Biome::Tundra => &[(ResourceKind::Stone, 0.05), (ResourceKind::Berries, 0.02)],
            Biome::Arctic => &[(ResourceKind::Stone, 0.03)],
            Biome::Alpine => &[
                (ResourceKind::Stone, 0.25),
                (ResourceKind::Ore, 0.15),
                (ResourceKind::Gems, 0.03),
            ],
        }
    }

    pub fn can_host(&self, kind: ResourceKind) -> bool {
        self.resource_candidates().iter().any(|(k, _)| *k == kind)
    }
}

/// Harvestable resource on a tile
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ResourceKind {
    Timber,
    Berries,
    Herbs,
    Fish,
    Stone,
    Ore,
    Gems,
    Clay,
}

impl ResourceKind {
    /// Per-tile ceiling for this resource
    pub fn max_amount(&self) -> f32 {
        match self {
            ResourceKind::Timber => 50.0,
            ResourceKind::Berries => 20.0,
            ResourceKind::Herbs => 15.0,
            ResourceKind::Fish => 30.0,
            ResourceKind::Stone => 100.0,
            ResourceKind::Ore => 60.0,
            ResourceKind::Gems => 10.0,
            ResourceKind::Clay => 40.0,
        }
    }

    pub fn is_food(&self) -> bool {
        matches!(self, ResourceKind::Berries | ResourceKind::Fish)
    }

    pub fn is_renewable(&self) -> bool {
        matches!(
            self,
            ResourceKind::Timber | ResourceKind::Berries | ResourceKind::Herbs | ResourceKind::Fish
        )
    }
}

/// One world cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tile {
    pub tile_type: TileType,
    pub biome: Biome,
    /// 0.0 = sea floor, 1.0 = peak
    pub elevation: f32,
    pub moisture: f32,
    pub temperature: f32,
    pub resource: Option<ResourceKind>,
    pub resource_amount: f32,
    pub fertility: f32,
    pub pollution: f32,
    pub owner: Option<FactionId>,
    /// Detail index for renderers
    pub variant: u8,
}

impl Default for Tile {
    fn default() -> Self {
        Self {
            tile_type: TileType::Grass,
            biome: Biome::Grassland,
            elevation: 0.5,
            moisture: 0.5,
            temperature: 0.5,
            resource: None,
            resource_amount: 0.0,
            fertility: 0.0,
            pollution: 0.0,
            owner: None,
            variant: 0,
        }
    }
}

impl Tile {
    pub fn has_resource(&self) -> bool {
        self.resource.is_some() && self.resource_amount > 0.0
    }

    pub fn has_food(&self) -> bool {
        self.has_resource() && self.resource.map(|r| r.is_food()).unwrap_or(false)
    }

    /// Take up to `amount` of the resource, returning what was actually taken.
    ///
    /// Emptying the tile applies its depleted successor, if any, in which case
    /// the second value is `true`.
    pub fn harvest(&mut self, amount: f32) -> (f32, bool) {
        let Some(kind) = self.resource else {
            return (0.0, false);
        };
        let taken = amount.abs().min(self.resource_amount.max(0.0));
        self.resource_amount = (self.resource_amount - taken).max(0.0);

        if self.resource_amount <= 0.0 {
            self.resource_amount = 0.0;
            if let Some(next) = self.tile_type.depleted_successor(kind) {
                self.resource = None;
                self.tile_type = next;
                self.biome = next.biome();
                return (taken, true);
            }
            // Renewables keep their kind so they can regrow in place
            if !kind.is_renewable() {
                self.resource = None;
            }
        }
        (taken, false)
    }
}
