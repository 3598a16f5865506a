//! Procedural tile world

pub mod map;
pub mod noise;
pub mod terrain;
pub mod tile;

pub use map::{TileRect, WorldMap};
pub use noise::NoiseField;
pub use terrain::{generate, generate_with, TerrainParams};
pub use tile::{Biome, ResourceKind, Tile, TileType};
