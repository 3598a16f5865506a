//! Procedural terrain generation
//!
//! Three decorrelated octave-noise fields (elevation, moisture, temperature) are
//! sampled per tile, classified through a fixed decision table, and then a
//! second pass scatters resources by biome. The whole batch is deterministic in
//! the seed.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::core::error::{Result, SimError};
use crate::spatial::grid::Grid;
use crate::world::map::WorldMap;
use crate::world::noise::NoiseField;
use crate::world::tile::{Tile, TileType};

const ELEVATION_SEED_OFFSET: u32 = 0;
const MOISTURE_SEED_OFFSET: u32 = 7919;
const TEMPERATURE_SEED_OFFSET: u32 = 104_729;

/// Parameters for a generation run
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainParams {
    pub width: usize,
    pub height: usize,
    pub seed: u32,
    /// Fade elevation toward the map edge so the world is ringed by water
    pub island_mode: bool,
    /// Multiplier on every biome's resource chance
    pub resource_density: f32,
    /// Noise-space distance covered by one tile
    pub noise_scale: f64,
    pub octaves: u32,
    pub persistence: f64,
    /// Stretch applied around 0.5 to every noise field before classification
    pub contrast: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            width: 128,
            height: 128,
            seed: 0,
            island_mode: false,
            resource_density: 1.0,
            noise_scale: 0.08,
            octaves: 4,
            persistence: 0.5,
            contrast: 1.8,
        }
    }
}

/// Generate a `width x height` world with default noise settings
pub fn generate(
    width: usize,
    height: usize,
    seed: u32,
    island_mode: bool,
    resource_density: f32,
) -> Result<WorldMap> {
    generate_with(&TerrainParams {
        width,
        height,
        seed,
        island_mode,
        resource_density,
        ..TerrainParams::default()
    })
}

pub fn generate_with(params: &TerrainParams) -> Result<WorldMap> {
    if params.width == 0 || params.height == 0 {
        return Err(SimError::InvalidDimensions {
            width: params.width,
            height: params.height,
        });
    }

    let elevation_noise = NoiseField::new(params.seed.wrapping_add(ELEVATION_SEED_OFFSET));
    let moisture_noise = NoiseField::new(params.seed.wrapping_add(MOISTURE_SEED_OFFSET));
    let temperature_noise = NoiseField::new(params.seed.wrapping_add(TEMPERATURE_SEED_OFFSET));

    let center_x = (params.width as f64 - 1.0) / 2.0;
    let center_y = (params.height as f64 - 1.0) / 2.0;
    let max_distance = center_x.hypot(center_y).max(1.0);

    let mut cells = Vec::with_capacity(params.width * params.height);
    for y in 0..params.height {
        for x in 0..params.width {
            let nx = x as f64 * params.noise_scale;
            let ny = y as f64 * params.noise_scale;
            let sample = |field: &NoiseField| {
                stretch(
                    field.octaves(nx, ny, params.octaves, params.persistence),
                    params.contrast,
                )
            };

            let mut elevation = sample(&elevation_noise);
            let moisture = sample(&moisture_noise);
            let temperature = sample(&temperature_noise);

            if params.island_mode {
                let d = (x as f64 - center_x).hypot(y as f64 - center_y) / max_distance;
                elevation *= (1.0 - d * d).max(0.0);
            }

            let elevation = elevation as f32;
            let moisture = moisture as f32;
            let temperature = temperature as f32;
            let tile_type = classify(elevation, moisture, temperature);

            cells.push(Tile {
                tile_type,
                biome: tile_type.biome(),
                elevation,
                moisture,
                temperature,
                fertility: fertility(tile_type, moisture, temperature),
                variant: variant(x as u32, y as u32, params.seed),
                ..Tile::default()
            });
        }
    }

    let mut tiles = Grid::from_cells(params.width, params.height, cells).ok_or(
        SimError::InvalidDimensions {
            width: params.width,
            height: params.height,
        },
    )?;

    let mut rng = ChaCha8Rng::seed_from_u64(params.seed as u64);
    let placed = scatter_resources(&mut tiles, params.resource_density, &mut rng);

    tracing::info!(
        "Generated {}x{} world (seed {}, island {}) with {} resource tiles",
        params.width,
        params.height,
        params.seed,
        params.island_mode,
        placed
    );

    Ok(WorldMap::from_tiles(params.seed, tiles))
}

/// Classify a tile from its three profile values.
///
/// Elevation bands are checked first; only the middle band consults
/// temperature and moisture. Every input maps to exactly one type.
pub fn classify(elevation: f32, moisture: f32, temperature: f32) -> TileType {
    if elevation < 0.22 {
        return TileType::DeepWater;
    }
    if elevation < 0.32 {
        return TileType::ShallowWater;
    }
    if elevation < 0.36 {
        return TileType::Sand;
    }
    if elevation >= 0.86 {
        return TileType::Snow;
    }
    if elevation >= 0.76 {
        return TileType::Mountain;
    }
    if elevation >= 0.68 {
        return TileType::Stone;
    }

    // Normal band: temperature extremes first
    if temperature < 0.2 {
        return if moisture >= 0.6 { TileType::Ice } else { TileType::Snow };
    }
    if temperature < 0.3 {
        return TileType::Tundra;
    }
    if temperature > 0.7 {
        return if moisture < 0.35 {
            TileType::Desert
        } else if moisture > 0.6 {
            TileType::DenseForest
        } else {
            TileType::Savanna
        };
    }

    if moisture >= 0.75 {
        TileType::Swamp
    } else if moisture >= 0.62 {
        TileType::DenseForest
    } else if moisture >= 0.5 {
        TileType::Forest
    } else if moisture < 0.22 {
        TileType::Desert
    } else if moisture < 0.35 {
        TileType::Savanna
    } else {
        TileType::Grass
    }
}

/// Fertility: base value scaled up by moisture and down by distance of
/// temperature from the midpoint
pub fn fertility(tile_type: TileType, moisture: f32, temperature: f32) -> f32 {
    let moisture_factor = 0.5 + 0.5 * moisture.clamp(0.0, 1.0);
    let temperature_factor = 1.0 - (temperature.clamp(0.0, 1.0) - 0.5).abs();
    (tile_type.base_fertility() * moisture_factor * temperature_factor).clamp(0.0, 1.0)
}

/// Roll each tile against its biome's candidate list; the first hit wins.
///
/// Returns the number of tiles that received a resource.
fn scatter_resources(tiles: &mut Grid<Tile>, density: f32, rng: &mut ChaCha8Rng) -> usize {
    let density = density.max(0.0);
    let mut placed = 0;

    for (_, _, tile) in tiles.iter_mut() {
        for &(kind, chance) in tile.biome.resource_candidates() {
            if rng.gen::<f32>() < chance * density {
                let max = kind.max_amount();
                tile.resource = Some(kind);
                tile.resource_amount = rng.gen_range(max * 0.5..=max);
                placed += 1;
                break;
            }
        }
    }

    placed
}

#[inline]
fn stretch(value: f64, contrast: f64) -> f64 {
    (0.5 + (value - 0.5) * contrast).clamp(0.0, 1.0)
}

#[inline]
fn variant(x: u32, y: u32, seed: u32) -> u8 {
    let h = x.wrapping_mul(73_856_093) ^ y.wrapping_mul(19_349_663) ^ seed;
    (h % 4) as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::tile::Biome;

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(matches!(
            generate(0, 10, 1, false, 1.0),
            Err(SimError::InvalidDimensions { .. })
        ));
        assert!(generate(10, 0, 1, false, 1.0).is_err());
    }

    #[test]
    fn test_island_corners_are_water_center_is_land() {
        let map = generate(10, 10, 42, true, 1.0).unwrap();
        for (x, y) in [(0, 0), (9, 0), (0, 9), (9, 9)] {
            assert!(map.get_tile(x, y).unwrap().tile_type.is_water(), "corner ({x}, {y})");
        }
        assert!(!map.get_tile(5, 5).unwrap().tile_type.is_water());
    }

    #[test]
    fn test_generation_is_deterministic() {
        let a = generate(32, 24, 77, false, 1.0).unwrap();
        let b = generate(32, 24, 77, false, 1.0).unwrap();
        for y in 0..24 {
            for x in 0..32 {
                assert_eq!(a.get_tile(x, y), b.get_tile(x, y));
            }
        }
    }

    #[test]
    fn test_biome_matches_type_and_fields_in_range() {
        let map = generate(40, 40, 3, false, 1.0).unwrap();
        for (_, _, tile) in map.tiles().iter() {
            assert_eq!(tile.biome, tile.tile_type.biome());
            assert!((0.0..=1.0).contains(&tile.elevation));
            assert!((0.0..=1.0).contains(&tile.moisture));
            assert!((0.0..=1.0).contains(&tile.temperature));
            assert!((0.0..=1.0).contains(&tile.fertility));
            if let Some(kind) = tile.resource {
                assert!(tile.resource_amount <= kind.max_amount());
                assert!(tile.resource_amount >= kind.max_amount() * 0.5);
                assert!(tile.biome.can_host(kind));
            }
        }
    }

    #[test]
    fn test_zero_density_places_nothing() {
        let map = generate(30, 30, 9, false, 0.0).unwrap();
        assert!(map.tiles().iter().all(|(_, _, t)| t.resource.is_none()));
    }

    #[test]
    fn test_classification_bands() {
        assert_eq!(classify(0.1, 0.5, 0.5), TileType::DeepWater);
        assert_eq!(classify(0.25, 0.5, 0.5), TileType::ShallowWater);
        assert_eq!(classify(0.34, 0.5, 0.5), TileType::Sand);
        assert_eq!(classify(0.9, 0.5, 0.5), TileType::Snow);
        assert_eq!(classify(0.8, 0.5, 0.5), TileType::Mountain);
        assert_eq!(classify(0.7, 0.5, 0.5), TileType::Stone);
        assert_eq!(classify(0.5, 0.7, 0.1), TileType::Ice);
        assert_eq!(classify(0.5, 0.3, 0.1), TileType::Snow);
        assert_eq!(classify(0.5, 0.5, 0.25), TileType::Tundra);
        assert_eq!(classify(0.5, 0.2, 0.8), TileType::Desert);
        assert_eq!(classify(0.5, 0.8, 0.8), TileType::DenseForest);
        assert_eq!(classify(0.5, 0.5, 0.8), TileType::Savanna);
        assert_eq!(classify(0.5, 0.8, 0.5), TileType::Swamp);
        assert_eq!(classify(0.5, 0.55, 0.5), TileType::Forest);
        assert_eq!(classify(0.5, 0.45, 0.5), TileType::Grass);
        assert_eq!(classify(0.5, 0.1, 0.5), TileType::Desert);
    }

    #[test]
    fn test_fertility_peaks_at_temperate_wet() {
        let temperate = fertility(TileType::Grass, 1.0, 0.5);
        let cold = fertility(TileType::Grass, 1.0, 0.0);
        let dry = fertility(TileType::Grass, 0.0, 0.5);
        assert!((temperate - 0.8).abs() < 1e-6);
        assert!(cold < temperate);
        assert!(dry < temperate);
        assert_eq!(fertility(TileType::DeepWater, 1.0, 0.5), 0.0);
    }

    #[test]
    fn test_island_mode_has_more_water() {
        let water = |map: &WorldMap| {
            map.tiles()
                .iter()
                .filter(|(_, _, t)| t.biome == Biome::Ocean)
                .count()
        };
        let open = generate(64, 64, 11, false, 1.0).unwrap();
        let island = generate(64, 64, 11, true, 1.0).unwrap();
        assert!(water(&island) > water(&open));
    }
}
