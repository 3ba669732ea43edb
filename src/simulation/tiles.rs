//! # Tileset Simulation
//!
//! Generates building tiles around a site, standing in for the streamed
//! dataset when no loader is attached.

use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{InMemoryTile, PropertyFeature, HEIGHT_PROPERTY};

/// Simulated tileset configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TilesetSimulatorConfig {
    /// Site latitude in degrees (positive = north)
    pub center_latitude_deg: f64,
    /// Site longitude in degrees (positive = east)
    pub center_longitude_deg: f64,
    /// Number of distinct tiles
    pub tiles: usize,
    /// Buildings per tile
    pub features_per_tile: usize,
    /// Half-width of the scatter box in degrees
    pub spread_deg: f64,
    /// Tallest generated building in meters
    pub max_height_m: f64,
    /// Share of buildings without a height attribute (0.0-1.0)
    pub missing_height_ratio: f64,
    /// Random seed for reproducibility (None = random)
    pub random_seed: Option<u64>,
}

impl Default for TilesetSimulatorConfig {
    fn default() -> Self {
        Self {
            center_latitude_deg: 47.598, // Seattle
            center_longitude_deg: -122.3472,
            tiles: 4,
            features_per_tile: 25,
            spread_deg: 0.01,
            max_height_m: 120.0,
            missing_height_ratio: 0.05,
            random_seed: None,
        }
    }
}

pub struct TilesetSimulator {
    config: TilesetSimulatorConfig,
    rng: StdRng,
    next_id: u64,
}

impl TilesetSimulator {
    pub fn new(config: TilesetSimulatorConfig) -> Self {
        let rng = match config.random_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self {
            config,
            rng,
            next_id: 1,
        }
    }

    /// Generate the tile at `index`
    pub fn tile(&mut self, index: usize) -> InMemoryTile {
        let features = (0..self.config.features_per_tile)
            .map(|_| self.building())
            .collect();
        InMemoryTile::new(format!("sim/{}", index), features)
    }

    /// All configured tiles, in index order
    pub fn tiles(&mut self) -> Vec<InMemoryTile> {
        (0..self.config.tiles).map(|i| self.tile(i)).collect()
    }

    fn building(&mut self) -> PropertyFeature {
        let spread = self.config.spread_deg.abs();
        let lon = self.config.center_longitude_deg + self.rng.gen_range(-spread..=spread);
        let lat = self.config.center_latitude_deg + self.rng.gen_range(-spread..=spread);
        let height = self.rng.gen_range(3.0..=self.config.max_height_m.max(3.0));

        let id = self.next_id;
        self.next_id += 1;

        let feature = PropertyFeature::building(id, lon, lat, height);
        if self.rng.gen_bool(self.config.missing_height_ratio.clamp(0.0, 1.0)) {
            feature.with_property(HEIGHT_PROPERTY, Value::Null)
        } else {
            feature
        }
    }
}
