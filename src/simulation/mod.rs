pub mod tiles;

pub use tiles::{TilesetSimulator, TilesetSimulatorConfig};
