pub mod feature;
pub mod tile;
pub mod types;

pub use feature::*;
pub use tile::*;
pub use types::*;
