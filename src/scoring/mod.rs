pub mod classifier;
pub mod scorer;
pub mod style;

pub use classifier::*;
pub use scorer::*;
pub use style::*;
