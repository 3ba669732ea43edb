//! # Solar Position
//!
//! Timestamp to sun direction over the rotating planet.

pub mod ephemeris;
pub mod frames;
pub mod position;

pub use ephemeris::{julian_date, sun_inertial_position, SolarElements};
pub use frames::{greenwich_mean_sidereal_angle, FrameTransform};
pub use position::SolarPositionModel;
