//! Inertial to planet-fixed frame rotation

use nalgebra::{Rotation3, Vector3};
use serde::{Deserialize, Serialize};

use super::ephemeris::{julian_centuries, J2000_JD};
use crate::error::{EngineError, Result};

/// 1900-01-01 00:00 UTC
pub const DEFAULT_VALID_FROM_JD: f64 = 2_415_020.5;
/// 2100-01-01 00:00 UTC
pub const DEFAULT_VALID_UNTIL_JD: f64 = 2_488_069.5;

/// Greenwich mean sidereal angle (IAU 1982) in radians [0, 2π)
pub fn greenwich_mean_sidereal_angle(jd: f64) -> f64 {
    let t = julian_centuries(jd);
    let deg = 280.460_618_37 + 360.985_647_366_29 * (jd - J2000_JD) + 0.000_387_933 * t * t
        - t * t * t / 38_710_000.0;
    deg.rem_euclid(360.0).to_radians()
}

/// Earth rotation model valid over a bounded epoch window
///
/// Outside the window the sidereal-angle polynomial and the ephemeris are not
/// trusted, and no rotation is produced.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrameTransform {
    pub valid_from_jd: f64,
    pub valid_until_jd: f64,
}

impl Default for FrameTransform {
    fn default() -> Self {
        Self {
            valid_from_jd: DEFAULT_VALID_FROM_JD,
            valid_until_jd: DEFAULT_VALID_UNTIL_JD,
        }
    }
}

impl FrameTransform {
    pub fn supports(&self, jd: f64) -> bool {
        jd.is_finite() && jd >= self.valid_from_jd && jd <= self.valid_until_jd
    }

    /// Rotation taking inertial coordinates to planet-fixed coordinates
    pub fn inertial_to_fixed(&self, jd: f64) -> Result<Rotation3<f64>> {
        if !self.supports(jd) {
            return Err(EngineError::TransformUnavailable { julian_date: jd });
        }
        let theta = greenwich_mean_sidereal_angle(jd);
        Ok(Rotation3::from_axis_angle(&Vector3::z_axis(), -theta))
    }
}
