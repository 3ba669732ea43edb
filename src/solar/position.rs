use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use tracing::debug;

use super::ephemeris::{julian_date, sun_inertial_position};
use super::frames::FrameTransform;
use crate::domain::{normalize_degrees, SunPosition};
use crate::error::{EngineError, Result};

/// Sun direction model over the rotating planet
///
/// The sun vector is computed in the inertial frame, rotated into the fixed
/// frame and reduced to the longitude/latitude of the sub-solar point.
#[derive(Debug, Clone, Copy, Default)]
pub struct SolarPositionModel {
    frames: FrameTransform,
}

impl SolarPositionModel {
    pub fn new(frames: FrameTransform) -> Self {
        Self { frames }
    }

    pub fn frames(&self) -> &FrameTransform {
        &self.frames
    }

    /// Sun position at `timestamp`, or `TransformUnavailable`
    pub fn compute_sun_position(&self, timestamp: DateTime<Utc>) -> Result<SunPosition> {
        let jd = julian_date(timestamp);
        let fixed = self.sun_fixed_position(jd)?;

        let (longitude_deg, latitude_deg) = cartesian_to_lon_lat(&fixed)
            .ok_or(EngineError::TransformUnavailable { julian_date: jd })?;

        debug!(
            julian_date = jd,
            longitude_deg, latitude_deg, "sub-solar point computed"
        );

        Ok(SunPosition {
            azimuth_deg: normalize_degrees(longitude_deg),
            elevation_deg: latitude_deg,
        })
    }

    /// Sun position vector in the planet-fixed frame, meters
    pub fn sun_fixed_position(&self, jd: f64) -> Result<Vector3<f64>> {
        let rotation = self.frames.inertial_to_fixed(jd)?;
        Ok(rotation * sun_inertial_position(jd))
    }
}

/// Longitude and latitude in degrees of the direction of `v`
///
/// For a point at solar distance the surface normal through it is parallel to
/// its direction, so the geodetic latitude reduces to the direction latitude.
fn cartesian_to_lon_lat(v: &Vector3<f64>) -> Option<(f64, f64)> {
    if !v.iter().all(|c| c.is_finite()) || v.norm() == 0.0 {
        return None;
    }
    let longitude = v.y.atan2(v.x).to_degrees();
    let latitude = v.z.atan2(v.x.hypot(v.y)).to_degrees();
    Some((longitude, latitude))
}
