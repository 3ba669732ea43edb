use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{EngineError, Result};

/// Stable identifier of a building record (OSM element id for OSM buildings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub u64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sun direction for one scoring pass
///
/// `azimuth_deg` is the sub-solar longitude normalized to [0, 360) and
/// `elevation_deg` the sub-solar latitude in [-90, 90], both taken in the
/// planet-fixed frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SunPosition {
    pub azimuth_deg: f64,
    pub elevation_deg: f64,
}

impl SunPosition {
    /// Build from raw angles, wrapping azimuth and clamping elevation
    pub fn new(azimuth_deg: f64, elevation_deg: f64) -> Self {
        Self {
            azimuth_deg: normalize_degrees(azimuth_deg),
            elevation_deg: elevation_deg.clamp(-90.0, 90.0),
        }
    }

    /// Angle of the sun from straight overhead in degrees
    pub fn zenith_angle_deg(&self) -> f64 {
        90.0 - self.elevation_deg
    }

    pub fn is_above_horizon(&self) -> bool {
        self.elevation_deg > 0.0
    }
}

/// Wrap an angle into [0, 360)
pub fn normalize_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Caller supplied irradiance for a scoring session
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct IrradianceInput {
    date: NaiveDate,
    time_of_day: NaiveTime,
    global_horizontal_irradiance: f64,
}

impl IrradianceInput {
    /// Validated constructor; negative or non-finite GHI is rejected
    pub fn new(date: NaiveDate, time_of_day: NaiveTime, ghi_wm2: f64) -> Result<Self> {
        if !ghi_wm2.is_finite() || ghi_wm2 < 0.0 {
            return Err(EngineError::InvalidIrradianceInput(ghi_wm2));
        }
        Ok(Self {
            date,
            time_of_day,
            global_horizontal_irradiance: ghi_wm2,
        })
    }

    /// Irradiance valid at a given UTC instant
    pub fn at(timestamp: DateTime<Utc>, ghi_wm2: f64) -> Result<Self> {
        Self::new(timestamp.date_naive(), timestamp.time(), ghi_wm2)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn time_of_day(&self) -> NaiveTime {
        self.time_of_day
    }

    /// Global horizontal irradiance in W/m²
    pub fn ghi_wm2(&self) -> f64 {
        self.global_horizontal_irradiance
    }
}

/// Geometry attributes read from a feature before scoring
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureGeometry {
    pub id: Option<FeatureId>,
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
}

/// Potential computed for one feature in one scoring pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PotentialScore {
    pub feature_id: Option<FeatureId>,
    pub longitude: f64,
    pub latitude: f64,
    pub height: f64,
    /// Incident irradiance proxy in W/m², negative when the sun is below the horizon
    pub value: f64,
}
