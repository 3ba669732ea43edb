//! # Clear-Sky Irradiance
//!
//! Global horizontal irradiance under a cloudless sky at a reference site,
//! from the local solar elevation and a simple air-mass attenuation.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::IrradianceProvider;
use crate::domain::IrradianceInput;
use crate::solar::{greenwich_mean_sidereal_angle, julian_date, SolarElements};

/// Energy at top of atmosphere, W/m²
pub const SOLAR_CONSTANT_WM2: f64 = 1367.0;

/// Clear-sky model for one site
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClearSkyIrradianceProvider {
    /// Latitude in degrees (positive = north)
    pub latitude_deg: f64,
    /// Longitude in degrees (positive = east)
    pub longitude_deg: f64,
    /// Clear-sky transmittance at air mass 1
    pub transmittance: f64,
}

impl ClearSkyIrradianceProvider {
    pub fn new(latitude_deg: f64, longitude_deg: f64) -> Self {
        Self {
            latitude_deg,
            longitude_deg,
            transmittance: 0.7,
        }
    }

    /// Local solar elevation above the horizon in degrees
    pub fn local_elevation_deg(&self, timestamp: DateTime<Utc>) -> f64 {
        let jd = julian_date(timestamp);
        let elements = SolarElements::at(jd);

        let declination = elements.declination_deg().to_radians();
        let latitude = self.latitude_deg.to_radians();
        let hour_angle = greenwich_mean_sidereal_angle(jd) + self.longitude_deg.to_radians()
            - elements.right_ascension_deg().to_radians();

        let elevation_sin = latitude.sin() * declination.sin()
            + latitude.cos() * declination.cos() * hour_angle.cos();
        elevation_sin.clamp(-1.0, 1.0).asin().to_degrees()
    }

    /// Clear-sky GHI in W/m², zero with the sun below the horizon
    pub fn clear_sky_ghi(&self, timestamp: DateTime<Utc>) -> f64 {
        let elevation_deg = self.local_elevation_deg(timestamp);
        if elevation_deg <= 0.0 {
            return 0.0;
        }

        let elevation_rad = elevation_deg.to_radians();

        // Relative path length through the atmosphere
        let air_mass = if elevation_deg > 5.0 {
            1.0 / elevation_rad.sin()
        } else {
            // Avoids the singularity at the horizon
            12.0 - elevation_deg / 5.0
        };

        let transmittance = self.transmittance.powf(air_mass.powf(0.678));
        SOLAR_CONSTANT_WM2 * transmittance * elevation_rad.sin()
    }
}

#[async_trait]
impl IrradianceProvider for ClearSkyIrradianceProvider {
    async fn irradiance_at(&self, timestamp: DateTime<Utc>) -> Result<IrradianceInput> {
        Ok(IrradianceInput::at(timestamp, self.clear_sky_ghi(timestamp))?)
    }

    fn name(&self) -> &'static str {
        "clear_sky"
    }
}
