//! Low-order solar ephemeris
//!
//! Geocentric sun position from the Astronomical Almanac low-precision
//! formulae (about 0.01° in ecliptic longitude between 1950 and 2050,
//! degrading slowly outside that window).

use chrono::{DateTime, Utc};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Julian date of the J2000.0 epoch (2000-01-01 12:00 TT)
pub const J2000_JD: f64 = 2_451_545.0;
/// Julian date of 1970-01-01 00:00 UTC
pub const UNIX_EPOCH_JD: f64 = 2_440_587.5;
pub const SECONDS_PER_DAY: f64 = 86_400.0;
pub const DAYS_PER_CENTURY: f64 = 36_525.0;
/// IAU 2012 astronomical unit in meters
pub const AU_METERS: f64 = 149_597_870_700.0;

/// Convert a UTC instant to a Julian date (UT1 taken as UTC)
pub fn julian_date(timestamp: DateTime<Utc>) -> f64 {
    let secs = timestamp.timestamp() as f64 + timestamp.timestamp_subsec_nanos() as f64 * 1e-9;
    UNIX_EPOCH_JD + secs / SECONDS_PER_DAY
}

/// Julian centuries since J2000.0
pub fn julian_centuries(jd: f64) -> f64 {
    (jd - J2000_JD) / DAYS_PER_CENTURY
}

/// Mean-of-date ecliptic elements of the sun
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SolarElements {
    /// Apparent ecliptic longitude in degrees
    pub ecliptic_longitude_deg: f64,
    /// Obliquity of the ecliptic in degrees
    pub obliquity_deg: f64,
    /// Earth-sun distance in AU
    pub distance_au: f64,
}

impl SolarElements {
    pub fn at(jd: f64) -> Self {
        let n = jd - J2000_JD;

        let mean_longitude = 280.460 + 0.985_647_4 * n;
        let mean_anomaly = (357.528 + 0.985_600_3 * n).to_radians();

        let ecliptic_longitude_deg = (mean_longitude
            + 1.915 * mean_anomaly.sin()
            + 0.020 * (2.0 * mean_anomaly).sin())
        .rem_euclid(360.0);
        let obliquity_deg = 23.439 - 0.000_000_4 * n;
        let distance_au =
            1.000_14 - 0.016_71 * mean_anomaly.cos() - 0.000_14 * (2.0 * mean_anomaly).cos();

        Self {
            ecliptic_longitude_deg,
            obliquity_deg,
            distance_au,
        }
    }

    /// Right ascension in degrees [0, 360)
    pub fn right_ascension_deg(&self) -> f64 {
        let lambda = self.ecliptic_longitude_deg.to_radians();
        let eps = self.obliquity_deg.to_radians();
        (eps.cos() * lambda.sin())
            .atan2(lambda.cos())
            .to_degrees()
            .rem_euclid(360.0)
    }

    /// Declination in degrees
    pub fn declination_deg(&self) -> f64 {
        let lambda = self.ecliptic_longitude_deg.to_radians();
        let eps = self.obliquity_deg.to_radians();
        (eps.sin() * lambda.sin()).asin().to_degrees()
    }
}

/// Sun position in the planet-centered inertial (equatorial) frame, meters
pub fn sun_inertial_position(jd: f64) -> Vector3<f64> {
    let elements = SolarElements::at(jd);
    let lambda = elements.ecliptic_longitude_deg.to_radians();
    let eps = elements.obliquity_deg.to_radians();
    let r = elements.distance_au * AU_METERS;

    Vector3::new(
        r * lambda.cos(),
        r * eps.cos() * lambda.sin(),
        r * eps.sin() * lambda.sin(),
    )
}
