use serde_json::Value;
use tracing::trace;

use crate::domain::{
    FeatureAttributeAccessor, FeatureGeometry, IrradianceInput, PotentialScore, SunPosition,
};

/// Key of the derived property the style layer reads
pub const POTENTIAL_PROPERTY: &str = "potential";

/// Combines sun geometry and irradiance into a per-feature potential
///
/// Stateless: scoring the same inputs twice yields the same bits.
#[derive(Debug, Clone, Copy, Default)]
pub struct PotentialScorer;

impl PotentialScorer {
    pub fn new() -> Self {
        Self
    }

    /// GHI × cos(zenith). Not clamped: a sun below the horizon gives a
    /// negative value.
    pub fn potential(sun: &SunPosition, irradiance: &IrradianceInput) -> f64 {
        let cos_zenith = sun.zenith_angle_deg().to_radians().cos();
        irradiance.ghi_wm2() * cos_zenith
    }

    /// Score without touching the feature
    pub fn score(
        &self,
        sun: &SunPosition,
        irradiance: &IrradianceInput,
        geometry: &FeatureGeometry,
    ) -> PotentialScore {
        PotentialScore {
            feature_id: geometry.id,
            longitude: geometry.longitude,
            latitude: geometry.latitude,
            height: geometry.height,
            value: Self::potential(sun, irradiance),
        }
    }

    /// Score and write the value onto the feature under [`POTENTIAL_PROPERTY`]
    pub fn score_feature(
        &self,
        sun: &SunPosition,
        irradiance: &IrradianceInput,
        geometry: &FeatureGeometry,
        feature: &mut dyn FeatureAttributeAccessor,
    ) -> PotentialScore {
        let score = self.score(sun, irradiance, geometry);
        feature.set_derived(POTENTIAL_PROPERTY, Value::from(score.value));
        trace!(feature_id = ?score.feature_id, potential = score.value, "potential attached");
        score
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FeatureId, PropertyFeature};
    use chrono::{NaiveDate, NaiveTime};
    use proptest::prelude::*;
    use rstest::rstest;

    fn irradiance(ghi: f64) -> IrradianceInput {
        IrradianceInput::new(
            NaiveDate::from_ymd_opt(2024, 6, 21).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
            ghi,
        )
        .unwrap()
    }

    fn geometry() -> FeatureGeometry {
        FeatureGeometry {
            id: Some(FeatureId(99)),
            longitude: -122.3472,
            latitude: 47.598,
            height: 30.0,
        }
    }

    #[test]
    fn test_zenith_sun_gives_full_irradiance() {
        let sun = SunPosition::new(0.0, 90.0);
        assert_eq!(PotentialScorer::potential(&sun, &irradiance(734.5)), 734.5);
    }

    #[test]
    fn test_horizon_sun_gives_zero() {
        let sun = SunPosition::new(0.0, 0.0);
        let p = PotentialScorer::potential(&sun, &irradiance(1000.0));
        assert!(p.abs() < 1e-9);
    }

    #[rstest]
    #[case(60.0, 866.025)]
    #[case(5.0, 87.156)]
    #[case(30.0, 500.0)]
    fn test_known_elevations(#[case] elevation: f64, #[case] expected: f64) {
        let sun = SunPosition::new(180.0, elevation);
        let p = PotentialScorer::potential(&sun, &irradiance(1000.0));
        assert!((p - expected).abs() < 1e-3, "{} vs {}", p, expected);
    }

    #[test]
    fn test_sub_horizon_is_negative_not_clamped() {
        let sun = SunPosition::new(0.0, -10.0);
        let p = PotentialScorer::potential(&sun, &irradiance(1000.0));
        assert!(p < 0.0);
        assert!((p + 173.648).abs() < 1e-3);
    }

    #[test]
    fn test_score_passes_geometry_through() {
        let score = PotentialScorer::new().score(
            &SunPosition::new(10.0, 60.0),
            &irradiance(1000.0),
            &geometry(),
        );
        assert_eq!(score.feature_id, Some(FeatureId(99)));
        assert_eq!(score.longitude, -122.3472);
        assert_eq!(score.latitude, 47.598);
        assert_eq!(score.height, 30.0);
    }

    #[test]
    fn test_score_feature_overwrites_slot() {
        let scorer = PotentialScorer::new();
        let mut feature = PropertyFeature::building(99, -122.3472, 47.598, 30.0);
        let sun = SunPosition::new(10.0, 60.0);

        let first = scorer.score_feature(&sun, &irradiance(1000.0), &geometry(), &mut feature);
        let second = scorer.score_feature(&sun, &irradiance(1000.0), &geometry(), &mut feature);

        assert_eq!(first.value.to_bits(), second.value.to_bits());
        assert_eq!(
            feature.derived(POTENTIAL_PROPERTY).and_then(|v| v.as_f64()),
            Some(second.value)
        );
    }

    proptest! {
        #[test]
        fn prop_score_is_idempotent(elevation in -90.0f64..=90.0, ghi in 0.0f64..2000.0) {
            let scorer = PotentialScorer::new();
            let sun = SunPosition::new(0.0, elevation);
            let input = irradiance(ghi);
            let a = scorer.score(&sun, &input, &geometry());
            let b = scorer.score(&sun, &input, &geometry());
            prop_assert_eq!(a.value.to_bits(), b.value.to_bits());
            prop_assert!(a.value.abs() <= ghi + 1e-9);
        }
    }
}
