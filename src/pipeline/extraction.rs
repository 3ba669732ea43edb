use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use super::session::ScoringContext;
use crate::domain::{FeatureAttributeAccessor, FeatureGeometry, FeatureId, PotentialScore, TileContent};
use crate::error::{EngineError, FeatureLabel, Result};
use crate::scoring::{BandLabel, Classifier, PotentialScorer};

/// Read the geometry needed for scoring, refusing partial data
pub fn read_geometry(
    feature: &dyn FeatureAttributeAccessor,
    index: usize,
) -> Result<FeatureGeometry> {
    let id = feature.feature_id();
    let label = id.map(FeatureLabel::Id).unwrap_or(FeatureLabel::Index(index));

    let longitude = feature.longitude();
    let latitude = feature.latitude();
    let height = feature.height();

    let missing: Vec<&'static str> = [
        ("longitude", longitude.is_none()),
        ("latitude", latitude.is_none()),
        ("height", height.is_none()),
    ]
    .into_iter()
    .filter_map(|(name, absent)| absent.then_some(name))
    .collect();

    match (longitude, latitude, height) {
        (Some(longitude), Some(latitude), Some(height)) => {
            if height < 0.0 {
                return Err(EngineError::InvalidFeatureAttribute {
                    feature: label,
                    attribute: "height",
                    value: height,
                });
            }
            Ok(FeatureGeometry {
                id,
                longitude,
                latitude,
                height,
            })
        }
        _ => Err(EngineError::MissingFeatureAttributes {
            feature: label,
            missing,
        }),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoredFeature {
    pub score: PotentialScore,
    pub band: BandLabel,
}

/// Outcome of one tile-visible callback
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TileReport {
    pub tile_key: String,
    pub scores: Vec<ScoredFeature>,
    #[serde(skip)]
    pub skipped: Vec<EngineError>,
    pub deduplicated: usize,
    /// Why the whole tile went unscored, if it did
    #[serde(skip)]
    pub rejected: Option<EngineError>,
}

impl TileReport {
    pub fn rejected(tile_key: String, error: EngineError) -> Self {
        Self {
            tile_key,
            rejected: Some(error),
            ..Default::default()
        }
    }

    /// False when the tile was turned away before any feature was read
    pub fn is_scored(&self) -> bool {
        self.rejected.is_none()
    }
}

/// Running counters over the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PipelineStats {
    pub tiles_seen: u64,
    pub tiles_unscored: u64,
    pub features_scored: u64,
    pub features_skipped: u64,
    pub features_deduplicated: u64,
}

/// Forwards features of visible tiles to the scorer
///
/// Holds no feature registry unless dedup is enabled; repeated visibility of
/// a tile rescores its features against the same context.
pub struct FeatureExtractionPipeline {
    scorer: PotentialScorer,
    classifier: Classifier,
    context: Option<ScoringContext>,
    processed: Option<HashSet<FeatureId>>,
    stats: PipelineStats,
}

impl FeatureExtractionPipeline {
    pub fn new(scorer: PotentialScorer, classifier: Classifier) -> Self {
        Self {
            scorer,
            classifier,
            context: None,
            processed: None,
            stats: PipelineStats::default(),
        }
    }

    /// Skip features already scored under the current context. Only sound
    /// when the loader keeps feature objects alive across visibility changes.
    pub fn with_dedup(mut self) -> Self {
        self.processed = Some(HashSet::new());
        self
    }

    /// Install the context from a session refresh; `None` suspends scoring
    pub fn set_context(&mut self, context: Option<ScoringContext>) {
        self.context = context;
        self.clear_processed();
    }

    pub fn context(&self) -> Option<&ScoringContext> {
        self.context.as_ref()
    }

    /// The dataset was reloaded; previously scored ids are no longer valid
    pub fn dataset_reloaded(&mut self) {
        self.clear_processed();
    }

    fn clear_processed(&mut self) {
        if let Some(set) = self.processed.as_mut() {
            set.clear();
        }
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn stats(&self) -> &PipelineStats {
        &self.stats
    }

    /// Score every feature of a tile that just became visible
    ///
    /// Per-feature errors are logged and collected in the report. Only a
    /// missing context fails the whole call.
    pub fn on_tile_visible(&mut self, tile: &mut dyn TileContent) -> Result<TileReport> {
        self.stats.tiles_seen += 1;
        let tile_key = tile.tile_key();

        let Some(context) = self.context else {
            self.stats.tiles_unscored += 1;
            warn!(tile = %tile_key, "tile visible without an active scoring context");
            return Err(EngineError::NoActiveContext);
        };

        let mut report = TileReport {
            tile_key,
            ..Default::default()
        };

        for index in 0..tile.feature_count() {
            let Some(feature) = tile.get_feature(index) else {
                let e = EngineError::MissingFeatureAttributes {
                    feature: FeatureLabel::Index(index),
                    missing: vec!["longitude", "latitude", "height"],
                };
                warn!(tile = %report.tile_key, index, "feature not exposed by tile");
                self.stats.features_skipped += 1;
                report.skipped.push(e);
                continue;
            };

            let geometry = match read_geometry(feature, index) {
                Ok(g) => g,
                Err(e) => {
                    warn!(tile = %report.tile_key, error = %e, "feature skipped");
                    self.stats.features_skipped += 1;
                    report.skipped.push(e);
                    continue;
                }
            };

            if let (Some(processed), Some(id)) = (self.processed.as_mut(), geometry.id) {
                if !processed.insert(id) {
                    self.stats.features_deduplicated += 1;
                    report.deduplicated += 1;
                    continue;
                }
            }

            let score = self.scorer.score_feature(
                &context.sun,
                &context.irradiance,
                &geometry,
                feature,
            );
            let band = self.classifier.classify(score.value).label;
            debug!(feature_id = ?score.feature_id, potential = score.value, %band, "feature scored");

            self.stats.features_scored += 1;
            report.scores.push(ScoredFeature { score, band });
        }

        info!(
            tile = %report.tile_key,
            scored = report.scores.len(),
            skipped = report.skipped.len(),
            deduplicated = report.deduplicated,
            "tile processed"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{
        InMemoryTile, IrradianceInput, PropertyFeature, SunPosition, HEIGHT_PROPERTY,
        LATITUDE_PROPERTY, LONGITUDE_PROPERTY,
    };
    use crate::scoring::POTENTIAL_PROPERTY;
    use chrono::{TimeZone, Utc};

    fn context(elevation: f64, ghi: f64) -> ScoringContext {
        let timestamp = Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap();
        ScoringContext {
            timestamp,
            sun: SunPosition::new(0.0, elevation),
            irradiance: IrradianceInput::at(timestamp, ghi).unwrap(),
        }
    }

    fn pipeline(elevation: f64) -> FeatureExtractionPipeline {
        let mut p = FeatureExtractionPipeline::new(PotentialScorer::new(), Classifier::default());
        p.set_context(Some(context(elevation, 1000.0)));
        p
    }

    fn tile() -> InMemoryTile {
        InMemoryTile::new(
            "12/655/1430",
            vec![
                PropertyFeature::building(1, -122.35, 47.60, 20.0),
                PropertyFeature::building(2, -122.34, 47.61, 35.0),
                PropertyFeature::building(3, -122.33, 47.62, 8.0),
            ],
        )
    }

    #[test]
    fn test_read_geometry_lists_missing() {
        let f = PropertyFeature::building(5, 1.0, 2.0, 3.0)
            .without_property(LATITUDE_PROPERTY)
            .without_property(HEIGHT_PROPERTY);
        match read_geometry(&f, 0) {
            Err(EngineError::MissingFeatureAttributes { feature, missing }) => {
                assert_eq!(feature, FeatureLabel::Id(FeatureId(5)));
                assert_eq!(missing, vec!["latitude", "height"]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_read_geometry_negative_height() {
        let f = PropertyFeature::building(5, 1.0, 2.0, -4.0);
        assert!(matches!(
            read_geometry(&f, 0),
            Err(EngineError::InvalidFeatureAttribute { attribute: "height", .. })
        ));
    }

    #[test]
    fn test_scores_every_feature_in_order() {
        let mut p = pipeline(60.0);
        let mut t = tile();
        let report = p.on_tile_visible(&mut t).unwrap();

        let ids: Vec<_> = report.scores.iter().map(|s| s.score.feature_id).collect();
        assert_eq!(ids, vec![Some(FeatureId(1)), Some(FeatureId(2)), Some(FeatureId(3))]);
        assert!(report.scores.iter().all(|s| s.band == BandLabel::High));
        assert!(t
            .features()
            .iter()
            .all(|f| f.derived(POTENTIAL_PROPERTY).is_some()));
    }

    #[test]
    fn test_missing_attribute_does_not_halt() {
        let mut p = pipeline(60.0);
        let mut t = InMemoryTile::new(
            "k",
            vec![
                PropertyFeature::building(1, 0.0, 0.0, 10.0),
                PropertyFeature::building(2, 0.0, 0.0, 10.0).without_property(LONGITUDE_PROPERTY),
                PropertyFeature::building(3, 0.0, 0.0, 10.0),
            ],
        );
        let report = p.on_tile_visible(&mut t).unwrap();
        assert_eq!(report.scores.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].is_recoverable());
        assert_eq!(t.features()[1].derived(POTENTIAL_PROPERTY), None);
        assert_eq!(p.stats().features_skipped, 1);
    }

    /// Reports features it cannot hand out
    struct HollowTile;

    impl TileContent for HollowTile {
        fn tile_key(&self) -> String {
            "hollow".into()
        }

        fn feature_count(&self) -> usize {
            3
        }

        fn get_feature(&mut self, _index: usize) -> Option<&mut dyn FeatureAttributeAccessor> {
            None
        }
    }

    #[test]
    fn test_unavailable_features_are_counted() {
        let mut p = pipeline(60.0);
        let report = p.on_tile_visible(&mut HollowTile).unwrap();

        assert!(report.is_scored());
        assert!(report.scores.is_empty());
        assert_eq!(report.skipped.len(), 3);
        assert!(matches!(
            &report.skipped[2],
            EngineError::MissingFeatureAttributes { feature: FeatureLabel::Index(2), .. }
        ));
        assert_eq!(p.stats().features_skipped, 3);
    }

    #[test]
    fn test_no_context_rejects_tile() {
        let mut p = FeatureExtractionPipeline::new(PotentialScorer::new(), Classifier::default());
        let mut t = tile();
        assert_eq!(p.on_tile_visible(&mut t), Err(EngineError::NoActiveContext));
        assert_eq!(p.stats().tiles_unscored, 1);
        assert!(t.features().iter().all(|f| f.derived(POTENTIAL_PROPERTY).is_none()));
    }

    #[test]
    fn test_revisit_rescores_identically() {
        let mut p = pipeline(5.0);
        let mut t = tile();
        let first = p.on_tile_visible(&mut t).unwrap();
        let second = p.on_tile_visible(&mut t).unwrap();

        assert_eq!(first.scores, second.scores);
        assert_eq!(first.scores[0].band, BandLabel::Medium);
        assert_eq!(p.stats().features_scored, 6);
    }

    #[test]
    fn test_dedup_skips_until_refresh() {
        let mut p = pipeline(60.0).with_dedup();
        let mut t = tile();

        assert_eq!(p.on_tile_visible(&mut t).unwrap().scores.len(), 3);
        let again = p.on_tile_visible(&mut t).unwrap();
        assert_eq!(again.scores.len(), 0);
        assert_eq!(again.deduplicated, 3);

        p.dataset_reloaded();
        assert_eq!(p.on_tile_visible(&mut t).unwrap().scores.len(), 3);

        p.set_context(Some(context(30.0, 1000.0)));
        let rescored = p.on_tile_visible(&mut t).unwrap();
        assert_eq!(rescored.scores.len(), 3);
        assert!((rescored.scores[0].score.value - 500.0).abs() < 1e-9);
    }
}
