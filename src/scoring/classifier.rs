use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

use crate::error::{EngineError, Result};

pub const DEFAULT_HIGH_THRESHOLD: f64 = 100.0;
pub const DEFAULT_MEDIUM_THRESHOLD: f64 = 50.0;

/// Potential band label
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum BandLabel {
    High,
    Medium,
    Low,
}

impl BandLabel {
    pub fn default_color(&self) -> &'static str {
        match self {
            BandLabel::High => "green",
            BandLabel::Medium => "yellow",
            BandLabel::Low => "red",
        }
    }
}

/// One band; `threshold: None` marks the catch-all
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationBand {
    pub label: BandLabel,
    pub threshold: Option<f64>,
    pub color: String,
}

impl ClassificationBand {
    pub fn at_least(label: BandLabel, threshold: f64, color: impl Into<String>) -> Self {
        Self {
            label,
            threshold: Some(threshold),
            color: color.into(),
        }
    }

    pub fn catch_all(label: BandLabel, color: impl Into<String>) -> Self {
        Self {
            label,
            threshold: None,
            color: color.into(),
        }
    }

    fn admits(&self, potential: f64) -> bool {
        match self.threshold {
            Some(t) => potential >= t,
            None => true,
        }
    }
}

/// Ordered bands evaluated top-down, first match wins
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Classifier {
    bands: Vec<ClassificationBand>,
}

impl Classifier {
    /// Bands must be ordered by strictly decreasing finite threshold and end
    /// with exactly one catch-all.
    pub fn new(bands: Vec<ClassificationBand>) -> Result<Self> {
        let Some((last, ranked)) = bands.split_last() else {
            return Err(EngineError::InvalidClassification("no bands".into()));
        };
        if last.threshold.is_some() {
            return Err(EngineError::InvalidClassification(
                "last band must be a catch-all".into(),
            ));
        }

        let mut previous = f64::INFINITY;
        for band in ranked {
            let t = band.threshold.ok_or_else(|| {
                EngineError::InvalidClassification(format!(
                    "catch-all band '{}' must be last",
                    band.label
                ))
            })?;
            if !t.is_finite() {
                return Err(EngineError::InvalidClassification(format!(
                    "band '{}' has non-finite threshold",
                    band.label
                )));
            }
            if t >= previous {
                return Err(EngineError::InvalidClassification(format!(
                    "band '{}' threshold {} is not below {}",
                    band.label, t, previous
                )));
            }
            previous = t;
        }

        Ok(Self { bands })
    }

    /// high ≥ `high`, medium ≥ `medium`, low otherwise, with default colors
    pub fn with_thresholds(high: f64, medium: f64) -> Result<Self> {
        Self::new(vec![
            ClassificationBand::at_least(BandLabel::High, high, BandLabel::High.default_color()),
            ClassificationBand::at_least(
                BandLabel::Medium,
                medium,
                BandLabel::Medium.default_color(),
            ),
            ClassificationBand::catch_all(BandLabel::Low, BandLabel::Low.default_color()),
        ])
    }

    /// Total over f64: NaN fails every threshold and lands in the catch-all
    pub fn classify(&self, potential: f64) -> &ClassificationBand {
        self.bands
            .iter()
            .find(|band| band.admits(potential))
            .unwrap_or_else(|| &self.bands[self.bands.len() - 1])
    }

    pub fn bands(&self) -> &[ClassificationBand] {
        &self.bands
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self {
            bands: vec![
                ClassificationBand::at_least(BandLabel::High, DEFAULT_HIGH_THRESHOLD, "green"),
                ClassificationBand::at_least(BandLabel::Medium, DEFAULT_MEDIUM_THRESHOLD, "yellow"),
                ClassificationBand::catch_all(BandLabel::Low, "red"),
            ],
        }
    }
}
