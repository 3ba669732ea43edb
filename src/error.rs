use thiserror::Error;

use crate::domain::FeatureId;

pub type Result<T, E = EngineError> = std::result::Result<T, E>;

/// Errors raised by the scoring engine
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    /// Inertial to planet-fixed rotation could not be derived for the epoch
    #[error("Frame transform unavailable for julian date {julian_date}")]
    TransformUnavailable { julian_date: f64 },

    #[error("Feature {feature} is missing attributes: {}", .missing.join(", "))]
    MissingFeatureAttributes {
        feature: FeatureLabel,
        missing: Vec<&'static str>,
    },

    #[error("Feature {feature} has invalid {attribute}: {value}")]
    InvalidFeatureAttribute {
        feature: FeatureLabel,
        attribute: &'static str,
        value: f64,
    },

    #[error("Invalid irradiance input: {0} (must be finite and >= 0)")]
    InvalidIrradianceInput(f64),

    #[error("Irradiance provider failed: {0}")]
    IrradianceUnavailable(String),

    #[error("Invalid classification bands: {0}")]
    InvalidClassification(String),

    #[error("No active scoring context (session not refreshed)")]
    NoActiveContext,
}

impl EngineError {
    /// Per-feature errors are contained within a tile callback
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            EngineError::MissingFeatureAttributes { .. }
                | EngineError::InvalidFeatureAttribute { .. }
        )
    }
}

/// Identifies a feature in error messages, even when it carries no stable id
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureLabel {
    Id(FeatureId),
    Index(usize),
}

impl std::fmt::Display for FeatureLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureLabel::Id(id) => write!(f, "{}", id),
            FeatureLabel::Index(i) => write!(f, "#{}", i),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_split() {
        let missing = EngineError::MissingFeatureAttributes {
            feature: FeatureLabel::Index(2),
            missing: vec!["height"],
        };
        assert!(missing.is_recoverable());
        assert!(!EngineError::TransformUnavailable { julian_date: 0.0 }.is_recoverable());
        assert!(!EngineError::InvalidIrradianceInput(-1.0).is_recoverable());
    }

    #[test]
    fn test_error_display() {
        let error = EngineError::MissingFeatureAttributes {
            feature: FeatureLabel::Id(FeatureId(42)),
            missing: vec!["latitude", "height"],
        };
        assert_eq!(
            error.to_string(),
            "Feature 42 is missing attributes: latitude, height"
        );
        assert_eq!(
            EngineError::InvalidIrradianceInput(-5.0).to_string(),
            "Invalid irradiance input: -5 (must be finite and >= 0)"
        );
    }
}
