use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::{IrradianceInput, SunPosition};
use crate::error::{EngineError, Result};
use crate::irradiance::IrradianceProvider;
use crate::solar::SolarPositionModel;

/// Sun and irradiance shared by every feature scored in one pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoringContext {
    pub timestamp: DateTime<Utc>,
    pub sun: SunPosition,
    pub irradiance: IrradianceInput,
}

/// Session-scoped scoring state, refreshed explicitly
pub struct ScoringSession {
    model: SolarPositionModel,
    provider: Box<dyn IrradianceProvider>,
    active: Option<ScoringContext>,
    refreshes: u64,
}

impl ScoringSession {
    pub fn new(model: SolarPositionModel, provider: Box<dyn IrradianceProvider>) -> Self {
        Self {
            model,
            provider,
            active: None,
            refreshes: 0,
        }
    }

    /// Recompute sun position and irradiance for `timestamp`
    ///
    /// On failure the previous context is dropped, so nothing is scored
    /// against a stale instant.
    pub async fn refresh(&mut self, timestamp: DateTime<Utc>) -> Result<ScoringContext> {
        self.active = None;

        let sun = self.model.compute_sun_position(timestamp).map_err(|e| {
            warn!(error = %e, %timestamp, "sun position unavailable, scoring suspended");
            e
        })?;

        let irradiance = self
            .provider
            .irradiance_at(timestamp)
            .await
            .map_err(|e| match e.downcast::<EngineError>() {
                Ok(engine) => engine,
                Err(other) => EngineError::IrradianceUnavailable(other.to_string()),
            })
            .map_err(|e| {
                warn!(error = %e, provider = self.provider.name(), "irradiance rejected");
                e
            })?;

        let context = ScoringContext {
            timestamp,
            sun,
            irradiance,
        };
        self.active = Some(context);
        self.refreshes += 1;

        info!(
            %timestamp,
            azimuth_deg = sun.azimuth_deg,
            elevation_deg = sun.elevation_deg,
            ghi_wm2 = irradiance.ghi_wm2(),
            provider = self.provider.name(),
            "scoring pass prepared"
        );

        Ok(context)
    }

    pub fn active(&self) -> Option<&ScoringContext> {
        self.active.as_ref()
    }

    /// Number of successful refreshes
    pub fn refreshes(&self) -> u64 {
        self.refreshes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::irradiance::{FixedIrradianceProvider, MockIrradianceProvider};
    use chrono::TimeZone;

    fn noon() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 21, 12, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_refresh_sets_context() {
        let mut session = ScoringSession::new(
            SolarPositionModel::default(),
            Box::new(FixedIrradianceProvider::new(1000.0)),
        );
        assert!(session.active().is_none());

        let ctx = session.refresh(noon()).await.unwrap();
        assert_eq!(session.active(), Some(&ctx));
        assert_eq!(ctx.irradiance.ghi_wm2(), 1000.0);
        assert_eq!(session.refreshes(), 1);
    }

    #[tokio::test]
    async fn test_failed_transform_clears_context() {
        let mut session = ScoringSession::new(
            SolarPositionModel::default(),
            Box::new(FixedIrradianceProvider::new(1000.0)),
        );
        session.refresh(noon()).await.unwrap();

        let far = Utc.with_ymd_and_hms(2300, 1, 1, 0, 0, 0).unwrap();
        let err = session.refresh(far).await.unwrap_err();
        assert!(matches!(err, EngineError::TransformUnavailable { .. }));
        assert!(session.active().is_none());
        assert_eq!(session.refreshes(), 1);
    }

    #[tokio::test]
    async fn test_provider_failure_is_mapped() {
        let mut provider = MockIrradianceProvider::new();
        provider
            .expect_irradiance_at()
            .returning(|_| Err(anyhow::anyhow!("weather feed down")));
        provider.expect_name().return_const("mock");

        let mut session = ScoringSession::new(SolarPositionModel::default(), Box::new(provider));
        let err = session.refresh(noon()).await.unwrap_err();
        assert_eq!(
            err,
            EngineError::IrradianceUnavailable("weather feed down".into())
        );
    }

    #[tokio::test]
    async fn test_negative_irradiance_rejected_at_boundary() {
        let mut session = ScoringSession::new(
            SolarPositionModel::default(),
            Box::new(FixedIrradianceProvider::new(-20.0)),
        );
        let err = session.refresh(noon()).await.unwrap_err();
        assert_eq!(err, EngineError::InvalidIrradianceInput(-20.0));
        assert!(session.active().is_none());
    }
}
