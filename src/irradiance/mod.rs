//! Irradiance providers
//!
//! The scoring session asks a provider for the irradiance valid at the
//! session instant. Providers are pluggable so a weather source can replace
//! the fixed placeholder without touching the scorer.

pub mod clear_sky;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::IrradianceInput;

pub use clear_sky::ClearSkyIrradianceProvider;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IrradianceProvider: Send + Sync {
    async fn irradiance_at(&self, timestamp: DateTime<Utc>) -> Result<IrradianceInput>;
    fn name(&self) -> &'static str;
}

/// Constant GHI, used until a weather source is wired in
#[derive(Debug, Clone, Copy)]
pub struct FixedIrradianceProvider {
    pub ghi_wm2: f64,
}

impl FixedIrradianceProvider {
    pub fn new(ghi_wm2: f64) -> Self {
        Self { ghi_wm2 }
    }
}

impl Default for FixedIrradianceProvider {
    fn default() -> Self {
        Self { ghi_wm2: 1000.0 }
    }
}

#[async_trait]
impl IrradianceProvider for FixedIrradianceProvider {
    async fn irradiance_at(&self, timestamp: DateTime<Utc>) -> Result<IrradianceInput> {
        Ok(IrradianceInput::at(timestamp, self.ghi_wm2)?)
    }

    fn name(&self) -> &'static str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_fixed_provider() {
        let t = Utc.with_ymd_and_hms(2024, 6, 21, 10, 30, 0).unwrap();
        let input = FixedIrradianceProvider::new(850.0)
            .irradiance_at(t)
            .await
            .unwrap();
        assert_eq!(input.ghi_wm2(), 850.0);
        assert_eq!(input.date(), t.date_naive());
        assert_eq!(input.time_of_day(), t.time());
    }

    #[tokio::test]
    async fn test_fixed_provider_rejects_negative() {
        let t = Utc.with_ymd_and_hms(2024, 6, 21, 10, 30, 0).unwrap();
        let err = FixedIrradianceProvider::new(-3.0)
            .irradiance_at(t)
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<EngineError>(),
            Some(&EngineError::InvalidIrradianceInput(-3.0))
        );
    }
}
