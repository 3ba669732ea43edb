use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use validator::Validate;

use crate::irradiance::{ClearSkyIrradianceProvider, FixedIrradianceProvider, IrradianceProvider};
use crate::scoring::{BandLabel, ClassificationBand, Classifier};
use crate::simulation::TilesetSimulatorConfig;
use crate::solar::FrameTransform;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Config {
    #[validate(nested)]
    pub session: SessionConfig,
    #[validate(nested)]
    pub irradiance: IrradianceConfig,
    #[validate(nested)]
    pub classification: ClassificationConfig,
    pub pipeline: PipelineConfig,
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub simulation: TilesetSimulatorConfig,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct SessionConfig {
    /// Fixed scoring instant; wall-clock now when absent
    pub timestamp: Option<DateTime<Utc>>,
    /// Supported epoch window for the frame transform, Julian dates
    #[validate(range(min = 0.0))]
    pub valid_from_jd: f64,
    #[validate(range(min = 0.0))]
    pub valid_until_jd: f64,
    /// Capacity of the tileset event channel
    #[validate(range(min = 1))]
    pub event_buffer: usize,
    /// Recompute the session context on this period; manual refresh only when absent
    #[validate(range(min = 1))]
    pub refresh_interval_secs: Option<u64>,
}

impl SessionConfig {
    pub fn frames(&self) -> FrameTransform {
        FrameTransform {
            valid_from_jd: self.valid_from_jd,
            valid_until_jd: self.valid_until_jd,
        }
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.timestamp.unwrap_or_else(Utc::now)
    }

    pub fn refresh_interval(&self) -> Option<Duration> {
        self.refresh_interval_secs.map(Duration::from_secs)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IrradianceSource {
    Fixed,
    ClearSky,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct IrradianceConfig {
    pub provider: IrradianceSource,
    /// GHI for the fixed provider, W/m²
    #[validate(range(min = 0.0))]
    pub ghi_wm2: f64,
    /// Reference site of the clear-sky provider
    #[validate(range(min = -90.0, max = 90.0))]
    pub site_latitude_deg: f64,
    #[validate(range(min = -180.0, max = 180.0))]
    pub site_longitude_deg: f64,
}

impl IrradianceConfig {
    pub fn provider(&self) -> Box<dyn IrradianceProvider> {
        match self.provider {
            IrradianceSource::Fixed => Box::new(FixedIrradianceProvider::new(self.ghi_wm2)),
            IrradianceSource::ClearSky => Box::new(ClearSkyIrradianceProvider::new(
                self.site_latitude_deg,
                self.site_longitude_deg,
            )),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct ClassificationConfig {
    pub high_threshold: f64,
    pub medium_threshold: f64,
    #[validate(length(min = 1))]
    pub high_color: String,
    #[validate(length(min = 1))]
    pub medium_color: String,
    #[validate(length(min = 1))]
    pub low_color: String,
}

impl ClassificationConfig {
    pub fn classifier(&self) -> Result<Classifier> {
        Ok(Classifier::new(vec![
            ClassificationBand::at_least(BandLabel::High, self.high_threshold, &self.high_color),
            ClassificationBand::at_least(
                BandLabel::Medium,
                self.medium_threshold,
                &self.medium_color,
            ),
            ClassificationBand::catch_all(BandLabel::Low, &self.low_color),
        ])?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// Skip features already scored under the current context
    pub dedup_features: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Emit JSON log lines instead of human readable ones
    pub json: bool,
    /// Default filter when RUST_LOG is not set
    pub filter: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(DEFAULT_CONFIG_PATH)
    }

    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("BIPV__").split("__"));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        let cfg: Config = figment.extract().context("invalid configuration")?;
        cfg.validate().context("configuration out of range")?;
        if cfg.session.valid_from_jd >= cfg.session.valid_until_jd {
            anyhow::bail!("session.valid_from_jd must be before session.valid_until_jd");
        }
        Ok(cfg)
    }
}
