//! BIPV potential scoring engine
//!
//! Computes the sun direction for an instant, scores building features as
//! their tiles become visible, and buckets the scores into styling bands.

pub mod config;
pub mod domain;
pub mod error;
pub mod irradiance;
pub mod pipeline;
pub mod scoring;
pub mod simulation;
pub mod solar;
pub mod telemetry;

pub use error::{EngineError, Result};
