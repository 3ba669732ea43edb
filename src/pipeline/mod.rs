//! # Feature Extraction Pipeline
//!
//! Tile visibility events in, potentials attached to features out.

pub mod extraction;
pub mod service;
pub mod session;

pub use extraction::*;
pub use service::*;
pub use session::*;
