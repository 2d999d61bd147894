//! distmap-core — shared types for distribution-map balancing.
//!
//! A [`DistributionMap`] assigns each work unit of a spatially decomposed
//! problem to the process that owns it. The map is computed independently
//! (and identically) on every process, so everything here is plain,
//! deterministic in-memory data.

pub mod config;
pub mod error;
pub mod types;

pub use config::BalancerConfig;
pub use error::{ConfigError, ConfigResult};
pub use types::*;
