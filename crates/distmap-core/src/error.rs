//! Configuration error types.

use thiserror::Error;

/// Result type alias for configuration handling.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors raised while reading balancer configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown balancing strategy: {0} (expected ROUNDROBIN or KNAPSACK)")]
    UnknownStrategy(String),

    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
}
