//! Balancer error types.

use thiserror::Error;

/// Errors that can occur while building a distribution map.
///
/// None of these are retried: a map that differs between processes is worse
/// than no map at all, so callers are expected to abort.
#[derive(Debug, Error)]
pub enum BalanceError {
    #[error("cannot distribute units over zero processes")]
    NoProcesses,

    #[error("distribution map covers {actual} units, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("unit {unit} assigned to process {owner}, but only {nprocs} processes exist")]
    OwnerOutOfRange {
        unit: usize,
        owner: usize,
        nprocs: usize,
    },

    #[error("weight of a process exceeds u64 while balancing {units} units over {nprocs} processes")]
    WeightOverflow { units: usize, nprocs: usize },

    #[error(
        "knapsack balancing of {units} units over {nprocs} processes requires the `knapsack` feature"
    )]
    KnapsackUnavailable { units: usize, nprocs: usize },

    #[error("configuration error: {0}")]
    Config(#[from] distmap_core::ConfigError),
}

pub type BalanceResult<T> = Result<T, BalanceError>;
