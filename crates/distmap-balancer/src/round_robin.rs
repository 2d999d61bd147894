//! Round-robin assignment.
//!
//! Unit `i` goes to process `i mod nprocs`. Weights are ignored. This is
//! also the fallback the knapsack strategy uses when there are too few
//! units (or processes) for weighting to matter.

use distmap_core::DistributionMap;

use crate::error::{BalanceError, BalanceResult};

/// Build a round-robin map of `nunits` units over `nprocs` processes,
/// stamped with the caller's `rank`.
pub fn round_robin(nunits: usize, nprocs: usize, rank: usize) -> BalanceResult<DistributionMap> {
    if nprocs == 0 {
        return Err(BalanceError::NoProcesses);
    }
    let owners = (0..nunits).map(|unit| unit % nprocs).collect();
    Ok(DistributionMap::new(owners, rank))
}
