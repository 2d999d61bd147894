//! Knapsack assignment — weighted greedy packing with local refinement.
//!
//! Balancing runs in two phases:
//!
//! 1. **Greedy seed.** Units are taken heaviest first (ties by ascending
//!    id) and each is dropped into the currently lightest bucket (ties by
//!    ascending bucket index). This is longest-processing-time-first
//!    packing.
//!
//! 2. **Refinement.** Buckets are kept sorted heaviest first. For every unit
//!    `u` in the heaviest bucket and every unit `v` in any other bucket, the
//!    pair is exchanged if both buckets end up strictly lighter than the
//!    heaviest bucket was. After each exchange the buckets are re-sorted and
//!    the scan restarts. The loop stops when a full scan finds nothing, or
//!    when `max_refine_iterations` exchanges have been made.
//!
//! Processes are numbered by the final heaviest-first bucket order, so
//! process 0 owns the heaviest bucket.
//!
//! Everything here is deterministic: identical weights and process counts
//! produce identical maps on every process.

use std::fmt;

use distmap_core::{DistributionMap, WeightedUnit, config::DEFAULT_MAX_REFINE_ITERATIONS};
#[cfg(feature = "knapsack")]
use tracing::{debug, warn};

use crate::error::{BalanceError, BalanceResult};
use crate::round_robin::round_robin;

/// Tunables for the knapsack strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnapsackOptions {
    /// Maximum number of accepted exchanges during refinement. Reaching it
    /// keeps the current assignment.
    pub max_refine_iterations: usize,
}

impl Default for KnapsackOptions {
    fn default() -> Self {
        Self {
            max_refine_iterations: DEFAULT_MAX_REFINE_ITERATIONS,
        }
    }
}

/// Statistics from one weighted knapsack run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KnapsackReport {
    /// Heaviest bucket after the greedy seed.
    pub seed_max: u64,
    /// Heaviest bucket after refinement.
    pub final_max: u64,
    /// Sum of all unit weights. Wider than a unit weight: only per-process
    /// totals have to fit in `u64`.
    pub total: u128,
    /// Accepted exchanges.
    pub swaps: usize,
    /// Refinement stopped at the iteration cap with improving exchanges left.
    pub capped: bool,
}

impl KnapsackReport {
    /// `total / (nprocs * final_max)`; 1.0 is a perfect balance.
    pub fn efficiency(&self, nprocs: usize) -> f64 {
        if self.final_max == 0 || nprocs == 0 {
            return 1.0;
        }
        self.total as f64 / (nprocs as f64 * self.final_max as f64)
    }
}

impl fmt::Display for KnapsackReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "seed_max={} final_max={} total={} swaps={}{}",
            self.seed_max,
            self.final_max,
            self.total,
            self.swaps,
            if self.capped { " (capped)" } else { "" }
        )
    }
}

/// Result of [`knapsack`]. `report` is `None` when the round-robin
/// fallback was taken.
#[derive(Debug, Clone, PartialEq)]
pub struct KnapsackOutcome {
    pub map: DistributionMap,
    pub report: Option<KnapsackReport>,
}

/// Units assigned to one process, with their running total weight.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bucket {
    units: Vec<WeightedUnit>,
    total: u64,
}

impl Bucket {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, unit: WeightedUnit) {
        self.total += unit.weight;
        self.units.push(unit);
    }

    /// Remove the unit at `index`, keeping the order of the rest.
    pub fn remove(&mut self, index: usize) -> WeightedUnit {
        let unit = self.units.remove(index);
        self.total -= unit.weight;
        unit
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn units(&self) -> &[WeightedUnit] {
        &self.units
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

/// Assign `weights.len()` units to `nprocs` processes.
///
/// With no more units than processes, or fewer than two processes, weights
/// are irrelevant and the round-robin map is returned.
pub fn knapsack(
    weights: &[u64],
    nprocs: usize,
    rank: usize,
    options: &KnapsackOptions,
) -> BalanceResult<KnapsackOutcome> {
    if nprocs == 0 {
        return Err(BalanceError::NoProcesses);
    }
    if weights.len() <= nprocs || nprocs < 2 {
        return Ok(KnapsackOutcome {
            map: round_robin(weights.len(), nprocs, rank)?,
            report: None,
        });
    }
    partition(weights, nprocs, rank, options)
}

#[cfg(feature = "knapsack")]
fn partition(
    weights: &[u64],
    nprocs: usize,
    rank: usize,
    options: &KnapsackOptions,
) -> BalanceResult<KnapsackOutcome> {
    let units = WeightedUnit::from_weights(weights);
    let mut buckets = greedy_seed(&units, nprocs)?;
    let seed_max = heaviest(&buckets);

    let (swaps, capped) = refine(&mut buckets, options.max_refine_iterations);

    let mut owners = vec![0usize; units.len()];
    for (process, bucket) in buckets.iter().enumerate() {
        for unit in bucket.units() {
            owners[unit.id] = process;
        }
    }

    let report = KnapsackReport {
        seed_max,
        final_max: heaviest(&buckets),
        total: weights.iter().map(|&w| u128::from(w)).sum(),
        swaps,
        capped,
    };
    debug!(
        units = units.len(),
        nprocs,
        seed_max = report.seed_max,
        final_max = report.final_max,
        swaps = report.swaps,
        efficiency = report.efficiency(nprocs),
        "knapsack balanced"
    );

    Ok(KnapsackOutcome {
        map: DistributionMap::new(owners, rank),
        report: Some(report),
    })
}

#[cfg(not(feature = "knapsack"))]
fn partition(
    weights: &[u64],
    nprocs: usize,
    _rank: usize,
    _options: &KnapsackOptions,
) -> BalanceResult<KnapsackOutcome> {
    Err(BalanceError::KnapsackUnavailable {
        units: weights.len(),
        nprocs,
    })
}

/// Longest-processing-time-first packing of `units` into `nprocs` buckets.
///
/// The returned buckets are in creation order (bucket index), not sorted.
/// Fails if a bucket total would not fit in `u64`.
#[cfg(feature = "knapsack")]
pub fn greedy_seed(units: &[WeightedUnit], nprocs: usize) -> BalanceResult<Vec<Bucket>> {
    use std::cmp::Reverse;
    use std::collections::BinaryHeap;

    let mut sorted = units.to_vec();
    sorted.sort_by(|a, b| b.weight.cmp(&a.weight).then(a.id.cmp(&b.id)));

    let mut buckets = vec![Bucket::new(); nprocs];
    // Min-heap on (total, bucket index): lightest first, lowest index on ties.
    let mut lightest: BinaryHeap<Reverse<(u64, usize)>> =
        (0..nprocs).map(|idx| Reverse((0, idx))).collect();

    for unit in sorted {
        let Some(Reverse((total, idx))) = lightest.pop() else {
            break;
        };
        if total.checked_add(unit.weight).is_none() {
            return Err(BalanceError::WeightOverflow {
                units: units.len(),
                nprocs,
            });
        }
        buckets[idx].push(unit);
        lightest.push(Reverse((buckets[idx].total(), idx)));
    }

    Ok(buckets)
}

/// Pairwise-exchange refinement. Leaves `buckets` sorted heaviest first and
/// returns `(accepted exchanges, hit the cap)`.
///
/// Every accepted exchange leaves both touched buckets strictly lighter than
/// the heaviest bucket was, so the maximum bucket weight never grows.
#[cfg(feature = "knapsack")]
pub fn refine(buckets: &mut [Bucket], max_iterations: usize) -> (usize, bool) {
    sort_heaviest_first(buckets);

    let mut swaps = 0;
    while let Some(exchange) = find_exchange(buckets) {
        if swaps >= max_iterations {
            warn!(
                max_iterations,
                heaviest = heaviest(buckets),
                "knapsack refinement hit iteration cap, keeping current assignment"
            );
            return (swaps, true);
        }
        apply_exchange(buckets, exchange);
        swaps += 1;
        sort_heaviest_first(buckets);
    }

    (swaps, false)
}

/// Indices of an improving exchange: (unit in heaviest bucket, other
/// bucket, unit in other bucket).
#[cfg(feature = "knapsack")]
type Exchange = (usize, usize, usize);

#[cfg(feature = "knapsack")]
fn find_exchange(buckets: &[Bucket]) -> Option<Exchange> {
    let (top, others) = buckets.split_first()?;
    let top_total = top.total();

    for (u_idx, u) in top.units().iter().enumerate() {
        for (offset, other) in others.iter().enumerate() {
            for (v_idx, v) in other.units().iter().enumerate() {
                // The heaviest bucket only gets lighter if v < u. The other
                // bucket's new total is compared in u128: two large units in
                // different buckets can sum past u64::MAX.
                if v.weight >= u.weight {
                    continue;
                }
                let new_other =
                    u128::from(other.total() - v.weight) + u128::from(u.weight);
                if new_other < u128::from(top_total) {
                    return Some((u_idx, offset + 1, v_idx));
                }
            }
        }
    }
    None
}

#[cfg(feature = "knapsack")]
fn apply_exchange(buckets: &mut [Bucket], (u_idx, other_idx, v_idx): Exchange) {
    let (head, tail) = buckets.split_at_mut(other_idx);
    let top = &mut head[0];
    let other = &mut tail[0];

    let u = top.remove(u_idx);
    let v = other.remove(v_idx);
    debug!(
        moved_out = u.id,
        moved_in = v.id,
        top_total = top.total() + v.weight,
        other_total = other.total() + u.weight,
        "knapsack exchange"
    );
    top.push(v);
    other.push(u);
}

#[cfg(feature = "knapsack")]
fn sort_heaviest_first(buckets: &mut [Bucket]) {
    // Stable: equal-weight buckets keep their relative order.
    buckets.sort_by(|a, b| b.total().cmp(&a.total()));
}

#[cfg(feature = "knapsack")]
fn heaviest(buckets: &[Bucket]) -> u64 {
    buckets.iter().map(Bucket::total).max().unwrap_or(0)
}
