//! The balancing service.
//!
//! A [`Balancer`] is created once per process with that process's rank. It
//! holds the active [`Strategy`] and the knapsack [`AssignmentCache`].

use std::io;

use distmap_core::{BalancerConfig, DistributionMap, Strategy};
use tracing::{debug, warn};

use crate::cache::AssignmentCache;
use crate::error::{BalanceError, BalanceResult};
use crate::knapsack::{KnapsackOptions, knapsack};
use crate::round_robin::round_robin;

#[derive(Debug, Clone)]
pub struct Balancer {
    rank: usize,
    strategy: Strategy,
    options: KnapsackOptions,
    cache_enabled: bool,
    cache: AssignmentCache,
}

impl Balancer {
    /// Balancer for the process with the given `rank`, using the knapsack
    /// strategy and an empty cache.
    pub fn new(rank: usize) -> Self {
        Self {
            rank,
            strategy: Strategy::default(),
            options: KnapsackOptions::default(),
            cache_enabled: true,
            cache: AssignmentCache::new(),
        }
    }

    /// Balancer configured from a `distmap.toml`.
    ///
    /// An unrecognized strategy name is logged and ignored; the default
    /// strategy stays in effect.
    pub fn from_config(rank: usize, config: &BalancerConfig) -> Self {
        let section = &config.balancer;
        let mut balancer = Self::new(rank).with_options(KnapsackOptions {
            max_refine_iterations: section.max_refine_iterations,
        });
        balancer.cache_enabled = section.cache;

        if let Some(name) = &section.strategy {
            match name.parse::<Strategy>() {
                Ok(strategy) => balancer.set_strategy(strategy),
                Err(e) => warn!(
                    strategy = %name,
                    current = %balancer.strategy,
                    error = %e,
                    "ignoring configured strategy"
                ),
            }
        }
        balancer
    }

    pub fn with_strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_options(mut self, options: KnapsackOptions) -> Self {
        self.options = options;
        self
    }

    /// Enable or disable reuse of knapsack maps.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_enabled = enabled;
        self
    }

    pub fn rank(&self) -> usize {
        self.rank
    }

    pub fn strategy(&self) -> Strategy {
        self.strategy
    }

    pub fn set_strategy(&mut self, strategy: Strategy) {
        debug!(from = %self.strategy, to = %strategy, "switching balancing strategy");
        self.strategy = strategy;
    }

    pub fn options(&self) -> &KnapsackOptions {
        &self.options
    }

    /// Build a map assigning `weights.len()` units to `nprocs` processes
    /// with the active strategy.
    ///
    /// Under the knapsack strategy a cached map with the same unit count is
    /// returned as is, whatever the weights; otherwise the computed map is
    /// cached. A cached map with owners outside `0..nprocs` is an error.
    pub fn distribute(&mut self, weights: &[u64], nprocs: usize) -> BalanceResult<DistributionMap> {
        if nprocs == 0 {
            return Err(BalanceError::NoProcesses);
        }
        let nunits = weights.len();

        let map = match self.strategy {
            Strategy::RoundRobin => round_robin(nunits, nprocs, self.rank)?,
            Strategy::Knapsack => {
                if self.cache_enabled {
                    if let Some(cached) = self.cache.lookup(nunits) {
                        debug_assert_eq!(cached.owner_rank(), self.rank);
                        // Matched on unit count only; it may have been built
                        // for more processes than are available now.
                        self.check(cached, nunits, nprocs)?;
                        debug!(units = nunits, nprocs, "reusing cached distribution map");
                        return Ok(cached.clone());
                    }
                }
                knapsack(weights, nprocs, self.rank, &self.options)?.map
            }
        };

        self.check(&map, nunits, nprocs)?;

        if self.strategy == Strategy::Knapsack && self.cache_enabled {
            self.cache.insert(&map);
        }
        Ok(map)
    }

    /// Recompute `map` in place for the given weights.
    pub fn define(
        &mut self,
        map: &mut DistributionMap,
        weights: &[u64],
        nprocs: usize,
    ) -> BalanceResult<()> {
        let fresh = self.distribute(weights, nprocs)?;
        map.assign_from(&fresh);
        Ok(())
    }

    /// Join two maps without rebalancing, stamped with this process's rank.
    pub fn concatenate(&self, first: &DistributionMap, second: &DistributionMap) -> DistributionMap {
        DistributionMap::concatenate(first, second, self.rank)
    }

    /// Remember a map built elsewhere (e.g. by [`Self::concatenate`]).
    /// Skipped when a map with the same unit count is already cached.
    pub fn add_to_cache(&mut self, map: &DistributionMap) -> bool {
        if !map.is_empty() {
            debug_assert_eq!(map.owner_rank(), self.rank);
        }
        self.cache.insert(map)
    }

    pub fn flush_cache(&mut self) {
        debug!(dropped = self.cache.len(), "flushing distribution map cache");
        self.cache.clear();
    }

    pub fn cache_size(&self) -> usize {
        self.cache.len()
    }

    pub fn cache(&self) -> &AssignmentCache {
        &self.cache
    }

    pub fn write_cache_stats<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        self.cache.write_stats(out)
    }

    pub fn cache_stats(&self) -> String {
        let mut out = Vec::new();
        let _ = self.cache.write_stats(&mut out);
        String::from_utf8_lossy(&out).into_owned()
    }

    fn check(&self, map: &DistributionMap, nunits: usize, nprocs: usize) -> BalanceResult<()> {
        if map.len() != nunits {
            return Err(BalanceError::LengthMismatch {
                expected: nunits,
                actual: map.len(),
            });
        }
        if let Some((unit, owner)) = map.first_out_of_range(nprocs) {
            return Err(BalanceError::OwnerOutOfRange { unit, owner, nprocs });
        }
        Ok(())
    }
}
