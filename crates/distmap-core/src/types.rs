//! Weighted units, balancing strategies, and the distribution map itself.

use std::fmt;
use std::ops::Index;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// A schedulable piece of work carrying a scalar weight.
///
/// The weight is usually the cell count of the sub-domain the unit stands
/// for. Every process must see bit-identical weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WeightedUnit {
    pub id: usize,
    pub weight: u64,
}

impl WeightedUnit {
    pub fn new(id: usize, weight: u64) -> Self {
        Self { id, weight }
    }

    /// Build units from a weight vector, using the position as id.
    pub fn from_weights(weights: &[u64]) -> Vec<WeightedUnit> {
        weights
            .iter()
            .enumerate()
            .map(|(id, &weight)| WeightedUnit::new(id, weight))
            .collect()
    }
}

/// Algorithm used to fill a distribution map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// Unit `i` goes to process `i mod P`.
    RoundRobin,
    /// Weighted greedy packing followed by pairwise-exchange refinement.
    #[default]
    Knapsack,
}

impl Strategy {
    /// Configuration name of the strategy.
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::RoundRobin => "ROUNDROBIN",
            Strategy::Knapsack => "KNAPSACK",
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Strategy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ROUNDROBIN" => Ok(Strategy::RoundRobin),
            "KNAPSACK" => Ok(Strategy::Knapsack),
            other => Err(ConfigError::UnknownStrategy(other.to_string())),
        }
    }
}

/// Assignment of work units to owning processes.
///
/// `owners[i]` is the process that owns unit `i`. `owner_rank` is the rank
/// of the process that built the map; it takes part in equality but is
/// not part of the assignment.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DistributionMap {
    owners: Vec<usize>,
    owner_rank: usize,
}

impl DistributionMap {
    pub fn new(owners: Vec<usize>, owner_rank: usize) -> Self {
        Self { owners, owner_rank }
    }

    /// Join two maps: the units of `first` followed by the units of
    /// `second`. No balancing is re-run.
    pub fn concatenate(
        first: &DistributionMap,
        second: &DistributionMap,
        owner_rank: usize,
    ) -> Self {
        let mut owners = Vec::with_capacity(first.len() + second.len());
        owners.extend_from_slice(&first.owners);
        owners.extend_from_slice(&second.owners);
        Self { owners, owner_rank }
    }

    pub fn owners(&self) -> &[usize] {
        &self.owners
    }

    pub fn owner_rank(&self) -> usize {
        self.owner_rank
    }

    /// Number of units covered by the map.
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Owning process of `unit`, or `None` past the end.
    pub fn get(&self, unit: usize) -> Option<usize> {
        self.owners.get(unit).copied()
    }

    /// Unit indices owned by `process`, in ascending order.
    pub fn units_of(&self, process: usize) -> impl Iterator<Item = usize> + '_ {
        self.owners
            .iter()
            .enumerate()
            .filter(move |&(_, &owner)| owner == process)
            .map(|(unit, _)| unit)
    }

    /// Total weight per process. `weights[i]` is the weight of unit `i`.
    ///
    /// Owners outside `0..nprocs` are ignored; use [`Self::first_out_of_range`]
    /// to detect them.
    pub fn loads(&self, weights: &[u64], nprocs: usize) -> Vec<u64> {
        let mut loads = vec![0u64; nprocs];
        for (&owner, &weight) in self.owners.iter().zip(weights) {
            if let Some(load) = loads.get_mut(owner) {
                *load += weight;
            }
        }
        loads
    }

    /// First `(unit, owner)` whose owner is not a valid process id.
    pub fn first_out_of_range(&self, nprocs: usize) -> Option<(usize, usize)> {
        self.owners
            .iter()
            .enumerate()
            .find(|&(_, &owner)| owner >= nprocs)
            .map(|(unit, &owner)| (unit, owner))
    }

    /// Replace the contents of this map with `other`'s.
    pub fn assign_from(&mut self, other: &DistributionMap) {
        self.owners.clear();
        self.owners.extend_from_slice(&other.owners);
        self.owner_rank = other.owner_rank;
    }
}

impl Index<usize> for DistributionMap {
    type Output = usize;

    fn index(&self, unit: usize) -> &usize {
        &self.owners[unit]
    }
}

impl fmt::Display for DistributionMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "(DistributionMap")?;
        for (unit, owner) in self.owners.iter().enumerate() {
            writeln!(f, "owners[{unit}] = {owner}")?;
        }
        writeln!(f, ")")
    }
}
