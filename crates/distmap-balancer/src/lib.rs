//! distmap-balancer — compute distribution maps for weighted work units.
//!
//! Every process runs the same deterministic algorithm over the same unit
//! weights and arrives at the same map, so no communication is needed while
//! balancing. The [`Balancer`] owns the active strategy and a cache of
//! previously computed maps.
//!
//! # Architecture
//!
//! ```text
//! Balancer
//!   ├── Strategy (RoundRobin | Knapsack)
//!   ├── round_robin()      unit i -> process i mod P
//!   ├── knapsack()         greedy seed + pairwise-exchange refinement
//!   │     └── Bucket       per-process units + running total
//!   └── AssignmentCache    maps reused by unit count (knapsack only)
//! ```

pub mod balancer;
pub mod cache;
pub mod error;
pub mod knapsack;
pub mod round_robin;

pub use balancer::Balancer;
pub use cache::AssignmentCache;
pub use error::{BalanceError, BalanceResult};
pub use knapsack::{Bucket, KnapsackOptions, KnapsackOutcome, KnapsackReport, knapsack};
pub use round_robin::round_robin;

pub use distmap_core::{BalancerConfig, DistributionMap, Strategy, WeightedUnit};
