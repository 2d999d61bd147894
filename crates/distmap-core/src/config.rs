//! distmap.toml configuration parser.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigResult;

/// Default bound on accepted swaps during knapsack refinement.
pub const DEFAULT_MAX_REFINE_ITERATIONS: usize = 10_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BalancerConfig {
    #[serde(default)]
    pub balancer: BalancerSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalancerSection {
    /// `ROUNDROBIN` or `KNAPSACK`. Kept as a raw string so an unknown
    /// value can be reported without failing the whole file.
    pub strategy: Option<String>,
    #[serde(default = "default_max_refine_iterations")]
    pub max_refine_iterations: usize,
    /// Remember knapsack results and reuse them for inputs with the same
    /// unit count.
    #[serde(default = "default_cache")]
    pub cache: bool,
}

fn default_max_refine_iterations() -> usize {
    DEFAULT_MAX_REFINE_ITERATIONS
}

fn default_cache() -> bool {
    true
}

impl Default for BalancerSection {
    fn default() -> Self {
        Self {
            strategy: None,
            max_refine_iterations: DEFAULT_MAX_REFINE_ITERATIONS,
            cache: true,
        }
    }
}

impl BalancerConfig {
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn to_toml_string(&self) -> ConfigResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
