use std::path::Path;

use anyhow::{Context, bail};
use distmap_balancer::Balancer;
use distmap_core::{BalancerConfig, DistributionMap, Strategy};
use serde::Serialize;
use tracing::info;

pub struct BalanceArgs {
    pub weights: Vec<u64>,
    pub weights_file: Option<String>,
    pub nprocs: usize,
    pub rank: usize,
    pub strategy: Option<Strategy>,
    pub config: Option<String>,
    pub repeat: usize,
    pub format: String,
}

#[derive(Debug, Serialize)]
struct BalanceReport {
    strategy: String,
    nprocs: usize,
    map: DistributionMap,
    loads: Vec<u64>,
    efficiency: f64,
    cache_size: usize,
}

pub fn balance(args: BalanceArgs) -> anyhow::Result<()> {
    let weights = match &args.weights_file {
        Some(path) => read_weights(Path::new(path))?,
        None => args.weights.clone(),
    };
    if weights.is_empty() {
        bail!("no unit weights given (use --weights or --weights-file)");
    }

    let config = match &args.config {
        Some(path) => BalancerConfig::from_file(Path::new(path))
            .with_context(|| format!("loading {path}"))?,
        None => BalancerConfig::default(),
    };
    let mut balancer = Balancer::from_config(args.rank, &config);
    if let Some(strategy) = args.strategy {
        balancer.set_strategy(strategy);
    }

    let mut map = DistributionMap::default();
    for step in 0..args.repeat.max(1) {
        balancer.define(&mut map, &weights, args.nprocs)?;
        info!(
            step,
            units = weights.len(),
            nprocs = args.nprocs,
            cached = balancer.cache_size(),
            "balanced"
        );
    }

    let loads = map.loads(&weights, args.nprocs);
    let report = BalanceReport {
        strategy: balancer.strategy().to_string(),
        nprocs: args.nprocs,
        efficiency: efficiency(&loads),
        loads,
        map,
        cache_size: balancer.cache_size(),
    };

    match args.format.as_str() {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        _ => {
            print!("{}", format_report(&report));
            print!("{}", balancer.cache_stats());
        }
    }

    Ok(())
}

/// Parse comma and/or whitespace separated weights.
pub fn parse_weights(content: &str) -> anyhow::Result<Vec<u64>> {
    content
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|tok| !tok.is_empty())
        .map(|tok| {
            tok.parse::<u64>()
                .with_context(|| format!("invalid weight: {tok:?}"))
        })
        .collect()
}

fn read_weights(path: &Path) -> anyhow::Result<Vec<u64>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    parse_weights(&content)
}

/// `sum / (P * max)`; 1.0 means every process carries the same load.
fn efficiency(loads: &[u64]) -> f64 {
    let max = loads.iter().copied().max().unwrap_or(0);
    if max == 0 {
        return 1.0;
    }
    let sum: u64 = loads.iter().sum();
    sum as f64 / (loads.len() as f64 * max as f64)
}

fn format_report(report: &BalanceReport) -> String {
    let mut out = format!(
        "strategy: {}  processes: {}  rank: {}\n",
        report.strategy,
        report.nprocs,
        report.map.owner_rank()
    );
    out.push_str(&report.map.to_string());
    for (process, load) in report.loads.iter().enumerate() {
        out.push_str(&format!(
            "  process {process:>3}: load {load} ({} units)\n",
            report.map.units_of(process).count()
        ));
    }
    out.push_str(&format!("efficiency: {:.4}\n", report.efficiency));
    out
}
