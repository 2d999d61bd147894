use std::path::Path;

use distmap_core::{BalancerConfig, Strategy};

pub fn init(path: &str) -> anyhow::Result<()> {
    let mut config = BalancerConfig::default();
    config.balancer.strategy = Some(Strategy::default().to_string());

    let output = Path::new(path).join("distmap.toml");
    std::fs::write(&output, config.to_toml_string()?)?;
    println!("✓ Generated {}", output.display());

    Ok(())
}
