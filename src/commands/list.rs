//! `pgverify list`: show the checks a run would execute

use anyhow::Result;
use colored::Colorize;
use std::path::Path;

use crate::config::Config;
use crate::harness::default_checks;

pub fn execute(config_path: Option<&Path>) -> Result<()> {
    let config = Config::discover(config_path)?;
    let checks = default_checks(&config);

    let width = checks.iter().map(|c| c.name().len()).max().unwrap_or(0);
    for check in &checks {
        let name = format!("{:width$}", check.name());
        println!("{}  {}", name.bold(), check.description().dimmed());
    }
    Ok(())
}
