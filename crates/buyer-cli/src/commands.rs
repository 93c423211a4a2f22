//! Non-interactive CLI commands

use anyhow::{Context, Result};
use buyer_core::{Catalog, Config};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::transcript::TranscriptStore;

// ANSI color codes
const YELLOW: &str = "\x1b[93m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const RESET: &str = "\x1b[0m";

/// Load config from an explicit path, or search for buyer.toml, or fall back
/// to defaults. Returns the path actually used, if any.
pub fn resolve_config(path: Option<&Path>) -> Result<(Config, Option<PathBuf>)> {
    if let Some(path) = path {
        let config = Config::load_from(path)?;
        return Ok((config, Some(path.to_path_buf())));
    }

    match Config::find_config_path() {
        Ok(found) => {
            let config = Config::load_from(&found)?;
            Ok((config, Some(found)))
        }
        Err(e) => {
            warn!(error = %e, "Using built-in defaults");
            Ok((Config::default(), None))
        }
    }
}

/// Print the catalog with current prices and the remaining budget
pub fn print_catalog(catalog: &Catalog, budget: u64) {
    println!("{}Assets:{}", BOLD, RESET);
    for asset in catalog.iter() {
        let marker = if asset.price <= budget { "" } else { " (over budget)" };
        println!(
            "  {:<12} {:>10}{}{}{}  {}",
            asset.name, asset.price, DIM, marker, RESET, asset.description
        );
    }
    println!("{}Budget:{} {}", BOLD, RESET, budget);
}

/// Show the asset catalog and starting budget
pub fn assets(path: Option<&Path>) -> Result<()> {
    let (config, _) = resolve_config(path)?;
    let catalog = Catalog::from_assets(config.assets.clone());
    print_catalog(&catalog, config.market.budget);
    Ok(())
}

/// Show the resolved configuration
pub fn show_config(path: Option<&Path>) -> Result<()> {
    let (config, source) = resolve_config(path)?;

    match source {
        Some(p) => println!("{}Config:{} {}", BOLD, RESET, p.display()),
        None => println!(
            "{}Config:{} buyer.toml not found, using defaults",
            YELLOW, RESET
        ),
    }
    println!();

    let rendered = toml::to_string_pretty(&config).context("Failed to render config")?;
    println!("{}", rendered);
    Ok(())
}

/// Show a saved transcript
pub fn show_transcript(id: &str) -> Result<()> {
    let store = TranscriptStore::new()?;
    let transcript = store.load(id)?;

    println!("{}Transcript:{} {}", BOLD, RESET, transcript.id);
    println!(
        "{}Model: {}  |  Started: {}{}",
        DIM,
        transcript.model,
        transcript.started_at.format("%Y-%m-%d %H:%M"),
        RESET
    );
    println!();
    for line in &transcript.history {
        println!("{}", line);
    }
    println!();
    for p in &transcript.purchases {
        println!("  Bought {} for {}", p.asset, p.price);
    }
    println!(
        "Spent {} of {} ({} left)",
        transcript.spent(),
        transcript.starting_budget,
        transcript.final_budget
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_resolve_explicit_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[market]\nbudget = 900\ndrift_percent = 2").unwrap();

        let (config, source) = resolve_config(Some(file.path())).unwrap();
        assert_eq!(config.market.budget, 900);
        assert_eq!(config.market.drift_percent, 2);
        assert_eq!(source.as_deref(), Some(file.path()));
    }

    #[test]
    fn test_resolve_explicit_path_missing() {
        let dir = tempfile::TempDir::new().unwrap();
        assert!(resolve_config(Some(&dir.path().join("nope.toml"))).is_err());
    }

    #[test]
    fn test_resolve_rejects_invalid_config() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[market]\ndrift_percent = 500").unwrap();
        assert!(resolve_config(Some(file.path())).is_err());
    }
}
