//! Configuration management for buyer.toml

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::catalog::Asset;

/// Name of the configuration file searched for in the working directory
pub const CONFIG_FILE: &str = "buyer.toml";

/// Environment variable holding the language model API key
pub const API_KEY_ENV_VAR: &str = "GPT_API_KEY";

const CLOCK_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub market: MarketConfig,
    #[serde(default)]
    pub agent: AgentConfig,
    #[serde(default)]
    pub clock: ClockConfig,
    #[serde(default = "Asset::defaults")]
    pub assets: Vec<Asset>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_model_name")]
    pub name: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub temperature: Option<f32>,
    #[serde(default)]
    pub max_tokens: Option<u32>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Starting budget in whole currency units
    #[serde(default = "default_budget")]
    pub budget: u64,
    /// Maximum per-turn price movement, in percent
    #[serde(default = "default_drift_percent")]
    pub drift_percent: u64,
    /// Fixed RNG seed for reproducible price drift
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_agent_name")]
    pub name: String,
    #[serde(default = "default_traits")]
    pub traits: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClockConfig {
    #[serde(default = "default_clock_start")]
    pub start: String,
    #[serde(default = "default_major_step")]
    pub major_step_minutes: i64,
    #[serde(default = "default_minor_step")]
    pub minor_step_seconds: i64,
}

fn default_model_name() -> String {
    "gpt-4o".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_budget() -> u64 {
    50_000
}

fn default_drift_percent() -> u64 {
    5
}

fn default_agent_name() -> String {
    "Buyer".to_string()
}

fn default_traits() -> String {
    "analytical, decisive, budget-conscious".to_string()
}

fn default_clock_start() -> String {
    "2024-10-01T20:00:00".to_string()
}

fn default_major_step() -> i64 {
    30
}

fn default_minor_step() -> i64 {
    10
}

impl Default for Config {
    fn default() -> Self {
        Self {
            model: ModelConfig::default(),
            market: MarketConfig::default(),
            agent: AgentConfig::default(),
            clock: ClockConfig::default(),
            assets: Asset::defaults(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            name: default_model_name(),
            base_url: default_base_url(),
            temperature: None,
            max_tokens: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            budget: default_budget(),
            drift_percent: default_drift_percent(),
            seed: None,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            traits: default_traits(),
        }
    }
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            start: default_clock_start(),
            major_step_minutes: default_major_step(),
            minor_step_seconds: default_minor_step(),
        }
    }
}

impl ClockConfig {
    /// Parse the configured start time
    pub fn start_time(&self) -> Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&self.start, CLOCK_FORMAT)
            .with_context(|| {
                format!("Invalid clock start '{}', expected {}", self.start, CLOCK_FORMAT)
            })
    }

    pub fn major_step(&self) -> Duration {
        Duration::minutes(self.major_step_minutes)
    }

    pub fn minor_step(&self) -> Duration {
        Duration::seconds(self.minor_step_seconds)
    }
}

impl Config {
    /// Load configuration from a specific path
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Find buyer.toml by searching current directory and parents
    pub fn find_config_path() -> Result<PathBuf> {
        Self::find_config_path_from(&std::env::current_dir()?)
    }

    /// Find buyer.toml in `start` or up to nine of its parents
    pub fn find_config_path_from(start: &Path) -> Result<PathBuf> {
        let mut current = start.to_path_buf();

        for _ in 0..10 {
            let candidate = current.join(CONFIG_FILE);
            if candidate.exists() {
                return Ok(candidate);
            }
            if !current.pop() {
                break;
            }
        }

        anyhow::bail!("{} not found in current directory or parents", CONFIG_FILE)
    }

    /// Check the values serde cannot check on its own
    pub fn validate(&self) -> Result<()> {
        if self.market.drift_percent > 100 {
            anyhow::bail!(
                "drift_percent must be at most 100, got {}",
                self.market.drift_percent
            );
        }
        if self.clock.major_step_minutes <= 0 || self.clock.minor_step_seconds <= 0 {
            anyhow::bail!("clock steps must be positive");
        }
        self.clock.start_time()?;

        if self.assets.is_empty() {
            anyhow::bail!("at least one asset must be configured");
        }
        let mut seen = HashSet::new();
        for asset in &self.assets {
            if asset.price == 0 {
                anyhow::bail!("asset '{}' has a zero price", asset.name);
            }
            if !seen.insert(asset.name.to_lowercase()) {
                anyhow::bail!("asset '{}' is listed more than once", asset.name);
            }
        }

        Ok(())
    }
}

/// Return the API key, failing if it is absent or blank
pub fn require_api_key(value: Option<&str>) -> Result<String> {
    match value.map(str::trim) {
        Some(key) if !key.is_empty() => Ok(key.to_string()),
        _ => anyhow::bail!("{} is required.", API_KEY_ENV_VAR),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.model.name, "gpt-4o");
        assert_eq!(config.market.drift_percent, 5);
        assert_eq!(config.assets.len(), 5);
        assert_eq!(config.agent.name, "Buyer");
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[model]
name = "gpt-4o-mini"
temperature = 0.5

[market]
budget = 2000
seed = 7

[clock]
start = "2025-01-01T09:30:00"

[[assets]]
name = "Bicycle"
description = "A two-wheeled vehicle."
price = 300
"#;

        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.model.name, "gpt-4o-mini");
        assert_eq!(config.model.base_url, "https://api.openai.com/v1");
        assert_eq!(config.market.budget, 2000);
        assert_eq!(config.market.seed, Some(7));
        assert_eq!(config.assets.len(), 1);
        assert_eq!(config.assets[0].price, 300);
        assert_eq!(
            config.clock.start_time().unwrap().format("%H:%M").to_string(),
            "09:30"
        );
        assert_eq!(config.clock.major_step(), Duration::minutes(30));
    }

    #[test]
    fn test_example_config_parses() {
        let config: Config = toml::from_str(include_str!("../../../buyer.example.toml")).unwrap();
        config.validate().unwrap();
        assert_eq!(config.assets, Asset::defaults());
        assert_eq!(config.market.budget, 50_000);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[market]\nbudget = 123").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.market.budget, 123);
        assert_eq!(config.assets.len(), 5);
    }

    #[test]
    fn test_find_config_in_parent() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "[market]\nbudget = 7\n").unwrap();

        let found = Config::find_config_path_from(&nested).unwrap();
        assert_eq!(found, dir.path().join(CONFIG_FILE));
        assert_eq!(Config::load_from(found).unwrap().market.budget, 7);
    }

    #[test]
    fn test_find_config_prefers_nearest() {
        let dir = tempfile::TempDir::new().unwrap();
        let nested = dir.path().join("project");
        std::fs::create_dir_all(&nested).unwrap();
        std::fs::write(dir.path().join(CONFIG_FILE), "").unwrap();
        std::fs::write(nested.join(CONFIG_FILE), "").unwrap();

        let found = Config::find_config_path_from(&nested).unwrap();
        assert_eq!(found, nested.join(CONFIG_FILE));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.market.drift_percent = 101;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.assets[1].name = "LAPTOP".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.assets[0].price = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.clock.start = "tomorrow".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_require_api_key() {
        assert!(require_api_key(None).is_err());
        assert!(require_api_key(Some("   ")).is_err());
        assert_eq!(require_api_key(Some(" sk-123 ")).unwrap(), "sk-123");
    }
}
