use crate::core::{
    LedgerConfig, DEFAULT_DIFFICULTY, DEFAULT_MINING_INTERVAL_SECS, DEFAULT_MINING_REWARD,
    MAX_DIFFICULTY, MIN_DIFFICULTY,
};
use crate::error::{LedgerError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

const DIFFICULTY_KEY: &str = "LEDGER_DIFFICULTY";
const MINING_REWARD_KEY: &str = "LEDGER_MINING_REWARD";
const MINING_INTERVAL_KEY: &str = "LEDGER_MINING_INTERVAL_SECS";
const RESERVE_PENDING_KEY: &str = "LEDGER_RESERVE_PENDING_SPENDS";

/// Node settings. Layered as defaults, then an optional TOML file, then
/// `LEDGER_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub difficulty: u32,
    pub mining_reward: u64,
    pub mining_interval_secs: u64,
    pub reserve_pending_spends: bool,
}

impl Default for NodeConfig {
    fn default() -> Self {
        NodeConfig {
            difficulty: DEFAULT_DIFFICULTY,
            mining_reward: DEFAULT_MINING_REWARD,
            mining_interval_secs: DEFAULT_MINING_INTERVAL_SECS,
            reserve_pending_spends: false,
        }
    }
}

impl NodeConfig {
    pub fn from_toml_str(contents: &str) -> Result<NodeConfig> {
        let config: NodeConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<NodeConfig> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads `path` when given, applies the process environment, validates.
    pub fn resolve(path: Option<&Path>) -> Result<NodeConfig> {
        let mut config = match path {
            Some(path) => Self::load(path)?,
            None => NodeConfig::default(),
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env(&mut self) -> Result<()> {
        self.apply_overrides(|key| env::var(key).ok())
    }

    /// Applies overrides from any key lookup; used with the real environment
    /// and with fixed maps in tests.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(DIFFICULTY_KEY) {
            self.difficulty = parse_value(DIFFICULTY_KEY, &value)?;
        }
        if let Some(value) = lookup(MINING_REWARD_KEY) {
            self.mining_reward = parse_value(MINING_REWARD_KEY, &value)?;
        }
        if let Some(value) = lookup(MINING_INTERVAL_KEY) {
            self.mining_interval_secs = parse_value(MINING_INTERVAL_KEY, &value)?;
        }
        if let Some(value) = lookup(RESERVE_PENDING_KEY) {
            self.reserve_pending_spends = parse_value(RESERVE_PENDING_KEY, &value)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !(MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(&self.difficulty) {
            return Err(LedgerError::Config(format!(
                "difficulty must be between {MIN_DIFFICULTY} and {MAX_DIFFICULTY}, got {}",
                self.difficulty
            )));
        }
        if self.mining_interval_secs == 0 {
            return Err(LedgerError::Config(
                "mining_interval_secs must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn ledger_config(&self) -> LedgerConfig {
        LedgerConfig {
            difficulty: self.difficulty,
            mining_reward: self.mining_reward,
            mining_interval: Duration::from_secs(self.mining_interval_secs),
            reserve_pending_spends: self.reserve_pending_spends,
        }
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| LedgerError::Config(format!("{key} has invalid value {value:?}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = NodeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.ledger_config(), LedgerConfig::default());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = NodeConfig::from_toml_str("difficulty = 4\n").unwrap();
        assert_eq!(config.difficulty, 4);
        assert_eq!(config.mining_reward, DEFAULT_MINING_REWARD);
    }

    #[test]
    fn test_out_of_range_difficulty_rejected() {
        assert!(matches!(
            NodeConfig::from_toml_str("difficulty = 0"),
            Err(LedgerError::Config(_))
        ));
        assert!(NodeConfig::from_toml_str("difficulty = 300").is_err());
        assert!(NodeConfig::from_toml_str("difficulty = \"high\"").is_err());
    }

    #[test]
    fn test_overrides_win_over_file() {
        let mut config = NodeConfig::from_toml_str("mining_reward = 5").unwrap();
        let vars: HashMap<&str, &str> = [
            (MINING_REWARD_KEY, "7"),
            (RESERVE_PENDING_KEY, "true"),
        ]
        .into_iter()
        .collect();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.mining_reward, 7);
        assert!(config.reserve_pending_spends);
    }

    #[test]
    fn test_bad_override_is_config_error() {
        let mut config = NodeConfig::default();
        let result = config.apply_overrides(|key| {
            (key == MINING_INTERVAL_KEY).then(|| "soon".to_string())
        });
        assert!(matches!(result, Err(LedgerError::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "difficulty = 8\nmining_interval_secs = 3").unwrap();

        let config = NodeConfig::load(file.path()).unwrap();
        assert_eq!(config.difficulty, 8);
        assert_eq!(
            config.ledger_config().mining_interval,
            Duration::from_secs(3)
        );
    }
}
