//! Configuration module
//!
//! The harness takes no flags and reads no environment. Its settings are
//! compiled in from `config/bench.json`.

use crate::probe::{AccessMode, SimulatedProbeConfig};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;

/// Settings baked into the binary
pub const EMBEDDED_CONFIG: &str = include_str!("../config/bench.json");

/// Main configuration struct
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// What to read and how often
    pub run: RunConfig,

    /// Simulated debug environment
    pub probe: SimulatedProbeConfig,

    /// Logging settings
    pub logging: LoggingConfig,
}

/// Parameters of one benchmark invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    pub address: u64,
    /// Number of units per read
    pub length: u64,
    pub unit_size: u32,
    pub channel_id: u32,
    pub repetitions: NonZeroU32,
    pub mode: AccessMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub json_output: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            address: 0x7000_0000,
            length: 1,
            unit_size: 1,
            channel_id: 0,
            repetitions: NonZeroU32::new(1000).unwrap_or(NonZeroU32::MIN),
            mode: AccessMode::Monitor,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            run: RunConfig::default(),
            probe: SimulatedProbeConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                json_output: false,
            },
        }
    }
}

impl Config {
    /// Parse the compiled-in configuration
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_json(EMBEDDED_CONFIG)
    }

    pub fn from_json(content: &str) -> anyhow::Result<Self> {
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedded_matches_default() {
        let config = Config::embedded().unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_zero_repetitions_rejected() {
        let mut value = serde_json::to_value(Config::default()).unwrap();
        value["run"]["repetitions"] = serde_json::json!(0);
        assert!(Config::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn test_target_inside_simulated_memory() {
        let config = Config::default();
        let end = config.run.address + config.run.length * config.run.unit_size as u64;
        assert!(config.run.address >= config.probe.memory_base);
        assert!(end <= config.probe.memory_base + config.probe.memory_size);
    }
}
