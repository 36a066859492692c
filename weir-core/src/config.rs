//! Configuration for weight tuning and pool layout.
//!
//! Tuning values live in a [`WeightConfig`] handed to each pool at construction,
//! so pools with different tuning can coexist in one process.

use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;

/// Tuning for weight adaptation and warm-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct WeightConfig {
    /// Ceiling for a node's base weight.
    #[serde(default = "default_max_weight")]
    pub max_weight: i32,

    /// Amount added to base and effective weight on every warm-up tick.
    #[serde(default = "default_added_weight")]
    pub added_weight: i32,

    /// Step applied to the effective weight on success or reject.
    #[serde(default = "default_fluctuate_weight")]
    pub fluctuate_weight: i32,

    /// Wait before the first warm-up tick, in milliseconds.
    #[serde(default = "default_warmup_delay_ms")]
    pub warmup_delay_ms: u64,

    /// Wait between subsequent warm-up ticks, in milliseconds.
    #[serde(default = "default_warmup_interval_ms")]
    pub warmup_interval_ms: u64,
}

fn default_max_weight() -> i32 {
    100
}

fn default_added_weight() -> i32 {
    5
}

fn default_fluctuate_weight() -> i32 {
    3
}

fn default_warmup_delay_ms() -> u64 {
    3000
}

fn default_warmup_interval_ms() -> u64 {
    1500
}

impl Default for WeightConfig {
    fn default() -> Self {
        Self {
            max_weight: default_max_weight(),
            added_weight: default_added_weight(),
            fluctuate_weight: default_fluctuate_weight(),
            warmup_delay_ms: default_warmup_delay_ms(),
            warmup_interval_ms: default_warmup_interval_ms(),
        }
    }
}

impl WeightConfig {
    /// Wait before the first warm-up tick.
    pub fn warmup_delay(&self) -> Duration {
        Duration::from_millis(self.warmup_delay_ms)
    }

    /// Wait between steady-state warm-up ticks.
    pub fn warmup_interval(&self) -> Duration {
        Duration::from_millis(self.warmup_interval_ms)
    }

    /// Check that every knob is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_weight <= 0 {
            return Err(ConfigError::Invalid(format!(
                "max_weight must be positive, got {}",
                self.max_weight
            )));
        }
        if self.added_weight <= 0 {
            return Err(ConfigError::Invalid(format!(
                "added_weight must be positive, got {}",
                self.added_weight
            )));
        }
        if self.fluctuate_weight < 0 {
            return Err(ConfigError::Invalid(format!(
                "fluctuate_weight must not be negative, got {}",
                self.fluctuate_weight
            )));
        }
        if self.warmup_delay_ms == 0 || self.warmup_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "warm-up intervals must be non-zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// A single backend entry of a pool.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct NodeConfig {
    /// Address of the backend.
    pub addr: SocketAddr,

    /// Initial base weight; warm-up raises it to `max_weight`.
    #[serde(default)]
    pub weight: i32,
}

/// A named pool and its members.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PoolConfig {
    /// Pool name used in diagnostics and lookups.
    pub name: String,

    /// Tuning override for this pool; the global table applies when absent.
    #[serde(default)]
    pub weights: Option<WeightConfig>,

    /// Members in selection order.
    #[serde(default)]
    pub nodes: Vec<NodeConfig>,
}

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ProxyConfig {
    /// Default tuning shared by pools without their own table.
    #[serde(default)]
    pub weights: WeightConfig,

    /// How often the weight report is logged, in milliseconds.
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,

    /// Configured pools.
    #[serde(default)]
    pub pools: Vec<PoolConfig>,
}

fn default_report_interval_ms() -> u64 {
    10_000
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            weights: WeightConfig::default(),
            report_interval_ms: default_report_interval_ms(),
            pools: Vec::new(),
        }
    }
}

impl ProxyConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: ProxyConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    /// Tuning that applies to the given pool.
    pub fn weights_for(&self, pool: &PoolConfig) -> WeightConfig {
        pool.weights.unwrap_or(self.weights)
    }

    /// Interval between weight reports.
    pub fn report_interval(&self) -> Duration {
        Duration::from_millis(self.report_interval_ms)
    }

    /// Check pool names, node addresses and weights.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;
        if self.report_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "report_interval_ms must be non-zero".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for pool in &self.pools {
            if !names.insert(pool.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate pool name {}",
                    pool.name
                )));
            }

            let weights = self.weights_for(pool);
            weights.validate()?;

            let mut addrs = HashSet::new();
            for node in &pool.nodes {
                if !addrs.insert(node.addr) {
                    return Err(ConfigError::Invalid(format!(
                        "duplicate node {} in pool {}",
                        node.addr, pool.name
                    )));
                }
                if node.weight < 0 || node.weight > weights.max_weight {
                    return Err(ConfigError::Invalid(format!(
                        "node {} in pool {} has weight {}, expected 0..={}",
                        node.addr, pool.name, node.weight, weights.max_weight
                    )));
                }
            }
        }
        Ok(())
    }
}
