//! Simulation configuration, loaded from TOML and overridable from the CLI.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::building::{Building, LOWEST_FLOOR};
use crate::error::ConfigError;
use crate::generator::MIN_MAIL_WEIGHT;
use crate::types::{CapacityTier, Floor, TRIPLE_MAX_WEIGHT, Tick, Weight};

fn default_floors() -> Floor {
    10
}

fn default_mailroom() -> Floor {
    LOWEST_FLOOR
}

fn default_robots() -> usize {
    3
}

fn default_mail_count() -> usize {
    40
}

fn default_last_arrival_tick() -> Tick {
    100
}

fn default_max_weight() -> Weight {
    2000
}

fn default_seed() -> u64 {
    30006
}

fn default_max_ticks() -> Tick {
    5000
}

/// Parameters for one simulation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimConfig {
    #[serde(default = "default_floors")]
    pub floors: Floor,

    #[serde(default = "default_mailroom")]
    pub mailroom: Floor,

    #[serde(default = "default_robots")]
    pub robots: usize,

    /// Largest team allowed to share one item.
    #[serde(default)]
    pub capacity: CapacityTier,

    #[serde(default = "default_mail_count")]
    pub mail_count: usize,

    /// Last tick at which new mail may arrive.
    #[serde(default = "default_last_arrival_tick")]
    pub last_arrival_tick: Tick,

    /// Heaviest item the generator produces.
    #[serde(default = "default_max_weight")]
    pub max_weight: Weight,

    #[serde(default = "default_seed")]
    pub seed: u64,

    /// Give up after this many ticks.
    #[serde(default = "default_max_ticks")]
    pub max_ticks: Tick,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            floors: default_floors(),
            mailroom: default_mailroom(),
            robots: default_robots(),
            capacity: CapacityTier::default(),
            mail_count: default_mail_count(),
            last_arrival_tick: default_last_arrival_tick(),
            max_weight: default_max_weight(),
            seed: default_seed(),
            max_ticks: default_max_ticks(),
        }
    }
}

impl SimConfig {
    /// Read and validate a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: SimConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn building(&self) -> Building {
        Building::new(self.floors, self.mailroom)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.floors < LOWEST_FLOOR {
            return Err(invalid("floors", format!("must be >= {LOWEST_FLOOR}")));
        }
        if !(LOWEST_FLOOR..=self.floors).contains(&self.mailroom) {
            return Err(invalid(
                "mailroom",
                format!("{} is outside floors {LOWEST_FLOOR}..={}", self.mailroom, self.floors),
            ));
        }
        if self.robots == 0 {
            return Err(invalid("robots", "must be > 0".to_string()));
        }
        if self.last_arrival_tick == 0 {
            return Err(invalid("last_arrival_tick", "must be > 0".to_string()));
        }
        if self.max_weight < MIN_MAIL_WEIGHT || self.max_weight > TRIPLE_MAX_WEIGHT {
            return Err(invalid(
                "max_weight",
                format!("must be within {MIN_MAIL_WEIGHT}..={TRIPLE_MAX_WEIGHT}"),
            ));
        }
        if self.max_weight > self.capacity.max_weight() {
            return Err(invalid(
                "max_weight",
                format!(
                    "{} exceeds the {} tier ceiling of {}",
                    self.max_weight,
                    self.capacity,
                    self.capacity.max_weight()
                ),
            ));
        }
        if self.max_ticks == 0 {
            return Err(invalid("max_ticks", "must be > 0".to_string()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
