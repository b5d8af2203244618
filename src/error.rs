//! Error types for the mailroom simulation.

use std::path::PathBuf;

use thiserror::Error;

use crate::robot::Slot;
use crate::types::{MailId, RobotId, Tick, Weight};

/// Result type alias for simulation operations.
pub type Result<T> = std::result::Result<T, SimError>;

/// Failures raised by a single robot while loading or delivering.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RobotError {
    /// The load did not happen; the slot is still empty.
    #[error("mail item {item} weighs {weight}, above the ceiling of {ceiling}")]
    ItemTooHeavy {
        item: MailId,
        weight: Weight,
        ceiling: Weight,
    },

    #[error("robot {robot} already holds an item in its {slot}")]
    SlotOccupied { robot: RobotId, slot: Slot },

    #[error("robot {robot} cannot fill its tube while its hand is empty")]
    TubeWithoutHand { robot: RobotId },

    /// More legs in one run than the two slots could ever supply.
    #[error("robot {robot} attempted delivery leg {legs} in a single run")]
    ExcessiveDelivery { robot: RobotId, legs: u32 },
}

impl RobotError {
    /// True for errors that indicate a bug elsewhere rather than a rejected load.
    pub fn is_fault(&self) -> bool {
        matches!(self, RobotError::ExcessiveDelivery { .. })
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Top-level error for a simulation run.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("robot error: {0}")]
    Robot(#[from] RobotError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("mail item {0} was delivered more than once")]
    DuplicateDelivery(MailId),

    #[error("simulation stalled at tick {tick} with {undelivered} item(s) undelivered")]
    Stalled { tick: Tick, undelivered: usize },

    #[error("failed to initialize logging: {0}")]
    Logging(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_excessive_delivery_is_a_fault() {
        let heavy = RobotError::ItemTooHeavy {
            item: 1,
            weight: 2500,
            ceiling: 2000,
        };
        assert!(!heavy.is_fault());
        let excessive = RobotError::ExcessiveDelivery {
            robot: RobotId::new("R0"),
            legs: 3,
        };
        assert!(excessive.is_fault());
        assert_eq!(
            excessive.to_string(),
            "robot R0 attempted delivery leg 3 in a single run"
        );
    }

    #[test]
    fn robot_errors_convert_into_sim_errors() {
        let err: SimError = RobotError::TubeWithoutHand {
            robot: RobotId::new("R4"),
        }
        .into();
        assert!(matches!(err, SimError::Robot(RobotError::TubeWithoutHand { .. })));
    }
}
