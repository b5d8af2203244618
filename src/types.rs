//! Shared identifiers, mail items, and capacity tiers used across the simulation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Simulated time, counted in whole ticks.
pub type Tick = u64;
/// Floor number inside the building shaft.
pub type Floor = i32;
/// Unique identifier for a mail item.
pub type MailId = u64;
/// Item weight in grams.
pub type Weight = u32;

/// Heaviest item a single robot may carry, and the hard ceiling for the tube.
pub const INDIVIDUAL_MAX_WEIGHT: Weight = 2000;
/// Heaviest item a pair of robots may carry together.
pub const PAIR_MAX_WEIGHT: Weight = 2600;
/// Heaviest item a team of three robots may carry together.
pub const TRIPLE_MAX_WEIGHT: Weight = 3000;

/// Stable robot identifier, supplied by whoever builds the fleet.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RobotId(String);

impl RobotId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RobotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A piece of mail waiting for, or out on, delivery.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct MailItem {
    /// Stable identifier for logging and duplicate detection.
    pub id: MailId,
    /// Tick at which the item reached the mailroom.
    pub arrival_tick: Tick,
    pub destination_floor: Floor,
    pub weight: Weight,
}

impl MailItem {
    pub fn new(id: MailId, arrival_tick: Tick, destination_floor: Floor, weight: Weight) -> Self {
        debug_assert!(weight > 0, "mail weight must be positive");
        Self {
            id,
            arrival_tick,
            destination_floor,
            weight,
        }
    }
}

impl fmt::Display for MailItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Mail Item:: ID: {:6} | Arrival: {:4} | Destination: {:2} | Weight: {:4}",
            self.id, self.arrival_tick, self.destination_floor, self.weight
        )
    }
}

/// How many robots may team up on one item, which bounds the hand ceiling.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapacityTier {
    #[default]
    One,
    Two,
    Three,
}

impl CapacityTier {
    pub const ALL: [CapacityTier; 3] = [CapacityTier::One, CapacityTier::Two, CapacityTier::Three];

    pub fn team_size(self) -> usize {
        match self {
            CapacityTier::One => 1,
            CapacityTier::Two => 2,
            CapacityTier::Three => 3,
        }
    }

    pub fn max_weight(self) -> Weight {
        match self {
            CapacityTier::One => INDIVIDUAL_MAX_WEIGHT,
            CapacityTier::Two => PAIR_MAX_WEIGHT,
            CapacityTier::Three => TRIPLE_MAX_WEIGHT,
        }
    }

    /// Tier for a team of `robots`, saturating at three.
    pub fn for_team_size(robots: usize) -> Self {
        match robots {
            0 | 1 => CapacityTier::One,
            2 => CapacityTier::Two,
            _ => CapacityTier::Three,
        }
    }

    /// Smallest tier able to lift `weight`, or `None` if no team can.
    pub fn required_for(weight: Weight) -> Option<Self> {
        Self::ALL.into_iter().find(|tier| weight <= tier.max_weight())
    }
}

impl fmt::Display for CapacityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CapacityTier::One => "one",
            CapacityTier::Two => "two",
            CapacityTier::Three => "three",
        };
        f.write_str(name)
    }
}

impl FromStr for CapacityTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "one" | "1" => Ok(CapacityTier::One),
            "two" | "2" => Ok(CapacityTier::Two),
            "three" | "3" => Ok(CapacityTier::Three),
            other => Err(format!("unknown capacity tier: {other}")),
        }
    }
}
