//! Building layout and the simulation clock.

use crate::types::{Floor, Tick};

/// Floor number of the ground floor.
pub const LOWEST_FLOOR: Floor = 1;

/// A single-shaft building with one mailroom.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Building {
    /// Number of floors; the top floor is `floors` since numbering starts at 1.
    pub floors: Floor,
    pub mailroom: Floor,
}

impl Building {
    pub fn new(floors: Floor, mailroom: Floor) -> Self {
        debug_assert!(floors >= LOWEST_FLOOR, "building needs at least one floor");
        debug_assert!(
            (LOWEST_FLOOR..=floors).contains(&mailroom),
            "mailroom must be inside the building"
        );
        Self { floors, mailroom }
    }

    pub fn contains(&self, floor: Floor) -> bool {
        (LOWEST_FLOOR..=self.floors).contains(&floor)
    }
}

impl Default for Building {
    fn default() -> Self {
        Self::new(10, LOWEST_FLOOR)
    }
}

/// Explicit tick counter; time only moves when the driver advances it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Clock {
    now: Tick,
}

impl Clock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock positioned at an arbitrary tick, mainly for tests.
    pub fn at(tick: Tick) -> Self {
        Self { now: tick }
    }

    pub fn now(&self) -> Tick {
        self.now
    }

    /// Advance one tick and return the new time.
    pub fn advance(&mut self) -> Tick {
        self.now += 1;
        self.now
    }
}
