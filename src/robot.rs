//! Per-tick delivery state machine for a single mail robot.
//!
//! A robot carries at most two items: one in hand for the current leg and one
//! in its tube for the next leg. Each call to [`Robot::step`] performs one unit
//! of work: a single floor of movement, a handoff at the mailroom, or a drop-off.

use std::fmt;

use crate::building::{Building, Clock};
use crate::delivery::DeliverySink;
use crate::error::RobotError;
use crate::mail_pool::MailSource;
use crate::types::{Floor, INDIVIDUAL_MAX_WEIGHT, MailItem, RobotId, Tick};

/// Most legs a single run can have: the hand item plus one tube refill.
pub const MAX_LEGS_PER_RUN: u32 = 2;

/// Lifecycle of a robot; it cycles for the whole simulation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RobotState {
    Returning,
    Waiting,
    Delivering,
}

impl fmt::Display for RobotState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RobotState::Returning => "RETURNING",
            RobotState::Waiting => "WAITING",
            RobotState::Delivering => "DELIVERING",
        };
        f.write_str(name)
    }
}

/// Carrying slot, used for error reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Hand,
    Tube,
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Slot::Hand => f.write_str("hand"),
            Slot::Tube => f.write_str("tube"),
        }
    }
}

/// What the robot is carrying. A tube item cannot exist without a hand item.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Load {
    #[default]
    Empty,
    Hand(MailItem),
    HandAndTube { hand: MailItem, tube: MailItem },
}

impl Load {
    pub fn hand(&self) -> Option<&MailItem> {
        match self {
            Load::Empty => None,
            Load::Hand(hand) | Load::HandAndTube { hand, .. } => Some(hand),
        }
    }

    pub fn tube(&self) -> Option<&MailItem> {
        match self {
            Load::HandAndTube { tube, .. } => Some(tube),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Load::Empty)
    }

    /// Split into the hand item and the tube item waiting behind it.
    fn into_parts(self) -> (Option<MailItem>, Option<MailItem>) {
        match self {
            Load::Empty => (None, None),
            Load::Hand(hand) => (Some(hand), None),
            Load::HandAndTube { hand, tube } => (Some(hand), Some(tube)),
        }
    }
}

/// A mail robot riding the building's single shaft.
#[derive(Debug)]
pub struct Robot {
    id: RobotId,
    building: Building,
    state: RobotState,
    current_floor: Floor,
    destination_floor: Floor,
    load: Load,
    dispatch_requested: bool,
    legs_this_run: u32,
    // Set when a faulted run is given up; everything on board goes back at the mailroom.
    abandoned: bool,
}

impl Robot {
    /// Place a new robot at the mailroom. It starts RETURNING so its first
    /// step registers it as waiting.
    pub fn new(id: RobotId, building: Building) -> Self {
        Self {
            id,
            building,
            state: RobotState::Returning,
            current_floor: building.mailroom,
            destination_floor: building.mailroom,
            load: Load::Empty,
            dispatch_requested: false,
            legs_this_run: 0,
            abandoned: false,
        }
    }

    /// Identifier supplied at construction.
    pub fn id(&self) -> &RobotId {
        &self.id
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RobotState {
        self.state
    }

    /// Floor the robot is on; changes by at most one per step.
    pub fn current_floor(&self) -> Floor {
        self.current_floor
    }

    /// Only meaningful while delivering.
    pub fn destination_floor(&self) -> Floor {
        self.destination_floor
    }

    /// Item being carried on the current leg, if any.
    pub fn hand_item(&self) -> Option<&MailItem> {
        self.load.hand()
    }

    /// Item reserved for the next leg, if any.
    pub fn tube_item(&self) -> Option<&MailItem> {
        self.load.tube()
    }

    /// True when both hand and tube are empty.
    pub fn is_empty(&self) -> bool {
        self.load.is_empty()
    }

    /// Legs completed since the last dispatch.
    pub fn legs_this_run(&self) -> u32 {
        self.legs_this_run
    }

    /// Arm the robot; consumed by the next WAITING step that has mail on board.
    pub fn dispatch(&mut self) {
        self.dispatch_requested = true;
    }

    /// Put `item` in the hand. Fails without side effects if the hand is taken
    /// or the item is above the source's current hand ceiling.
    pub fn load_hand<S: MailSource + ?Sized>(
        &mut self,
        item: MailItem,
        source: &S,
    ) -> Result<(), RobotError> {
        if !self.load.is_empty() {
            return Err(RobotError::SlotOccupied {
                robot: self.id.clone(),
                slot: Slot::Hand,
            });
        }
        let ceiling = source.hand_weight_ceiling();
        if item.weight > ceiling {
            return Err(RobotError::ItemTooHeavy {
                item: item.id,
                weight: item.weight,
                ceiling,
            });
        }
        self.load = Load::Hand(item);
        Ok(())
    }

    /// Put `item` in the tube behind the hand item. The tube ceiling is always
    /// the individual maximum regardless of team configuration.
    pub fn load_tube(&mut self, item: MailItem) -> Result<(), RobotError> {
        match &self.load {
            Load::Empty => {
                return Err(RobotError::TubeWithoutHand {
                    robot: self.id.clone(),
                });
            }
            Load::HandAndTube { .. } => {
                return Err(RobotError::SlotOccupied {
                    robot: self.id.clone(),
                    slot: Slot::Tube,
                });
            }
            Load::Hand(_) => {}
        }
        if item.weight > INDIVIDUAL_MAX_WEIGHT {
            return Err(RobotError::ItemTooHeavy {
                item: item.id,
                weight: item.weight,
                ceiling: INDIVIDUAL_MAX_WEIGHT,
            });
        }
        if let Load::Hand(hand) = std::mem::take(&mut self.load) {
            self.load = Load::HandAndTube { hand, tube: item };
        }
        Ok(())
    }

    /// Advance the robot by one tick.
    pub fn step<S, D>(&mut self, clock: &Clock, source: &mut S, sink: &mut D) -> Result<(), RobotError>
    where
        S: MailSource + ?Sized,
        D: DeliverySink + ?Sized,
    {
        let tick = clock.now();
        if self.state == RobotState::Returning {
            if self.current_floor != self.building.mailroom {
                self.move_towards(self.building.mailroom);
                return Ok(());
            }
            self.unload_at_mailroom(tick, source);
            source.register_waiting(&self.id);
            self.change_state(RobotState::Waiting, tick);
            // Falls through: a robot reaching WAITING is checked for dispatch in the same tick.
        }

        match self.state {
            RobotState::Waiting => {
                if !self.load.is_empty() && self.dispatch_requested {
                    self.dispatch_requested = false;
                    self.legs_this_run = 0;
                    self.set_route();
                    self.change_state(RobotState::Delivering, tick);
                }
                Ok(())
            }
            RobotState::Delivering => {
                if self.current_floor == self.destination_floor {
                    self.finish_leg(tick, source, sink)
                } else {
                    self.move_towards(self.destination_floor);
                    Ok(())
                }
            }
            RobotState::Returning => Ok(()),
        }
    }

    /// Drop off the hand item at the current floor and start the next leg, if any.
    fn finish_leg<S, D>(&mut self, tick: Tick, source: &mut S, sink: &mut D) -> Result<(), RobotError>
    where
        S: MailSource + ?Sized,
        D: DeliverySink + ?Sized,
    {
        let (hand, tube) = std::mem::take(&mut self.load).into_parts();
        let Some(hand) = hand else {
            debug_assert!(false, "robot {} delivering with an empty hand", self.id);
            self.change_state(RobotState::Returning, tick);
            return Ok(());
        };

        if source.robots_remaining(&hand) == 1 {
            sink.record_delivered(hand, tick);
        } else {
            source.decrement_robots_remaining(&hand);
        }
        self.legs_this_run += 1;

        if self.legs_this_run > MAX_LEGS_PER_RUN {
            tracing::error!(
                tick,
                robot = %self.id,
                legs = self.legs_this_run,
                "excessive deliveries in one run; abandoning run"
            );
            self.load = tube.map(Load::Hand).unwrap_or_default();
            self.abandoned = true;
            self.change_state(RobotState::Returning, tick);
            return Err(RobotError::ExcessiveDelivery {
                robot: self.id.clone(),
                legs: self.legs_this_run,
            });
        }

        match tube {
            None => self.change_state(RobotState::Returning, tick),
            Some(next) => {
                self.load = Load::Hand(next);
                self.set_route();
                self.change_state(RobotState::Delivering, tick);
            }
        }
        Ok(())
    }

    /// Return the tube item to the pool before registering as waiting. The
    /// hand item stays, so a robot loaded before its first step can still go.
    /// After an abandoned run the whole load is returned instead.
    fn unload_at_mailroom<S: MailSource + ?Sized>(&mut self, tick: Tick, source: &mut S) {
        let returned: Vec<MailItem> = if std::mem::take(&mut self.abandoned) {
            let (hand, tube) = std::mem::take(&mut self.load).into_parts();
            hand.into_iter().chain(tube).collect()
        } else {
            match std::mem::take(&mut self.load) {
                Load::HandAndTube { hand, tube } => {
                    self.load = Load::Hand(hand);
                    vec![tube]
                }
                other => {
                    self.load = other;
                    Vec::new()
                }
            }
        };
        for item in returned {
            tracing::debug!(tick, robot = %self.id, item = %item, "returned to pool");
            source.add_to_pool(item);
        }
    }

    fn set_route(&mut self) {
        if let Some(hand) = self.load.hand() {
            self.destination_floor = hand.destination_floor;
        }
    }

    fn move_towards(&mut self, target: Floor) {
        self.current_floor += (target - self.current_floor).signum();
    }

    /// `R3(1)` means robot R3 with its tube occupied.
    fn tagged_id(&self) -> String {
        format!("{}({})", self.id, u8::from(self.load.tube().is_some()))
    }

    fn change_state(&mut self, next: RobotState, tick: Tick) {
        if self.state != next {
            tracing::info!(
                tick,
                robot = %self.tagged_id(),
                tube = self.load.tube().is_some(),
                from = %self.state,
                to = %next,
                "state changed"
            );
        }
        self.state = next;
        if next == RobotState::Delivering {
            if let Some(hand) = self.load.hand() {
                tracing::info!(tick, robot = %self.tagged_id(), item = %hand, "carrying");
            }
        }
    }

    /// Test-only hook to force the per-run leg counter.
    #[cfg(test)]
    pub(crate) fn set_legs_for_test(&mut self, legs: u32) {
        self.legs_this_run = legs;
    }
}
