//! Mailroom pool: pending mail, waiting robots, and team delivery counts.

use std::collections::{HashMap, VecDeque};

use crate::error::RobotError;
use crate::robot::Robot;
use crate::types::{CapacityTier, MailId, MailItem, RobotId, Weight};

/// What a robot needs from the mailroom while loading and delivering.
pub trait MailSource {
    /// Take back an item a robot could not deliver.
    fn add_to_pool(&mut self, item: MailItem);

    /// Mark a robot as idle at the mailroom and ready for loading.
    fn register_waiting(&mut self, robot: &RobotId);

    /// Robots still carrying `item`; 1 means the caller is the last one.
    fn robots_remaining(&self, item: &MailItem) -> usize;

    /// Called by a team member that finished its leg but is not the last.
    fn decrement_robots_remaining(&mut self, item: &MailItem);

    /// Heaviest item a robot's hand may take right now.
    fn hand_weight_ceiling(&self) -> Weight;
}

/// FIFO mail pool. Items are kept in arrival order and handed out to waiting
/// robots in the order they registered.
#[derive(Debug)]
pub struct MailPool {
    tier: CapacityTier,
    robot_count: usize,
    pending: VecDeque<MailItem>,
    waiting: VecDeque<RobotId>,
    // Only team deliveries are tracked; absent means a single robot.
    remaining: HashMap<MailId, usize>,
    rejected: Vec<MailItem>,
}

impl MailPool {
    /// Create an empty pool for a fleet of `robot_count` robots.
    pub fn new(tier: CapacityTier, robot_count: usize) -> Self {
        debug_assert!(robot_count > 0, "robot_count must be > 0");
        Self {
            tier,
            robot_count,
            pending: VecDeque::new(),
            waiting: VecDeque::new(),
            remaining: HashMap::new(),
            rejected: Vec::new(),
        }
    }

    /// Number of items not yet handed to a robot.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Robots registered at the mailroom, in loading order.
    pub fn waiting_robots(&self) -> impl Iterator<Item = &RobotId> {
        self.waiting.iter()
    }

    /// Items no allowed team could ever lift.
    pub fn rejected(&self) -> &[MailItem] {
        &self.rejected
    }

    /// Robots needed to lift `item`.
    fn team_for(item: &MailItem) -> usize {
        CapacityTier::required_for(item.weight).map_or(usize::MAX, CapacityTier::team_size)
    }

    fn insert_sorted(&mut self, item: MailItem) {
        let key = (item.arrival_tick, item.id);
        let pos = self
            .pending
            .iter()
            .position(|queued| (queued.arrival_tick, queued.id) > key)
            .unwrap_or(self.pending.len());
        self.pending.insert(pos, item);
    }

    /// Next individually-liftable item, removed from the queue.
    fn take_tube_candidate(&mut self) -> Option<MailItem> {
        let pos = self.pending.iter().position(|item| Self::team_for(item) == 1)?;
        self.pending.remove(pos)
    }

    /// Forget registrations among the first `team` waiting ids that name no
    /// robot in `robots`.
    fn drop_unknown_waiting(&mut self, robots: &[Robot], team: usize) {
        let mut index = 0;
        let mut checked = 0;
        while checked < team && index < self.waiting.len() {
            let known = robots.iter().any(|robot| robot.id() == &self.waiting[index]);
            if known {
                index += 1;
            } else if let Some(id) = self.waiting.remove(index) {
                tracing::warn!(robot = %id, "waiting robot not in fleet; dropped");
            }
            checked += 1;
        }
    }

    /// Load and dispatch as many waiting robots as the pending mail allows.
    ///
    /// The head item is served first. An item needing a team waits at the head
    /// until enough robots are registered; the first ones in line carry it
    /// together. Returns the number of robots dispatched.
    pub fn load_waiting(&mut self, robots: &mut [Robot]) -> Result<usize, RobotError> {
        let mut dispatched = 0;
        loop {
            let team = match self.pending.front() {
                Some(head) => Self::team_for(head),
                None => break,
            };
            if self.waiting.len() < team {
                break;
            }

            // Resolve the whole team before committing the item to anyone.
            let slots: Vec<Option<usize>> = self
                .waiting
                .iter()
                .take(team)
                .map(|id| robots.iter().position(|robot| robot.id() == id))
                .collect();
            if slots.iter().any(Option::is_none) {
                self.drop_unknown_waiting(robots, team);
                continue;
            }

            let Some(item) = self.pending.pop_front() else {
                break;
            };
            self.waiting.drain(..team);
            if team > 1 {
                self.remaining.insert(item.id, team);
                tracing::debug!(item = item.id, team, "team assigned");
            }
            for index in slots.into_iter().flatten() {
                let robot = &mut robots[index];
                robot.load_hand(item.clone(), &*self)?;
                if team == 1 {
                    if let Some(tube) = self.take_tube_candidate() {
                        robot.load_tube(tube)?;
                    }
                }
                robot.dispatch();
                dispatched += 1;
            }
        }
        Ok(dispatched)
    }
}

impl MailSource for MailPool {
    /// Queue an item. Items above the hand ceiling are set aside, since no team
    /// this fleet can form would ever lift them.
    fn add_to_pool(&mut self, item: MailItem) {
        let ceiling = self.hand_weight_ceiling();
        if item.weight > ceiling {
            tracing::warn!(item = %item, ceiling, "mail too heavy for this fleet; rejected");
            self.rejected.push(item);
            return;
        }
        self.insert_sorted(item);
    }

    fn register_waiting(&mut self, robot: &RobotId) {
        if !self.waiting.contains(robot) {
            self.waiting.push_back(robot.clone());
        }
    }

    fn robots_remaining(&self, item: &MailItem) -> usize {
        self.remaining.get(&item.id).copied().unwrap_or(1)
    }

    fn decrement_robots_remaining(&mut self, item: &MailItem) {
        if let Some(count) = self.remaining.get_mut(&item.id) {
            *count -= 1;
            // The last robot reads the default of 1.
            if *count <= 1 {
                self.remaining.remove(&item.id);
            }
        }
    }

    fn hand_weight_ceiling(&self) -> Weight {
        let team = self.tier.team_size().min(self.robot_count);
        CapacityTier::for_team_size(team).max_weight()
    }
}
