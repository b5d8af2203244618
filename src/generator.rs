//! Seeded mail arrival schedule.
//!
//! The whole schedule is drawn up front from a ChaCha20 stream so a run is
//! fully reproducible from its seed.

use std::collections::BTreeMap;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha20Rng;

use crate::building::{Building, LOWEST_FLOOR};
use crate::types::{MailId, MailItem, Tick, Weight};

/// Lightest item the generator produces.
pub const MIN_MAIL_WEIGHT: Weight = 200;

#[derive(Debug)]
pub struct MailGenerator {
    seed: u64,
    total: usize,
    schedule: BTreeMap<Tick, Vec<MailItem>>,
}

impl MailGenerator {
    /// Draw `count` items arriving in `[1, last_arrival]`, addressed anywhere
    /// in `building`, weighing between [`MIN_MAIL_WEIGHT`] and `max_weight`.
    pub fn new(
        seed: u64,
        building: &Building,
        count: usize,
        last_arrival: Tick,
        max_weight: Weight,
    ) -> Self {
        debug_assert!(last_arrival >= 1, "last_arrival must be >= 1");
        debug_assert!(max_weight >= MIN_MAIL_WEIGHT, "max_weight below minimum");
        let mut rng = ChaCha20Rng::seed_from_u64(seed);
        let mut schedule: BTreeMap<Tick, Vec<MailItem>> = BTreeMap::new();
        for id in 0..count as MailId {
            let arrival = rng.gen_range(1..=last_arrival);
            let floor = rng.gen_range(LOWEST_FLOOR..=building.floors);
            let weight = rng.gen_range(MIN_MAIL_WEIGHT..=max_weight);
            schedule
                .entry(arrival)
                .or_default()
                .push(MailItem::new(id, arrival, floor, weight));
        }
        tracing::info!(seed, count, last_arrival, "mail schedule generated");
        Self {
            seed,
            total: count,
            schedule,
        }
    }

    /// Seed the schedule was drawn from.
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Items generated over the whole run.
    pub fn total(&self) -> usize {
        self.total
    }

    /// Items that have not arrived yet.
    pub fn remaining(&self) -> usize {
        self.schedule.values().map(Vec::len).sum()
    }

    /// Remove and return everything arriving at `tick`.
    pub fn arrivals_at(&mut self, tick: Tick) -> Vec<MailItem> {
        self.schedule.remove(&tick).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_seed_same_schedule() {
        let building = Building::default();
        let mut a = MailGenerator::new(7, &building, 30, 50, 2000);
        let mut b = MailGenerator::new(7, &building, 30, 50, 2000);
        for tick in 0..=50 {
            assert_eq!(a.arrivals_at(tick), b.arrivals_at(tick));
        }
    }

    #[test]
    fn items_respect_bounds() {
        let building = Building::new(6, 1);
        let mut generator = MailGenerator::new(99, &building, 200, 20, 2600);
        assert_eq!(generator.total(), 200);
        assert_eq!(generator.remaining(), 200);
        assert!(generator.arrivals_at(0).is_empty());

        let mut seen = 0;
        for tick in 1..=20 {
            for item in generator.arrivals_at(tick) {
                assert_eq!(item.arrival_tick, tick);
                assert!(building.contains(item.destination_floor));
                assert!((MIN_MAIL_WEIGHT..=2600).contains(&item.weight));
                seen += 1;
            }
        }
        assert_eq!(seen, 200);
        assert_eq!(generator.remaining(), 0);
    }
}
