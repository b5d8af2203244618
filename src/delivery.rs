//! Final delivery recording and run scoring.

use std::collections::HashSet;

use crate::types::{MailId, MailItem, Tick};

/// Exponent applied to each item's delay when scoring a run.
pub const DELAY_PENALTY: f64 = 1.2;

/// Receives items once the last robot carrying them has dropped them off.
pub trait DeliverySink {
    fn record_delivered(&mut self, item: MailItem, tick: Tick);
}

/// In-memory delivery record with delay statistics.
#[derive(Debug, Default)]
pub struct DeliveryLog {
    delivered: HashSet<MailId>,
    duplicates: Vec<MailId>,
    total_delay: Tick,
    score: f64,
}

impl DeliveryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Distinct items delivered so far.
    pub fn delivered(&self) -> usize {
        self.delivered.len()
    }

    pub fn contains(&self, id: MailId) -> bool {
        self.delivered.contains(&id)
    }

    /// Sum of `delivery tick - arrival tick` over distinct deliveries.
    pub fn total_delay(&self) -> Tick {
        self.total_delay
    }

    pub fn average_delay(&self) -> f64 {
        if self.delivered.is_empty() {
            0.0
        } else {
            self.total_delay as f64 / self.delivered.len() as f64
        }
    }

    /// Penalised delay; lower is better.
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Drain ids that were recorded more than once since the last call.
    pub fn take_duplicates(&mut self) -> Vec<MailId> {
        std::mem::take(&mut self.duplicates)
    }
}

impl DeliverySink for DeliveryLog {
    fn record_delivered(&mut self, item: MailItem, tick: Tick) {
        if !self.delivered.insert(item.id) {
            tracing::error!(tick, item = item.id, "mail item delivered twice");
            self.duplicates.push(item.id);
            return;
        }
        let delay = tick.saturating_sub(item.arrival_tick);
        self.total_delay += delay;
        self.score += (delay as f64).powf(DELAY_PENALTY);
        tracing::info!(tick, item = %item, delay, "delivered");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tracks_delay_and_score() {
        let mut log = DeliveryLog::new();
        log.record_delivered(MailItem::new(1, 10, 3, 100), 20);
        log.record_delivered(MailItem::new(2, 10, 3, 100), 11);
        assert_eq!(log.delivered(), 2);
        assert_eq!(log.total_delay(), 11);
        assert!((log.average_delay() - 5.5).abs() < f64::EPSILON);
        let expected = 10f64.powf(1.2) + 1.0;
        assert!((log.score() - expected).abs() < 1e-9);
    }

    #[test]
    fn duplicate_delivery_is_flagged_once() {
        let mut log = DeliveryLog::new();
        let item = MailItem::new(5, 1, 2, 100);
        log.record_delivered(item.clone(), 4);
        log.record_delivered(item, 6);
        assert_eq!(log.delivered(), 1);
        assert_eq!(log.total_delay(), 3);
        assert_eq!(log.take_duplicates(), vec![5]);
        assert!(log.take_duplicates().is_empty());
    }

    #[test]
    fn empty_log_has_zero_average() {
        let log = DeliveryLog::new();
        assert_eq!(log.average_delay(), 0.0);
        assert!(!log.contains(1));
    }
}
