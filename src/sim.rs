//! Simulation driver plus the demo and sweep runners.

use std::time::Instant;

use crate::building::{Building, Clock};
use crate::config::SimConfig;
use crate::delivery::DeliveryLog;
use crate::error::{Result, SimError};
use crate::generator::MailGenerator;
use crate::mail_pool::{MailPool, MailSource};
use crate::robot::{Robot, RobotState};
use crate::types::{CapacityTier, RobotId, Tick};

/// Best-effort CPU user/system time snapshot (seconds) on Unix platforms.
#[cfg(unix)]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    // SAFETY: rusage is plain old data; getrusage only writes into it.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }
    let user = usage.ru_utime.tv_sec as f64 + (usage.ru_utime.tv_usec as f64 / 1_000_000.0);
    let sys = usage.ru_stime.tv_sec as f64 + (usage.ru_stime.tv_usec as f64 / 1_000_000.0);
    Some((user, sys))
}

/// Stub on non-Unix platforms.
#[cfg(not(unix))]
fn cpu_times_seconds() -> Option<(f64, f64)> {
    None
}

/// Outcome of a completed run.
#[derive(Debug, Clone, PartialEq)]
pub struct SimReport {
    pub robots: usize,
    pub capacity: CapacityTier,
    /// Seed the mail schedule was generated from; rerun with it to replay.
    pub seed: u64,
    pub ticks: Tick,
    pub generated: usize,
    pub delivered: usize,
    /// Items no team of this fleet could lift.
    pub undeliverable: usize,
    /// Robot runs abandoned after an excessive-delivery fault.
    pub anomalies: usize,
    pub total_delay: Tick,
    pub average_delay: f64,
    pub score: f64,
}

/// One building, one mailroom, one fleet, stepped tick by tick.
pub struct Simulation {
    config: SimConfig,
    clock: Clock,
    pool: MailPool,
    log: DeliveryLog,
    generator: MailGenerator,
    robots: Vec<Robot>,
    anomalies: usize,
}

impl Simulation {
    /// Build the fleet at the mailroom; every robot starts RETURNING.
    pub fn new(config: SimConfig) -> Result<Self> {
        config.validate()?;
        let building: Building = config.building();
        let robots = (0..config.robots)
            .map(|i| Robot::new(RobotId::new(format!("R{i}")), building))
            .collect();
        let generator = MailGenerator::new(
            config.seed,
            &building,
            config.mail_count,
            config.last_arrival_tick,
            config.max_weight,
        );
        Ok(Self {
            pool: MailPool::new(config.capacity, config.robots),
            clock: Clock::new(),
            log: DeliveryLog::new(),
            generator,
            robots,
            anomalies: 0,
            config,
        })
    }

    /// Last tick that has been stepped; 0 before the first.
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// The fleet, in id order.
    pub fn robots(&self) -> &[Robot] {
        &self.robots
    }

    pub fn log(&self) -> &DeliveryLog {
        &self.log
    }

    /// Items that arrived or will arrive and can still be delivered.
    pub fn undelivered(&self) -> usize {
        self.generator
            .total()
            .saturating_sub(self.pool.rejected().len())
            .saturating_sub(self.log.delivered())
    }

    /// Advance one tick: accept arrivals, load waiting robots, step the fleet.
    pub fn tick(&mut self) -> Result<()> {
        let now = self.clock.advance();
        for item in self.generator.arrivals_at(now) {
            self.pool.add_to_pool(item);
        }
        self.pool.load_waiting(&mut self.robots)?;

        for robot in &mut self.robots {
            match robot.step(&self.clock, &mut self.pool, &mut self.log) {
                Ok(()) => {}
                Err(err) if err.is_fault() => {
                    tracing::error!(tick = now, error = %err, "robot run abandoned");
                    self.anomalies += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }

        if let Some(id) = self.log.take_duplicates().into_iter().next() {
            return Err(SimError::DuplicateDelivery(id));
        }
        Ok(())
    }

    /// All mail has arrived and been delivered, and the fleet is idle.
    pub fn is_finished(&self) -> bool {
        self.generator.remaining() == 0
            && self.pool.pending() == 0
            && self
                .robots
                .iter()
                .all(|robot| robot.state() == RobotState::Waiting && robot.is_empty())
    }

    /// Tick until finished or until `max_ticks` is exceeded.
    pub fn run(&mut self) -> Result<SimReport> {
        while !self.is_finished() {
            if self.clock.now() >= self.config.max_ticks {
                return Err(SimError::Stalled {
                    tick: self.clock.now(),
                    undelivered: self.undelivered(),
                });
            }
            self.tick()?;
        }
        let report = self.report();
        tracing::info!(
            ticks = report.ticks,
            delivered = report.delivered,
            score = report.score,
            "simulation finished"
        );
        Ok(report)
    }

    /// Snapshot of the run so far.
    pub fn report(&self) -> SimReport {
        SimReport {
            robots: self.robots.len(),
            capacity: self.config.capacity,
            seed: self.generator.seed(),
            ticks: self.clock.now(),
            generated: self.generator.total(),
            delivered: self.log.delivered(),
            undeliverable: self.pool.rejected().len(),
            anomalies: self.anomalies,
            total_delay: self.log.total_delay(),
            average_delay: self.log.average_delay(),
            score: self.log.score(),
        }
    }

    #[cfg(test)]
    pub(crate) fn pool(&self) -> &MailPool {
        &self.pool
    }

    #[cfg(test)]
    pub(crate) fn robots_mut(&mut self) -> &mut [Robot] {
        &mut self.robots
    }
}

/// Run a single simulation and print its summary.
pub fn run_once(config: SimConfig) -> Result<SimReport> {
    let mut sim = Simulation::new(config)?;
    let report = sim.run()?;
    print_summary("RUN SUMMARY", &report);
    Ok(report)
}

/// Run the default demo configuration.
pub fn run_demo(config: SimConfig) -> Result<SimReport> {
    let mut sim = Simulation::new(config)?;
    let start = Instant::now();
    let report = sim.run()?;
    tracing::info!(elapsed_ms = start.elapsed().as_millis() as u64, "demo finished");
    print_summary("DEMO SUMMARY", &report);
    Ok(report)
}

fn print_summary(title: &str, report: &SimReport) {
    println!("{title}");
    println!(
        "robots={} capacity={} mail_total={}",
        report.robots, report.capacity, report.generated
    );
    println!("seed={}", report.seed);
    println!("ticks={}", report.ticks);
    println!("delivered={}", report.delivered);
    println!("undeliverable={}", report.undeliverable);
    println!("anomalies={}", report.anomalies);
    println!("average_delay={:.2}", report.average_delay);
    println!("score={:.2}", report.score);
}

const SWEEP_HEADER: &str = "robots,capacity,mail,ticks,delivered,undeliverable,anomalies,avg_delay,score,elapsed_ms,cpu_user_s,cpu_sys_s";

/// Sweep fleet sizes and capacity tiers over one mail schedule; prints CSV.
pub fn run_sweep(base: &SimConfig, robot_sets: &[usize], tiers: &[CapacityTier]) -> Result<()> {
    if robot_sets.is_empty() || tiers.is_empty() {
        return Err(SimError::Config(crate::error::ConfigError::Invalid {
            field: "sweep",
            reason: "robot sets and tiers must not be empty".to_string(),
        }));
    }

    println!("{SWEEP_HEADER}");
    for &robots in robot_sets {
        for &capacity in tiers {
            let config = SimConfig {
                robots,
                capacity,
                max_weight: base.max_weight.min(capacity.max_weight()),
                ..base.clone()
            };
            let cpu_start = cpu_times_seconds();
            let start = Instant::now();
            let report = Simulation::new(config)?.run()?;
            let elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;

            let (cpu_user, cpu_sys) = match (cpu_start, cpu_times_seconds()) {
                (Some((user_start, sys_start)), Some((user_end, sys_end))) => (
                    format!("{:.4}", user_end - user_start),
                    format!("{:.4}", sys_end - sys_start),
                ),
                _ => ("NA".to_string(), "NA".to_string()),
            };
            println!(
                "{},{},{},{},{},{},{},{:.2},{:.2},{:.2},{},{}",
                report.robots,
                report.capacity,
                report.generated,
                report.ticks,
                report.delivered,
                report.undeliverable,
                report.anomalies,
                report.average_delay,
                report.score,
                elapsed_ms,
                cpu_user,
                cpu_sys
            );
            if report.anomalies > 0 {
                eprintln!("# violation,excessive_delivery,{}", report.anomalies);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MailItem;

    fn small_config() -> SimConfig {
        SimConfig {
            floors: 6,
            robots: 2,
            mail_count: 15,
            last_arrival_tick: 20,
            seed: 11,
            ..SimConfig::default()
        }
    }

    #[test]
    fn run_delivers_every_item() {
        let mut sim = Simulation::new(small_config()).expect("build");
        let report = sim.run().expect("run");
        assert_eq!(report.delivered, 15);
        assert_eq!(report.undeliverable, 0);
        assert_eq!(report.anomalies, 0);
        assert_eq!(sim.undelivered(), 0);
        assert!(report.ticks > 1);
        for robot in sim.robots() {
            assert_eq!(robot.state(), RobotState::Waiting);
            assert_eq!(robot.current_floor(), 1);
        }
    }

    #[test]
    fn same_seed_same_report() {
        let a = Simulation::new(small_config()).expect("build").run().expect("run");
        let b = Simulation::new(small_config()).expect("build").run().expect("run");
        assert_eq!(a, b);
        assert_eq!(a.seed, 11);
    }

    #[test]
    fn slot_invariant_holds_every_tick() {
        let mut sim = Simulation::new(SimConfig {
            robots: 3,
            capacity: CapacityTier::Three,
            max_weight: 3000,
            mail_count: 30,
            ..small_config()
        })
        .expect("build");
        let mut last_floors: Vec<i32> = sim.robots().iter().map(Robot::current_floor).collect();
        while !sim.is_finished() {
            sim.tick().expect("tick");
            for (robot, last) in sim.robots().iter().zip(last_floors.iter_mut()) {
                assert!(!(robot.hand_item().is_none() && robot.tube_item().is_some()));
                if let Some(tube) = robot.tube_item() {
                    assert!(tube.weight <= crate::types::INDIVIDUAL_MAX_WEIGHT);
                }
                assert!((robot.current_floor() - *last).abs() <= 1);
                *last = robot.current_floor();
            }
            assert!(sim.now() < 5000, "simulation did not settle");
        }
        assert_eq!(sim.log().delivered(), 30);
    }

    #[test]
    fn team_items_are_delivered_once() {
        let mut sim = Simulation::new(SimConfig {
            robots: 2,
            capacity: CapacityTier::Two,
            max_weight: 2600,
            mail_count: 25,
            ..small_config()
        })
        .expect("build");
        let report = sim.run().expect("run");
        assert_eq!(report.delivered + report.undeliverable, 25);
        assert_eq!(report.undeliverable, 0);
    }

    #[test]
    fn heavy_mail_for_a_lone_robot_is_undeliverable() {
        let mut sim = Simulation::new(SimConfig {
            robots: 1,
            capacity: CapacityTier::Three,
            max_weight: 3000,
            mail_count: 40,
            ..small_config()
        })
        .expect("build");
        let report = sim.run().expect("run");
        assert!(report.undeliverable > 0);
        assert_eq!(report.delivered + report.undeliverable, 40);
        assert!(sim.pool().rejected().iter().all(|item| item.weight > 2000));
    }

    #[test]
    fn stalls_past_max_ticks() {
        let mut sim = Simulation::new(SimConfig {
            max_ticks: 3,
            ..small_config()
        })
        .expect("build");
        match sim.run() {
            Err(SimError::Stalled { tick, undelivered }) => {
                assert_eq!(tick, 3);
                assert!(undelivered > 0);
            }
            other => panic!("expected stall, got {other:?}"),
        }
    }

    #[test]
    fn excessive_delivery_is_counted_not_fatal() {
        let mut sim = Simulation::new(SimConfig {
            mail_count: 0,
            ..small_config()
        })
        .expect("build");
        sim.tick().expect("register");

        let clock = Clock::at(sim.now());
        let robot = &mut sim.robots_mut()[0];
        robot
            .load_hand(MailItem::new(900, 0, 1, 100), &MailPool::new(CapacityTier::One, 1))
            .expect("hand");
        robot.dispatch();
        robot
            .step(&clock, &mut MailPool::new(CapacityTier::One, 1), &mut DeliveryLog::new())
            .expect("dispatch");
        robot.set_legs_for_test(crate::robot::MAX_LEGS_PER_RUN);

        sim.tick().expect("fault is absorbed");
        assert_eq!(sim.report().anomalies, 1);
        assert!(sim.log().contains(900));
    }

    #[test]
    fn invalid_config_is_rejected() {
        let result = Simulation::new(SimConfig {
            robots: 0,
            ..SimConfig::default()
        });
        assert!(matches!(result, Err(SimError::Config(_))));
    }

    #[test]
    fn sweep_rejects_empty_sets() {
        assert!(run_sweep(&small_config(), &[], &[CapacityTier::One]).is_err());
    }
}
