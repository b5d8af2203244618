//! Mailroom robot delivery simulator CLI.

use std::path::PathBuf;
use std::process;

use clap::{Args, Parser, Subcommand};

use automail::config::SimConfig;
use automail::error::Result;
use automail::types::{CapacityTier, Floor, Tick, Weight};
use automail::{logging, sim};

/// Mailroom robot delivery simulator
#[derive(Parser, Debug)]
#[command(name = "automail")]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML config file; CLI flags override its values
    #[arg(short, long, global = true, env = "AUTOMAIL_CONFIG")]
    config: Option<PathBuf>,

    /// Increase log detail (-v state changes, -vv pool activity)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the default demo and print a summary (default)
    Demo,

    /// Run one simulation with the given overrides
    Run(Overrides),

    /// Sweep fleet sizes and capacity tiers, printing CSV
    Sweep {
        /// Fleet sizes to try (comma-separated)
        #[arg(long, value_delimiter = ',', default_values_t = [1usize, 2, 4, 8])]
        robot_sets: Vec<usize>,

        /// Capacity tiers to try (comma-separated: one,two,three)
        #[arg(long, value_delimiter = ',', default_values_t = CapacityTier::ALL)]
        tiers: Vec<CapacityTier>,

        #[command(flatten)]
        overrides: Overrides,
    },
}

#[derive(Args, Debug)]
struct Overrides {
    /// Number of floors in the building
    #[arg(long)]
    floors: Option<Floor>,

    /// Floor the mailroom sits on
    #[arg(long)]
    mailroom: Option<Floor>,

    /// Fleet size
    #[arg(long)]
    robots: Option<usize>,

    /// Largest team allowed on one item (one, two, three)
    #[arg(long)]
    capacity: Option<CapacityTier>,

    /// Number of mail items to generate
    #[arg(long)]
    mail_count: Option<usize>,

    /// Last tick on which mail may arrive
    #[arg(long)]
    last_arrival: Option<Tick>,

    /// Heaviest generated item
    #[arg(long)]
    max_weight: Option<Weight>,

    /// Seed for the mail schedule
    #[arg(long)]
    seed: Option<u64>,

    /// Abort if the run is not finished by this tick
    #[arg(long)]
    max_ticks: Option<Tick>,
}

impl Overrides {
    fn apply(self, mut config: SimConfig) -> SimConfig {
        if let Some(floors) = self.floors {
            config.floors = floors;
        }
        if let Some(mailroom) = self.mailroom {
            config.mailroom = mailroom;
        }
        if let Some(robots) = self.robots {
            config.robots = robots;
        }
        if let Some(capacity) = self.capacity {
            config.capacity = capacity;
        }
        if let Some(mail_count) = self.mail_count {
            config.mail_count = mail_count;
        }
        if let Some(last_arrival) = self.last_arrival {
            config.last_arrival_tick = last_arrival;
        }
        if let Some(max_weight) = self.max_weight {
            config.max_weight = max_weight;
        }
        if let Some(seed) = self.seed {
            config.seed = seed;
        }
        if let Some(max_ticks) = self.max_ticks {
            config.max_ticks = max_ticks;
        }
        config
    }
}

fn run(cli: Cli) -> Result<()> {
    let base = match &cli.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };

    match cli.command.unwrap_or(Commands::Demo) {
        Commands::Demo => {
            sim::run_demo(base)?;
        }
        Commands::Run(overrides) => {
            sim::run_once(overrides.apply(base))?;
        }
        Commands::Sweep {
            robot_sets,
            tiers,
            overrides,
        } => {
            let base = overrides.apply(base);
            sim::run_sweep(&base, &robot_sets, &tiers)?;
        }
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = logging::init(cli.verbose) {
        eprintln!("warning: {e}");
    }

    if let Err(e) = run(cli) {
        eprintln!("Error: {e}");
        process::exit(1);
    }
}
