//! Structured logging for robot events and run summaries.
//!
//! Events go to stderr so stdout stays reserved for summaries and CSV output.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::error::{Result, SimError};

/// Filter used when RUST_LOG is unset: `-v` shows state changes, `-vv` pool detail.
fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        _ => "debug",
    }
}

/// Install the global subscriber. RUST_LOG takes precedence over `verbosity`.
pub fn init(verbosity: u8) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .compact(),
        )
        .try_init()
        .map_err(|e| SimError::Logging(e.to_string()))
}

/// Initialize logging for tests (no-op if already initialized).
#[cfg(test)]
pub fn init_test() {
    let _ = init(2);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_levels() {
        assert_eq!(default_filter(0), "warn");
        assert_eq!(default_filter(1), "info");
        assert_eq!(default_filter(5), "debug");
    }

    #[test]
    fn init_test_can_be_called_repeatedly() {
        init_test();
        init_test();
        tracing::info!(robot = "R0", tick = 1u64, "logging ready");
    }
}
