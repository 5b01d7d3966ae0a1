//! Structured logging initialization via `tracing`.

use tracing_subscriber::EnvFilter;

/// Filter directive for a `-v` count: 0 warn, 1 info, 2 debug, 3+ trace.
#[must_use]
pub fn level_for_verbosity(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber, writing to stderr so stdout carries only emissions.
///
/// `RUST_LOG` takes precedence over `verbosity`. Does nothing if a subscriber
/// is already installed.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level_for_verbosity(verbosity)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init();
}
