//! Logging setup.

use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Install the fmt subscriber. RUST_LOG wins over the -v count.
pub fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(verbose >= 2)
        .with_line_number(verbose >= 3)
        .init();

    debug!("pomowork started with verbosity level: {verbose}");
}
