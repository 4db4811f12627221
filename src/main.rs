//! fieldcrypt CLI entry point
//!
//! Sets up logging on stderr (filtered by `RUST_LOG`, default `warn`),
//! dispatches to the CLI module, prints errors to stderr, and exits
//! non-zero on failure. Stdout carries only JSON response lines.

use fieldcrypt::cli;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

fn main() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .try_init();

    if let Err(e) = cli::run() {
        eprintln!("{}: {}", e.code(), e);
        std::process::exit(1);
    }
}
