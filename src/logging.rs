//! Logging setup for `yabt`.
//!
//! Verbosity flags map onto a default `EnvFilter`; `RUST_LOG` always wins.
//! Logs go to stderr so stdout stays clean for `--json` output.

use std::io;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Default filter directive for the given flags.
#[must_use]
pub fn default_directive(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        return "error";
    }
    match verbose {
        0 => "warn",
        1 => "yabt=info,tower_http=info,warn",
        2 => "yabt=debug,tower_http=debug,info",
        _ => "trace",
    }
}

/// Initialize the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a global subscriber is already installed.
pub fn init_logging(
    verbose: u8,
    quiet: bool,
    format: Option<LogFormat>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbose, quiet)));

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(verbose > 1);

    match format.unwrap_or_default() {
        LogFormat::Text => builder.try_init(),
        LogFormat::Json => builder.json().try_init(),
    }
}

/// Initialize logging for tests (captured by the test harness).
///
/// Safe to call repeatedly; only the first call installs a subscriber.
pub fn init_test_logging() {
    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("yabt=debug")),
        )
        .with_test_writer()
        .try_init();
}
