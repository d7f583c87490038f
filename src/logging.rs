//! Diagnostic logging.
//!
//! Log lines go to stderr so `--json` output on stdout stays parseable. The
//! level comes from `BACKOFFICE_LOG` (an `EnvFilter` directive such as
//! `debug` or `backoffice=trace`) and defaults to warnings only.

use tracing_subscriber::{EnvFilter, fmt, prelude::*};

pub const LOG_ENV: &str = "BACKOFFICE_LOG";
const DEFAULT_DIRECTIVE: &str = "warn";

/// Parse the filter from `BACKOFFICE_LOG`, falling back to `warn` when it is
/// unset or invalid.
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE))
}

/// Install the global subscriber. Later calls are no-ops.
pub fn init() {
    let layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time();
    let _ = tracing_subscriber::registry()
        .with(env_filter())
        .with(layer)
        .try_init();
}
