//! Logging initialization
//!
//! The library only emits `tracing` events; binaries and embedders decide
//! where they go. `init_logging`:
//! - Respects the `RUST_LOG` environment variable
//! - Otherwise defaults to `warn`, or `debug` when verbose
//! - Writes to stderr, without colors when `NO_COLOR` is set

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Install the global subscriber. Later calls are no-ops.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(verbose)
                .with_ansi(std::env::var_os("NO_COLOR").is_none()),
        )
        .with(env_filter)
        .try_init();
}
