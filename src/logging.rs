//! Diagnostic logging.
//!
//! Library code logs through `tracing`. The binary installs a stderr
//! subscriber so diagnostics never interleave with the status lines and the
//! progress bar on stdout.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "spotlet=info,warn";

/// Initializes the global subscriber.
///
/// The level is controlled by `RUST_LOG`; `verbose` raises spotlet's own
/// modules to `debug` when no filter is given.
pub fn init_logging(verbose: bool) -> Result<(), String> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(if verbose {
            "spotlet=debug,warn"
        } else {
            DEFAULT_FILTER
        })
    });

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .compact();

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| e.to_string())
}
