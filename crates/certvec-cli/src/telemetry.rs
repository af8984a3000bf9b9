//! Logging setup

use tracing::debug;
use tracing_subscriber::{EnvFilter, prelude::*};

/// Initialize tracing on stderr so stdout stays free for answers and
/// pipeline output.
///
/// `RUST_LOG` overrides the default level, which is `info` or `debug` when
/// `verbose` is set. Safe to call more than once.
pub fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }));

    let result = tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .with(filter)
        .try_init();

    if result.is_err() {
        debug!("tracing already initialized");
    }
}
