//! Logging initialization for the replay tool
//!
//! Installs a `tracing-subscriber` formatter filtered by `RUST_LOG`. With the
//! `profiling` feature, `profiling::scope!` markers in the component are emitted
//! as tracing spans and show up in the same output.

use tracing_subscriber::prelude::*;

/// Initialize logging with sensible defaults.
///
/// If `RUST_LOG` is not set, debug builds log at `debug` and release builds at `info`.
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::fmt;

    if std::env::var("RUST_LOG").is_err() {
        // Safety: single-threaded at startup
        unsafe {
            if cfg!(debug_assertions) {
                std::env::set_var("RUST_LOG", "debug");
            } else {
                std::env::set_var("RUST_LOG", "info");
            }
        }
    }

    let fmt_layer = fmt::layer().with_filter(EnvFilter::from_default_env());
    let registry = tracing_subscriber::registry().with(fmt_layer);
    registry.init();

    #[cfg(feature = "profiling")]
    tracing::info!("Logging initialized (profiling scopes enabled)");
    #[cfg(not(feature = "profiling"))]
    tracing::info!("Logging initialized");
}
